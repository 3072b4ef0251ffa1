//! Type-erased access to the drivers of the workspace.
//!
//! Every driver gets an adapter that implements [`Device`], so devices of different types can live
//! side by side in a [`ResourceCollection`](crate::ResourceCollection) and run the
//! [`InitCommand`]s of their initialization sequence.

use std::{any::Any, fmt, time::Duration};

use equipmentrs::{DynInterface, InstrumentError};
use measurements::{Current, Frequency, Voltage};
use thiserror::Error;

use chroma_6310::{Chroma6310, CurrentRange, Edge, LoadLevel};
use hp_34401a::{Hp34401a, MeasurementConfig, MeasurementMode, TriggerCount, TriggerSource};
use keysight_33500b::{Ks33500b, WaveFunction};
use keysight_edu36311a::Edu36311a;
use sorensen_sga::SorensenSga;
use tektronix_dpo4xxx::{Dpo4xxx, TriggerMode};

use crate::InitCommand;

/// Class of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    /// DC power supply.
    PowerSupply,
    /// Electronic load.
    ElectronicLoad,
    /// Function generator.
    FunctionGenerator,
    /// Multimeter.
    Multimeter,
    /// Oscilloscope.
    Oscilloscope,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::PowerSupply => "power supply",
            DeviceKind::ElectronicLoad => "electronic load",
            DeviceKind::FunctionGenerator => "function generator",
            DeviceKind::Multimeter => "multimeter",
            DeviceKind::Oscilloscope => "oscilloscope",
        };
        write!(f, "{name}")
    }
}

/// Error when running an [`InitCommand`] on a device.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The device has no counterpart for the command.
    #[error("Command not supported by {0}")]
    Unsupported(DeviceKind),
    /// The device rejected the command or did not answer.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}

/// A connected device of any type.
pub trait Device: Send {
    /// The identification string of the device.
    fn idn(&self) -> &str;

    /// The resource address of the device.
    fn address(&self) -> &str;

    /// The class of the device.
    fn kind(&self) -> DeviceKind;

    /// Reset the device (`*RST`).
    fn reset(&mut self) -> Result<(), InstrumentError>;

    /// Return the device to local control.
    fn set_local(&mut self) -> Result<(), InstrumentError>;

    /// Run a command from an initialization sequence.
    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError>;

    /// The driver behind the adapter, for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Access to the triggered acquisition of multimeters.
    fn as_multimeter(&mut self) -> Option<&mut dyn Multimeter> {
        None
    }
}

/// Triggered acquisition, shared by all multimeters.
pub trait Multimeter {
    /// Arm the trigger.
    fn init(&mut self) -> Result<(), InstrumentError>;

    /// Send a trigger and wait for the measurement to finish.
    fn trigger(&mut self) -> Result<(), InstrumentError>;

    /// Fetch the acquired data.
    fn fetch_data(&mut self) -> Result<Vec<f64>, InstrumentError>;
}

/// Turn a channel number counted from 1 into an index.
fn channel_index(channel: usize) -> Result<usize, InstrumentError> {
    channel.checked_sub(1).ok_or_else(|| {
        InstrumentError::InvalidArgument("Channel numbers start at 1".to_string())
    })
}

fn required_channel(channel: Option<usize>) -> Result<usize, InstrumentError> {
    match channel {
        Some(ch) => channel_index(ch),
        None => Err(InstrumentError::InvalidArgument(
            "A channel is required for this device".to_string(),
        )),
    }
}

fn no_channel(channel: Option<usize>) -> Result<(), InstrumentError> {
    match channel {
        None => Ok(()),
        Some(ch) => Err(InstrumentError::InvalidArgument(format!(
            "Device has a single output, got channel {ch}"
        ))),
    }
}

fn seconds(secs: f64) -> Result<Duration, InstrumentError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| InstrumentError::InvalidArgument(format!("Invalid duration: {secs} s")))
}

impl Device for SorensenSga<DynInterface> {
    fn idn(&self) -> &str {
        self.get_name()
    }

    fn address(&self) -> &str {
        self.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::PowerSupply
    }

    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.resource().reset()
    }

    fn set_local(&mut self) -> Result<(), InstrumentError> {
        SorensenSga::set_local(self, true)
    }

    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError> {
        match *cmd {
            InitCommand::Reset => self.resource().reset()?,
            InitCommand::ClearStatus => self.resource().clear_status()?,
            InitCommand::SetLocal => SorensenSga::set_local(self, true)?,
            InitCommand::On { channel } => {
                no_channel(channel)?;
                self.on()?
            }
            InitCommand::Off { channel } => {
                no_channel(channel)?;
                self.off()?
            }
            InitCommand::Toggle { channel } => {
                no_channel(channel)?;
                self.toggle()?
            }
            InitCommand::SetState { state, channel } => {
                no_channel(channel)?;
                self.set_state(state)?
            }
            InitCommand::SetVoltage { voltage, channel } => {
                no_channel(channel)?;
                self.set_voltage(Voltage::from_volts(voltage))?
            }
            InitCommand::SetCurrent {
                current,
                channel,
                level: None,
            } => {
                no_channel(channel)?;
                self.set_current(Current::from_amperes(current))?
            }
            InitCommand::SetOverVoltageProtection { voltage } => {
                self.set_over_voltage_protection(Voltage::from_volts(voltage))?
            }
            InitCommand::SetOverCurrentProtection { current } => {
                self.set_over_current_protection(Current::from_amperes(current))?
            }
            _ => return Err(CommandError::Unsupported(self.kind())),
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Device for Edu36311a<DynInterface> {
    fn idn(&self) -> &str {
        self.get_name()
    }

    fn address(&self) -> &str {
        self.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::PowerSupply
    }

    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.resource().reset()
    }

    fn set_local(&mut self) -> Result<(), InstrumentError> {
        self.resource().set_local()
    }

    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError> {
        match *cmd {
            InitCommand::Reset => self.resource().reset()?,
            InitCommand::ClearStatus => self.resource().clear_status()?,
            InitCommand::SetLocal => self.resource().set_local()?,
            InitCommand::On { channel } => self.get_channel(required_channel(channel)?)?.on()?,
            InitCommand::Off { channel } => self.get_channel(required_channel(channel)?)?.off()?,
            InitCommand::Toggle { channel } => {
                self.get_channel(required_channel(channel)?)?.toggle()?
            }
            InitCommand::SetState { state, channel } => self
                .get_channel(required_channel(channel)?)?
                .set_state(state)?,
            InitCommand::SetVoltage { voltage, channel } => self
                .get_channel(required_channel(channel)?)?
                .set_voltage(Voltage::from_volts(voltage))?,
            InitCommand::SetCurrent {
                current,
                channel,
                level: None,
            } => self
                .get_channel(required_channel(channel)?)?
                .set_current(Current::from_amperes(current))?,
            _ => return Err(CommandError::Unsupported(self.kind())),
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Device for Ks33500b<DynInterface> {
    fn idn(&self) -> &str {
        self.get_name()
    }

    fn address(&self) -> &str {
        self.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::FunctionGenerator
    }

    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.resource().reset()
    }

    fn set_local(&mut self) -> Result<(), InstrumentError> {
        self.resource().set_local()
    }

    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError> {
        match cmd {
            InitCommand::Reset => self.resource().reset()?,
            InitCommand::ClearStatus => self.resource().clear_status()?,
            InitCommand::SetLocal => self.resource().set_local()?,
            InitCommand::SetWaveformConfig {
                channel,
                waveform,
                frequency,
                amplitude,
                offset,
            } => {
                let function = waveform
                    .as_deref()
                    .map(str::parse::<WaveFunction>)
                    .transpose()?;
                self.get_channel(channel_index(*channel)?)?
                    .configure_waveform(
                        function,
                        frequency.map(Frequency::from_hertz),
                        amplitude.map(Voltage::from_volts),
                        offset.map(Voltage::from_volts),
                    )?
            }
            InitCommand::SetFunction { function, channel } => {
                let function = function.parse::<WaveFunction>()?;
                self.get_channel(channel_index(*channel)?)?
                    .set_function(function)?
            }
            InitCommand::SetFrequency { frequency, channel } => self
                .get_channel(channel_index(*channel)?)?
                .set_frequency(Frequency::from_hertz(*frequency))?,
            InitCommand::SetAmplitude { amplitude, channel } => self
                .get_channel(channel_index(*channel)?)?
                .set_amplitude(Voltage::from_volts(*amplitude))?,
            InitCommand::SetOffset { offset, channel } => self
                .get_channel(channel_index(*channel)?)?
                .set_offset(Voltage::from_volts(*offset))?,
            InitCommand::SetOutputState { state, channel } => self
                .get_channel(channel_index(*channel)?)?
                .set_output_state(*state)?,
            _ => return Err(CommandError::Unsupported(self.kind())),
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn load_level(level: Option<u8>) -> Result<LoadLevel, InstrumentError> {
    match level {
        None | Some(0) => Ok(LoadLevel::Both),
        Some(1) => Ok(LoadLevel::L1),
        Some(2) => Ok(LoadLevel::L2),
        Some(other) => Err(InstrumentError::InvalidArgument(format!(
            "Load level must be 0 (both), 1 or 2, got {other}"
        ))),
    }
}

impl Device for Chroma6310<DynInterface> {
    fn idn(&self) -> &str {
        self.get_name()
    }

    fn address(&self) -> &str {
        self.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::ElectronicLoad
    }

    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.resource().reset()
    }

    fn set_local(&mut self) -> Result<(), InstrumentError> {
        self.resource().set_local()
    }

    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError> {
        match cmd {
            InitCommand::Reset => self.resource().reset()?,
            InitCommand::ClearStatus => self.resource().clear_status()?,
            InitCommand::SetLocal => self.resource().set_local()?,
            InitCommand::On { channel: None } => self.on()?,
            InitCommand::Off { channel: None } => self.off()?,
            InitCommand::Toggle { channel: None } => self.toggle()?,
            InitCommand::SetState {
                state,
                channel: None,
            } => self.set_state(*state)?,
            InitCommand::SetCurrent {
                current,
                channel: None,
                level,
            } => self.set_current(Current::from_amperes(*current), load_level(*level)?)?,
            InitCommand::SetCurrentRange { cc_range } => {
                let range = match cc_range.to_ascii_uppercase().as_str() {
                    "LOW" | "CCL" => CurrentRange::Low,
                    "HIGH" | "CCH" => CurrentRange::High,
                    _ => {
                        return Err(InstrumentError::InvalidArgument(format!(
                            "Unknown current range: {cc_range}"
                        ))
                        .into());
                    }
                };
                self.set_current_range(range)?
            }
            InitCommand::AutoRange { current } => self.auto_range(Current::from_amperes(*current))?,
            InitCommand::SetCurrentSlewRate { slew_rate, edge } => {
                let edge = match edge.to_ascii_lowercase().as_str() {
                    "rise" => Edge::Rise,
                    "fall" => Edge::Fall,
                    _ => {
                        return Err(InstrumentError::InvalidArgument(format!(
                            "Unknown edge: {edge}"
                        ))
                        .into());
                    }
                };
                self.set_current_slew_rate(*slew_rate, edge)?
            }
            _ => return Err(CommandError::Unsupported(self.kind())),
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Device for Hp34401a<DynInterface> {
    fn idn(&self) -> &str {
        self.get_name()
    }

    fn address(&self) -> &str {
        self.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Multimeter
    }

    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.resource().reset()
    }

    fn set_local(&mut self) -> Result<(), InstrumentError> {
        Hp34401a::set_local(self)
    }

    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError> {
        match cmd {
            InitCommand::Reset => self.resource().reset()?,
            InitCommand::ClearStatus => self.resource().clear_status()?,
            InitCommand::SetLocal => Hp34401a::set_local(self)?,
            InitCommand::SetMode { mode } => self.set_mode(mode.parse()?)?,
            InitCommand::Config {
                mode,
                acdc,
                signal_range,
                resolution,
                nplc,
            } => {
                let mut mode: MeasurementMode = mode.parse()?;
                if let Some(acdc) = acdc {
                    mode = match (acdc.to_ascii_uppercase().as_str(), mode) {
                        ("AC", MeasurementMode::VoltageDc) => MeasurementMode::VoltageAc,
                        ("AC", MeasurementMode::CurrentDc) => MeasurementMode::CurrentAc,
                        ("DC", MeasurementMode::VoltageAc) => MeasurementMode::VoltageDc,
                        ("DC", MeasurementMode::CurrentAc) => MeasurementMode::CurrentDc,
                        ("AC" | "DC", mode) => mode,
                        _ => {
                            return Err(InstrumentError::InvalidArgument(format!(
                                "acdc must be AC or DC, got {acdc}"
                            ))
                            .into());
                        }
                    };
                }
                let defaults = MeasurementConfig::default();
                self.config(&MeasurementConfig {
                    mode,
                    range: *signal_range,
                    resolution: *resolution,
                    nplc: nplc.unwrap_or(defaults.nplc),
                })?
            }
            InitCommand::SetTrigger {
                trigger,
                delay,
                count,
            } => {
                let source: TriggerSource = trigger.parse()?;
                let delay = delay.map(seconds).transpose()?;
                self.set_trigger(source, delay, count.map(TriggerCount::Count))?
            }
            InitCommand::SetTriggerSource { trigger } => {
                self.set_trigger_source(trigger.parse()?)?
            }
            InitCommand::SetSampleCount { count } => self.set_sample_count(*count)?,
            InitCommand::Init => Hp34401a::init(self)?,
            InitCommand::Abort => self.abort()?,
            InitCommand::Trigger => Hp34401a::trigger(self, true)?,
            _ => return Err(CommandError::Unsupported(self.kind())),
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_multimeter(&mut self) -> Option<&mut dyn Multimeter> {
        Some(self)
    }
}

impl Multimeter for Hp34401a<DynInterface> {
    fn init(&mut self) -> Result<(), InstrumentError> {
        Hp34401a::init(self)
    }

    fn trigger(&mut self) -> Result<(), InstrumentError> {
        Hp34401a::trigger(self, true)
    }

    fn fetch_data(&mut self) -> Result<Vec<f64>, InstrumentError> {
        Hp34401a::fetch_data(self)
    }
}

impl Device for Dpo4xxx<DynInterface> {
    fn idn(&self) -> &str {
        self.get_name()
    }

    fn address(&self) -> &str {
        self.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Oscilloscope
    }

    fn reset(&mut self) -> Result<(), InstrumentError> {
        self.resource().reset()
    }

    fn set_local(&mut self) -> Result<(), InstrumentError> {
        self.resource().set_local()
    }

    fn execute(&mut self, cmd: &InitCommand) -> Result<(), CommandError> {
        match cmd {
            InitCommand::Reset => self.resource().reset()?,
            InitCommand::ClearStatus => self.resource().clear_status()?,
            InitCommand::SetLocal => self.resource().set_local()?,
            InitCommand::SetTriggerMode { mode } => {
                let mode = match mode.to_ascii_uppercase().as_str() {
                    "AUTO" => TriggerMode::Auto,
                    "NORM" | "NORMAL" => TriggerMode::Normal,
                    _ => {
                        return Err(InstrumentError::InvalidArgument(format!(
                            "Unknown trigger mode: {mode}"
                        ))
                        .into());
                    }
                };
                self.set_trigger_mode(mode)?
            }
            InitCommand::SetTriggerLevel { level } => {
                self.set_trigger_level(Voltage::from_volts(*level))?
            }
            InitCommand::SetTriggerPosition { position } => self.set_trigger_position(*position)?,
            InitCommand::SetRecordLength { length } => self.set_record_length(*length)?,
            InitCommand::SetHorizontalScale { scale } => self.set_horizontal_scale(*scale)?,
            InitCommand::SelectChannel { channel, state } => {
                self.get_channel(channel_index(*channel)?)?.select(*state)?
            }
            InitCommand::SetChannelScale { channel, scale } => {
                self.get_channel(channel_index(*channel)?)?.set_scale(*scale)?
            }
            InitCommand::SetChannelLabel { channel, label } => {
                self.get_channel(channel_index(*channel)?)?.set_label(label)?
            }
            _ => return Err(CommandError::Unsupported(self.kind())),
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
