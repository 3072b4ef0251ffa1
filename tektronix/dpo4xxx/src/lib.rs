//! A rust driver for the Tektronix DPO4000 / MSO4000 series of oscilloscopes.
//!
//! Vertical settings and waveform transfer are done per channel through [`Channel`] structs,
//! horizontal, trigger and measurement settings through the [`Dpo4xxx`] struct itself.
//!
//! # Example
//!
//! ```no_run
//! use equipmentrs::TcpIpInterface;
//! use tektronix_dpo4xxx::Dpo4xxx;
//!
//! let interface = TcpIpInterface::simple("10.0.0.20:4000").unwrap();
//! let mut scope = Dpo4xxx::try_new(interface, "TCPIP0::10.0.0.20::4000::SOCKET").unwrap();
//!
//! scope.trigger_single().unwrap();
//! let wfm = scope.get_channel_data(0, 0.0, 100.0).unwrap();
//! println!("{} samples, first at {} s", wfm.amplitude.len(), wfm.time[0]);
//! ```

#![deny(warnings, missing_docs)]

use equipmentrs::{InstrumentError, InstrumentInterface, ScpiResource, parse_f64, parse_int};

use measurements::{Frequency, Voltage};

/// Measurement types of the scope, see [`Dpo4xxx::configure_measurement`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum MeasurementType {
    Amplitude,
    Area,
    Burst,
    CycleArea,
    CycleMean,
    CycleRms,
    Delay,
    Fall,
    Frequency,
    High,
    Low,
    Maximum,
    Mean,
    Minimum,
    NegativeDutyCycle,
    NegativeOvershoot,
    NegativeWidth,
    Period,
    Phase,
    PeakToPeak,
    PositiveDutyCycle,
    PositiveOvershoot,
    PositiveWidth,
    Rise,
    Rms,
}

impl MeasurementType {
    fn as_scpi(&self) -> &'static str {
        match self {
            MeasurementType::Amplitude => "AMPlitude",
            MeasurementType::Area => "AREa",
            MeasurementType::Burst => "BURst",
            MeasurementType::CycleArea => "CARea",
            MeasurementType::CycleMean => "CMEan",
            MeasurementType::CycleRms => "CRMs",
            MeasurementType::Delay => "DELay",
            MeasurementType::Fall => "FALL",
            MeasurementType::Frequency => "FREQuency",
            MeasurementType::High => "HIGH",
            MeasurementType::Low => "LOW",
            MeasurementType::Maximum => "MAXimum",
            MeasurementType::Mean => "MEAN",
            MeasurementType::Minimum => "MINImum",
            MeasurementType::NegativeDutyCycle => "NDUty",
            MeasurementType::NegativeOvershoot => "NOVershoot",
            MeasurementType::NegativeWidth => "NWIdth",
            MeasurementType::Period => "PERIod",
            MeasurementType::Phase => "PHAse",
            MeasurementType::PeakToPeak => "PK2Pk",
            MeasurementType::PositiveDutyCycle => "PDUty",
            MeasurementType::PositiveOvershoot => "POVershoot",
            MeasurementType::PositiveWidth => "PWIdth",
            MeasurementType::Rise => "RISe",
            MeasurementType::Rms => "RMS",
        }
    }

    /// Returns `true` if the measurement relates two waveforms, e.g., delay and phase.
    pub fn is_dual_waveform(&self) -> bool {
        matches!(self, MeasurementType::Delay | MeasurementType::Phase)
    }
}

/// Trigger modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerMode {
    /// Acquire even without a trigger event.
    Auto,
    /// Only acquire on a trigger event.
    Normal,
}

/// A waveform read from the scope.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Waveform {
    /// Time of each sample relative to the trigger in s.
    pub time: Vec<f64>,
    /// Amplitude of each sample in the units of the channel.
    pub amplitude: Vec<f64>,
}

/// A rust driver for the Tektronix DPO4xxx oscilloscopes.
pub struct Dpo4xxx<T: InstrumentInterface> {
    resource: ScpiResource<T>,
    num_channels: usize,
}

impl<T: InstrumentInterface> Dpo4xxx<T> {
    /// Connect to the scope.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address of the scope.
    pub fn try_new(interface: T, address: &str) -> Result<Self, InstrumentError> {
        Ok(Self {
            resource: ScpiResource::connect(interface, address)?,
            num_channels: 4,
        })
    }

    /// Query the name of the instrument, as reported when connecting.
    pub fn get_name(&self) -> &str {
        self.resource.idn()
    }

    /// The resource address the instrument was connected on.
    pub fn address(&self) -> &str {
        self.resource.address()
    }

    /// Access the underlying SCPI resource for the IEEE 488.2 common commands.
    pub fn resource(&mut self) -> &mut ScpiResource<T> {
        &mut self.resource
    }

    /// Get a new channel with a given index.
    ///
    /// Please note that channels are zero indexed, index 0 is `CH1`.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        if idx >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_channels,
            });
        }
        Ok(Channel {
            idx,
            resource: self.resource.clone(),
        })
    }

    /// Read the waveform of a channel, see [`Channel::get_data`].
    pub fn get_channel_data(
        &mut self,
        idx: usize,
        start_percent: f64,
        stop_percent: f64,
    ) -> Result<Waveform, InstrumentError> {
        self.get_channel(idx)?.get_data(start_percent, stop_percent)
    }

    /// Press the run/stop button.
    pub fn trigger_run_stop(&mut self) -> Result<(), InstrumentError> {
        self.resource.write_resource("FPANEL:PRESS RUnstop")
    }

    /// Force a trigger event.
    pub fn trigger_force(&mut self) -> Result<(), InstrumentError> {
        self.resource.write_resource("TRIG FORC")
    }

    /// Press the single sequence button.
    pub fn trigger_single(&mut self) -> Result<(), InstrumentError> {
        self.resource.write_resource("FPANEL:PRESS SING")
    }

    /// Set the position of the trigger in percent of the record.
    pub fn set_trigger_position(&mut self, position: f64) -> Result<(), InstrumentError> {
        if !(0.0..=100.0).contains(&position) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: position,
                min: 0.0,
                max: 100.0,
            });
        }
        self.resource.write_resource(&format!("HOR:POS {position}"))
    }

    /// Get the position of the trigger in percent of the record.
    pub fn get_trigger_position(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.resource.query_resource("HOR:POS?")?)
    }

    /// Set the trigger mode.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), InstrumentError> {
        let val = match mode {
            TriggerMode::Auto => "AUTO",
            TriggerMode::Normal => "NORM",
        };
        self.resource.write_resource(&format!("TRIG:A:MOD {val}"))
    }

    /// Get the trigger mode.
    pub fn get_trigger_mode(&mut self) -> Result<TriggerMode, InstrumentError> {
        let resp = self.resource.query_resource("TRIG:A:MOD?")?;
        match resp.to_ascii_uppercase().as_str() {
            "AUTO" => Ok(TriggerMode::Auto),
            "NORM" | "NORMAL" => Ok(TriggerMode::Normal),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Set the trigger level of the A trigger.
    pub fn set_trigger_level(&mut self, level: Voltage) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("TRIG:A:LEV {}", level.as_volts()))
    }

    /// Get the trigger level of the A trigger.
    pub fn get_trigger_level(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.resource.query_resource("TRIG:A:LEV?")?;
        Ok(Voltage::from_volts(parse_f64(&resp)?))
    }

    /// Set the record length in samples.
    ///
    /// The scope picks the closest record length it supports.
    pub fn set_record_length(&mut self, length: u32) -> Result<(), InstrumentError> {
        self.resource.write_resource(&format!("HOR:RECO {length}"))
    }

    /// Get the record length in samples.
    pub fn get_record_length(&mut self) -> Result<u32, InstrumentError> {
        let resp = self.resource.query_resource("HOR:RECO?")?;
        u32::try_from(parse_int(&resp)?).map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Set the horizontal scale in s per division.
    pub fn set_horizontal_scale(&mut self, scale: f64) -> Result<(), InstrumentError> {
        self.resource.write_resource(&format!("HOR:SCA {scale}"))
    }

    /// Get the horizontal scale in s per division.
    pub fn get_horizontal_scale(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.resource.query_resource("HOR:SCA?")?)
    }

    /// Enable or disable the zoom mode.
    pub fn set_zoom_mode(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("ZOO:MODE {}", if state { "ON" } else { "OFF" }))
    }

    /// Get the state of the zoom mode.
    pub fn get_zoom_mode(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.resource.query_resource("ZOO:MODE?")?.to_lowercase();
        Ok(["1", "on", "true"].iter().any(|key| resp.contains(key)))
    }

    /// Set the position of the zoom window in percent of the record.
    pub fn set_zoom_position(&mut self, position: f64) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("ZOO:ZOOM:POS {position}"))
    }

    /// Get the position of the zoom window in percent of the record.
    pub fn get_zoom_position(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.resource.query_resource("ZOO:ZOOM:POS?")?)
    }

    /// Set the horizontal scale of the zoom window in s per division.
    pub fn set_zoom_scale(&mut self, scale: f64) -> Result<(), InstrumentError> {
        self.resource.write_resource(&format!("ZOO:ZOOM:SCA {scale}"))
    }

    /// Get the horizontal scale of the zoom window in s per division.
    pub fn get_zoom_scale(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.resource.query_resource("ZOO:ZOOM:SCA?")?)
    }

    /// Configure one of the measurement slots.
    ///
    /// Slot 0 is the immediate measurement. `source2` is required for measurements that relate
    /// two waveforms. Sources are zero indexed channel indices.
    pub fn configure_measurement(
        &mut self,
        slot: usize,
        measurement: MeasurementType,
        source1: usize,
        source2: Option<usize>,
    ) -> Result<(), InstrumentError> {
        let slot_name = measurement_slot(slot);
        for src in std::iter::once(source1).chain(source2) {
            if src >= self.num_channels {
                return Err(InstrumentError::ChannelIndexOutOfRange {
                    idx: src,
                    nof_channels: self.num_channels,
                });
            }
        }
        let source2 = match (measurement.is_dual_waveform(), source2) {
            (true, None) => {
                return Err(InstrumentError::InvalidArgument(format!(
                    "A second source is required for {measurement:?} measurements"
                )));
            }
            (true, Some(src)) => Some(src),
            (false, _) => None,
        };

        self.resource.write_resource(&format!(
            "MEASU:{slot_name}:TYP {}",
            measurement.as_scpi()
        ))?;
        self.resource
            .write_resource(&format!("MEASU:{slot_name}:SOU1 CH{}", source1 + 1))?;
        if let Some(src) = source2 {
            self.resource
                .write_resource(&format!("MEASU:{slot_name}:SOU2 CH{}", src + 1))?;
        }
        Ok(())
    }

    /// Get the value of a measurement slot, slot 0 being the immediate measurement.
    ///
    /// Returns NaN if the scope reports a value that cannot be parsed, e.g., because nothing is
    /// assigned to the slot.
    pub fn get_measure_data(&mut self, slot: usize) -> Result<f64, InstrumentError> {
        let resp = self
            .resource
            .query_resource(&format!("MEASU:{}:VAL?", measurement_slot(slot)))?;
        Ok(parse_f64(&resp).unwrap_or(f64::NAN))
    }
}

impl<T: InstrumentInterface> Clone for Dpo4xxx<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            num_channels: self.num_channels,
        }
    }
}

/// Channel structure representing a single analog channel of the scope.
///
/// **This structure can only be created through the [`Dpo4xxx`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    resource: ScpiResource<T>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// The channel number as printed on the front panel.
    pub fn number(&self) -> usize {
        self.idx + 1
    }

    /// Show or hide the channel.
    pub fn select(&mut self, state: bool) -> Result<(), InstrumentError> {
        let cmd = format!("SEL:CH{} {}", self.number(), if state { "ON" } else { "OFF" });
        self.resource.write_resource(&cmd)
    }

    /// Set the label of the channel.
    pub fn set_label(&mut self, label: &str) -> Result<(), InstrumentError> {
        let cmd = format!("CH{}:LAB \"{label}\"", self.number());
        self.resource.write_resource(&cmd)
    }

    /// Get the label of the channel.
    pub fn get_label(&mut self) -> Result<String, InstrumentError> {
        let cmd = format!("CH{}:LAB?", self.number());
        Ok(self.resource.query_resource(&cmd)?.replace('"', ""))
    }

    /// Set the bandwidth limit of the channel.
    ///
    /// The scope picks the closest bandwidth it supports.
    pub fn set_bandwidth(&mut self, bandwidth: Frequency) -> Result<(), InstrumentError> {
        let cmd = format!("CH{}:BAN {}", self.number(), bandwidth.as_hertz());
        self.resource.write_resource(&cmd)
    }

    /// Get the bandwidth limit of the channel.
    pub fn get_bandwidth(&mut self) -> Result<Frequency, InstrumentError> {
        let cmd = format!("CH{}:BAN?", self.number());
        Ok(Frequency::from_hertz(parse_f64(
            &self.resource.query_resource(&cmd)?,
        )?))
    }

    /// Set the vertical scale in units per division.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), InstrumentError> {
        let cmd = format!("CH{}:SCA {scale}", self.number());
        self.resource.write_resource(&cmd)
    }

    /// Get the vertical scale in units per division.
    pub fn get_scale(&mut self) -> Result<f64, InstrumentError> {
        let cmd = format!("CH{}:SCA?", self.number());
        parse_f64(&self.resource.query_resource(&cmd)?)
    }

    /// Set the vertical offset in units of the channel.
    pub fn set_offset(&mut self, offset: f64) -> Result<(), InstrumentError> {
        let cmd = format!("CH{}:OFFS {offset}", self.number());
        self.resource.write_resource(&cmd)
    }

    /// Get the vertical offset in units of the channel.
    pub fn get_offset(&mut self) -> Result<f64, InstrumentError> {
        let cmd = format!("CH{}:OFFS?", self.number());
        parse_f64(&self.resource.query_resource(&cmd)?)
    }

    /// Set the vertical position in divisions.
    pub fn set_position(&mut self, position: f64) -> Result<(), InstrumentError> {
        let cmd = format!("CH{}:POS {position}", self.number());
        self.resource.write_resource(&cmd)
    }

    /// Get the vertical position in divisions.
    pub fn get_position(&mut self) -> Result<f64, InstrumentError> {
        let cmd = format!("CH{}:POS?", self.number());
        parse_f64(&self.resource.query_resource(&cmd)?)
    }

    /// Read the waveform of the channel between two points of the record.
    ///
    /// Start and stop are given in percent of the record length and clipped to 0..=100. The
    /// time axis is zero at the trigger position. Samples are transferred as unsigned bytes
    /// and scaled with the waveform preamble of the scope.
    pub fn get_data(
        &mut self,
        start_percent: f64,
        stop_percent: f64,
    ) -> Result<Waveform, InstrumentError> {
        let len = parse_int(&self.resource.query_resource("HOR:RECO?")?)? as f64;
        let trigger_pos = parse_f64(&self.resource.query_resource("HOR:POS?")?)?;
        let x_offset = (trigger_pos / 100.0 * len).trunc();
        let start = start_percent.clamp(0.0, 100.0) / 100.0 * len;
        let stop = stop_percent.clamp(0.0, 100.0) / 100.0 * len;

        let source = format!("DATA:SOU CH{}", self.number());
        self.resource.write_resource(&source)?;
        self.resource.write_resource("DATA:WIDTH 1")?;
        self.resource.write_resource("DATA:ENC RPB")?;
        self.resource
            .write_resource(&format!("DATA:START {}", start as i64))?;
        self.resource
            .write_resource(&format!("DATA:STOP {}", stop as i64))?;

        let dt = parse_f64(&self.resource.query_resource("WFMPRE:XINCR?")?)?;
        let y_offset = parse_f64(&self.resource.query_resource("WFMPRE:YOFF?")?)?;
        let y_scale = parse_f64(&self.resource.query_resource("WFMPRE:YMULT?")?)?;
        let y_zero = parse_f64(&self.resource.query_resource("WFMPRE:YZERO?")?)?;

        self.resource.write_resource("CURVE?")?;
        let raw = self.resource.read_resource_raw()?;

        let amplitude = raw
            .iter()
            .map(|&b| (b as f64 - y_offset) * y_scale + y_zero)
            .collect();
        let t0 = (x_offset - start.min(stop)) * dt;
        let time = (0..raw.len()).map(|i| i as f64 * dt - t0).collect();
        Ok(Waveform { time, amplitude })
    }
}

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            resource: self.resource.clone(),
        }
    }
}

fn measurement_slot(slot: usize) -> String {
    if slot == 0 {
        "IMM".to_string()
    } else {
        format!("MEAS{slot}")
    }
}
