//! A rust driver for the Keysight 33500B series of function generators.
//!
//! The generator has two outputs that are addressed through [`Channel`] structs. Commands are
//! taken from the 33500 series programming manual.
//!
//! # Example
//!
//! ```no_run
//! use equipmentrs::TcpIpInterface;
//! use keysight_33500b::{Ks33500b, WaveFunction, WaveformConfig};
//! use measurements::{Frequency, Voltage};
//!
//! let interface = TcpIpInterface::simple("10.0.0.9:5025").unwrap();
//! let mut fgen = Ks33500b::try_new(interface, "TCPIP0::10.0.0.9::5025::SOCKET").unwrap();
//!
//! let mut ch1 = fgen.get_channel(0).unwrap();
//! ch1.set_waveform_config(&WaveformConfig {
//!     function: WaveFunction::Square,
//!     frequency: Frequency::from_hertz(10e3),
//!     amplitude: Voltage::from_volts(3.3),
//!     offset: Voltage::from_volts(1.65),
//! })
//! .unwrap();
//! ch1.set_output_state(true).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::{fmt, str::FromStr, time::Duration};

use equipmentrs::{InstrumentError, InstrumentInterface, ScpiResource, parse_bool, parse_f64};

use measurements::{Frequency, Resistance, Voltage};

/// Responses at or above this value stand for "infinite" on Keysight instruments.
const INFINITY_THRESHOLD: f64 = 9.9e37;

/// Waveform functions of the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveFunction {
    /// Arbitrary waveform.
    Arbitrary,
    /// DC voltage.
    Dc,
    /// Gaussian noise.
    Noise,
    /// Pseudo-random binary sequence.
    Prbs,
    /// Pulse.
    Pulse,
    /// Ramp.
    Ramp,
    /// Sine.
    Sine,
    /// Square.
    Square,
    /// Triangle.
    Triangle,
}

impl WaveFunction {
    fn as_scpi(&self) -> &'static str {
        match self {
            WaveFunction::Arbitrary => "ARB",
            WaveFunction::Dc => "DC",
            WaveFunction::Noise => "NOIS",
            WaveFunction::Prbs => "PRBS",
            WaveFunction::Pulse => "PULS",
            WaveFunction::Ramp => "RAMP",
            WaveFunction::Sine => "SIN",
            WaveFunction::Square => "SQU",
            WaveFunction::Triangle => "TRI",
        }
    }
}

impl fmt::Display for WaveFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_scpi())
    }
}

impl FromStr for WaveFunction {
    type Err = InstrumentError;

    /// Parses short and long forms, case insensitive, e.g., `"SIN"`, `"sinusoid"` or `"PULSE"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().trim_matches('"').to_ascii_uppercase();
        let func = match upper.as_str() {
            "ARB" | "ARBITRARY" => WaveFunction::Arbitrary,
            "DC" => WaveFunction::Dc,
            "NOIS" | "NOISE" => WaveFunction::Noise,
            "PRBS" => WaveFunction::Prbs,
            "PULS" | "PULSE" => WaveFunction::Pulse,
            "RAMP" => WaveFunction::Ramp,
            "SIN" | "SINE" | "SINUSOID" => WaveFunction::Sine,
            "SQU" | "SQUARE" => WaveFunction::Square,
            "TRI" | "TRIANGLE" => WaveFunction::Triangle,
            _ => {
                return Err(InstrumentError::InvalidArgument(format!(
                    "Invalid waveform function: {s}"
                )));
            }
        };
        Ok(func)
    }
}

/// Edge of a pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseEdge {
    /// Leading and trailing edge.
    Both,
    /// Leading (rising) edge.
    Leading,
    /// Trailing (falling) edge.
    Trailing,
}

/// The pulse parameter that is held constant when the period changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseHold {
    /// Keep the duty cycle.
    DutyCycle,
    /// Keep the pulse width.
    Width,
}

/// Burst modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstMode {
    /// A burst of a number of cycles is output on each trigger.
    Triggered,
    /// The output is gated by the external trigger signal.
    Gated,
}

/// Number of cycles per burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstCount {
    /// A fixed number of cycles.
    Cycles(u32),
    /// Output continuously once triggered.
    Infinite,
}

/// Trigger sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerSource {
    /// Trigger immediately.
    Immediate,
    /// Rear panel trigger input.
    External,
    /// Internal timer.
    Timer,
    /// Software trigger through `*TRG` or [`Channel::trigger`].
    Bus,
}

impl TriggerSource {
    fn as_scpi(&self) -> &'static str {
        match self {
            TriggerSource::Immediate => "IMM",
            TriggerSource::External => "EXT",
            TriggerSource::Timer => "TIM",
            TriggerSource::Bus => "BUS",
        }
    }
}

impl FromStr for TriggerSource {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IMM" | "IMMEDIATE" => Ok(TriggerSource::Immediate),
            "EXT" | "EXTERNAL" => Ok(TriggerSource::External),
            "TIM" | "TIMER" => Ok(TriggerSource::Timer),
            "BUS" => Ok(TriggerSource::Bus),
            _ => Err(InstrumentError::InvalidArgument(format!(
                "Invalid trigger source: {s}"
            ))),
        }
    }
}

/// Load the output expects to drive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputLoad {
    /// A terminated load of the given impedance.
    Impedance(Resistance),
    /// High impedance load.
    HighZ,
}

/// The configuration set or reported by the `APPLy` command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformConfig {
    /// Waveform function.
    pub function: WaveFunction,
    /// Frequency of the waveform.
    pub frequency: Frequency,
    /// Peak-to-peak amplitude.
    pub amplitude: Voltage,
    /// DC offset.
    pub offset: Voltage,
}

/// A rust driver for the Keysight 33500B function generator.
pub struct Ks33500b<T: InstrumentInterface> {
    resource: ScpiResource<T>,
    num_channels: usize,
}

impl<T: InstrumentInterface> Ks33500b<T> {
    /// Connect to the function generator.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address of the function generator.
    pub fn try_new(interface: T, address: &str) -> Result<Self, InstrumentError> {
        Ok(Self {
            resource: ScpiResource::connect(interface, address)?,
            num_channels: 2,
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
    /// Please note that channels are zero indexed, index 0 is source 1.
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

    /// Show a text message on the display.
    pub fn set_display_text(&mut self, text: &str) -> Result<(), InstrumentError> {
        if text.contains('"') {
            return Err(InstrumentError::InvalidArgument(
                "Display text must not contain double quotes".to_string(),
            ));
        }
        self.resource
            .write_resource(&format!("DISP:TEXT \"{text}\""))
    }

    /// Get the text message shown on the display.
    pub fn get_display_text(&mut self) -> Result<String, InstrumentError> {
        Ok(self.resource.query_resource("DISP:TEXT?")?.replace('"', ""))
    }

    /// Remove the text message from the display.
    pub fn clear_display_text(&mut self) -> Result<(), InstrumentError> {
        self.set_display_text("")
    }

    /// Store an arbitrary waveform in volatile memory under the given name.
    ///
    /// The samples are centered around their mean and scaled to the full DAC range of
    /// +/-32767. Between 9 and 65535 samples are accepted.
    pub fn store_arbitrary_waveform(
        &mut self,
        data: &[f64],
        name: &str,
    ) -> Result<(), InstrumentError> {
        if !(9..65536).contains(&data.len()) {
            return Err(InstrumentError::IntValueOutOfRange {
                value: data.len() as i64,
                min: 9,
                max: 65535,
            });
        }
        let dac = scale_to_dac(data)?;
        let values: Vec<String> = dac.iter().map(|v| v.to_string()).collect();
        self.resource
            .write_resource(&format!("SOUR:DATA:ARB1:DAC {name},{}", values.join(",")))
    }
}

impl<T: InstrumentInterface> Clone for Ks33500b<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            num_channels: self.num_channels,
        }
    }
}

/// Channel structure representing a single output of the function generator.
///
/// **This structure can only be created through the [`Ks33500b`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    resource: ScpiResource<T>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// The source number of the channel as used in commands.
    pub fn source(&self) -> usize {
        self.idx + 1
    }

    /// Configure function, frequency, amplitude and offset in one command.
    pub fn set_waveform_config(&mut self, config: &WaveformConfig) -> Result<(), InstrumentError> {
        let cmd = format!(
            "SOUR{}:APPL:{} {}, {}, {}",
            self.source(),
            config.function,
            config.frequency.as_hertz(),
            config.amplitude.as_volts(),
            config.offset.as_volts()
        );
        self.resource.write_resource(&cmd)
    }

    /// Configure the waveform, keeping the current values of the parameters that are `None`.
    pub fn configure_waveform(
        &mut self,
        function: Option<WaveFunction>,
        frequency: Option<Frequency>,
        amplitude: Option<Voltage>,
        offset: Option<Voltage>,
    ) -> Result<(), InstrumentError> {
        let config = WaveformConfig {
            function: match function {
                Some(f) => f,
                None => self.get_function()?,
            },
            frequency: match frequency {
                Some(f) => f,
                None => self.get_frequency()?,
            },
            amplitude: match amplitude {
                Some(a) => a,
                None => self.get_amplitude()?,
            },
            offset: match offset {
                Some(o) => o,
                None => self.get_offset()?,
            },
        };
        self.set_waveform_config(&config)
    }

    /// Get function, frequency, amplitude and offset in one query.
    pub fn get_waveform_config(&mut self) -> Result<WaveformConfig, InstrumentError> {
        let resp = self.query_source("APPL?")?;
        let cleaned = resp.replace('"', "");
        let (func, info) = cleaned
            .split_once(char::is_whitespace)
            .ok_or_else(|| InstrumentError::ResponseParseError(resp.clone()))?;
        let values = info
            .split(',')
            .map(parse_f64)
            .collect::<Result<Vec<f64>, _>>()?;
        if values.len() != 3 {
            return Err(InstrumentError::ResponseParseError(resp));
        }
        Ok(WaveformConfig {
            function: func
                .parse()
                .map_err(|_| InstrumentError::ResponseParseError(resp.clone()))?,
            frequency: Frequency::from_hertz(values[0]),
            amplitude: Voltage::from_volts(values[1]),
            offset: Voltage::from_volts(values[2]),
        })
    }

    /// Set the peak-to-peak amplitude.
    pub fn set_amplitude(&mut self, amplitude: Voltage) -> Result<(), InstrumentError> {
        self.write_source(&format!("VOLT:AMPL {}", amplitude.as_volts()))
    }

    /// Get the peak-to-peak amplitude.
    pub fn get_amplitude(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(parse_f64(&self.query_source("VOLT:AMPL?")?)?))
    }

    /// Set the DC offset.
    pub fn set_offset(&mut self, offset: Voltage) -> Result<(), InstrumentError> {
        self.write_source(&format!("VOLT:OFFS {}", offset.as_volts()))
    }

    /// Get the DC offset.
    pub fn get_offset(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(parse_f64(&self.query_source("VOLT:OFFS?")?)?))
    }

    /// Set the high level of the waveform.
    pub fn set_voltage_high(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        self.write_source(&format!("VOLT:HIGH {}", voltage.as_volts()))
    }

    /// Get the high level of the waveform.
    pub fn get_voltage_high(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(parse_f64(&self.query_source("VOLT:HIGH?")?)?))
    }

    /// Set the low level of the waveform.
    pub fn set_voltage_low(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        self.write_source(&format!("VOLT:LOW {}", voltage.as_volts()))
    }

    /// Get the low level of the waveform.
    pub fn get_voltage_low(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(parse_f64(&self.query_source("VOLT:LOW?")?)?))
    }

    /// Set the frequency of the waveform.
    pub fn set_frequency(&mut self, frequency: Frequency) -> Result<(), InstrumentError> {
        let hz = frequency.as_hertz();
        if hz <= 0.0 {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: hz,
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
            });
        }
        self.write_source(&format!("FREQ {hz}"))
    }

    /// Get the frequency of the waveform.
    pub fn get_frequency(&mut self) -> Result<Frequency, InstrumentError> {
        Ok(Frequency::from_hertz(parse_f64(&self.query_source("FREQ?")?)?))
    }

    /// Set the waveform function.
    pub fn set_function(&mut self, function: WaveFunction) -> Result<(), InstrumentError> {
        self.write_source(&format!("FUNC {function}"))
    }

    /// Get the waveform function.
    pub fn get_function(&mut self) -> Result<WaveFunction, InstrumentError> {
        let resp = self.query_source("FUNC?")?;
        resp.parse()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Set the duty cycle of the pulse waveform in percent, rounded to two decimals.
    pub fn set_pulse_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), InstrumentError> {
        check_percent(duty_cycle)?;
        let dc = (duty_cycle * 100.0).round() / 100.0;
        self.write_source(&format!("FUNC:PULS:DCYC {dc}"))
    }

    /// Get the duty cycle of the pulse waveform in percent.
    pub fn get_pulse_duty_cycle(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.query_source("FUNC:PULS:DCYC?")?)
    }

    /// Set the width of the pulse.
    pub fn set_pulse_width(&mut self, width: Duration) -> Result<(), InstrumentError> {
        self.write_source(&format!("FUNC:PULS:WIDT {}", width.as_secs_f64()))
    }

    /// Get the width of the pulse.
    pub fn get_pulse_width(&mut self) -> Result<Duration, InstrumentError> {
        let resp = self.query_source("FUNC:PULS:WIDT?")?;
        parse_duration(&resp)
    }

    /// Set the period of the pulse waveform.
    pub fn set_pulse_period(&mut self, period: Duration) -> Result<(), InstrumentError> {
        self.write_source(&format!("FUNC:PULS:PER {}", period.as_secs_f64()))
    }

    /// Get the period of the pulse waveform.
    pub fn get_pulse_period(&mut self) -> Result<Duration, InstrumentError> {
        let resp = self.query_source("FUNC:PULS:PER?")?;
        parse_duration(&resp)
    }

    /// Set the transition time of one or both edges of the pulse.
    pub fn set_pulse_edge_time(
        &mut self,
        time: Duration,
        edge: PulseEdge,
    ) -> Result<(), InstrumentError> {
        let cmd = match edge {
            PulseEdge::Both => "FUNC:PULS:TRAN",
            PulseEdge::Leading => "FUNC:PULS:TRAN:LEAD",
            PulseEdge::Trailing => "FUNC:PULS:TRAN:TRA",
        };
        self.write_source(&format!("{cmd} {}", time.as_secs_f64()))
    }

    /// Get the transition times of the leading and the trailing edge of the pulse.
    pub fn get_pulse_edge_times(&mut self) -> Result<(Duration, Duration), InstrumentError> {
        let lead = parse_duration(&self.query_source("FUNC:PULS:TRAN:LEAD?")?)?;
        let trail = parse_duration(&self.query_source("FUNC:PULS:TRAN:TRA?")?)?;
        Ok((lead, trail))
    }

    /// Select the pulse parameter that is held when the period changes.
    pub fn set_pulse_hold(&mut self, hold: PulseHold) -> Result<(), InstrumentError> {
        let val = match hold {
            PulseHold::DutyCycle => "DCYC",
            PulseHold::Width => "WIDT",
        };
        self.write_source(&format!("FUNC:PULS:HOLD {val}"))
    }

    /// Get the pulse parameter that is held when the period changes.
    pub fn get_pulse_hold(&mut self) -> Result<PulseHold, InstrumentError> {
        let resp = self.query_source("FUNC:PULS:HOLD?")?;
        match resp.to_ascii_uppercase().as_str() {
            "DCYC" | "DCYCLE" => Ok(PulseHold::DutyCycle),
            "WIDT" | "WIDTH" => Ok(PulseHold::Width),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Set the duty cycle of the square waveform in percent.
    pub fn set_square_duty_cycle(&mut self, duty_cycle: f64) -> Result<(), InstrumentError> {
        check_percent(duty_cycle)?;
        self.write_source(&format!("FUNC:SQU:DCYC {duty_cycle}"))
    }

    /// Get the duty cycle of the square waveform in percent.
    pub fn get_square_duty_cycle(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.query_source("FUNC:SQU:DCYC?")?)
    }

    /// Set the period of the square waveform.
    pub fn set_square_period(&mut self, period: Duration) -> Result<(), InstrumentError> {
        self.write_source(&format!("FUNC:SQU:PER {}", period.as_secs_f64()))
    }

    /// Get the period of the square waveform.
    pub fn get_square_period(&mut self) -> Result<Duration, InstrumentError> {
        let resp = self.query_source("FUNC:SQU:PER?")?;
        parse_duration(&resp)
    }

    /// Set the burst mode.
    pub fn set_burst_mode(&mut self, mode: BurstMode) -> Result<(), InstrumentError> {
        let val = match mode {
            BurstMode::Triggered => "TRIG",
            BurstMode::Gated => "GAT",
        };
        self.write_source(&format!("BURS:MODE {val}"))
    }

    /// Get the burst mode.
    pub fn get_burst_mode(&mut self) -> Result<BurstMode, InstrumentError> {
        let resp = self.query_source("BURS:MODE?")?;
        match resp.to_ascii_uppercase().as_str() {
            "TRIG" | "TRIGGERED" => Ok(BurstMode::Triggered),
            "GAT" | "GATED" => Ok(BurstMode::Gated),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Set the number of cycles per burst.
    pub fn set_burst_count(&mut self, count: BurstCount) -> Result<(), InstrumentError> {
        match count {
            BurstCount::Cycles(n) => self.write_source(&format!("BURS:NCYC {n}")),
            BurstCount::Infinite => self.write_source("BURS:NCYC INF"),
        }
    }

    /// Get the number of cycles per burst.
    pub fn get_burst_count(&mut self) -> Result<BurstCount, InstrumentError> {
        let val = parse_f64(&self.query_source("BURS:NCYC?")?)?;
        if val >= INFINITY_THRESHOLD {
            Ok(BurstCount::Infinite)
        } else {
            Ok(BurstCount::Cycles(val as u32))
        }
    }

    /// Enable or disable burst mode.
    pub fn set_burst_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.write_source(&format!("BURS:STAT {}", if state { 1 } else { 0 }))
    }

    /// Get the state of burst mode.
    pub fn get_burst_state(&mut self) -> Result<bool, InstrumentError> {
        parse_bool(&self.query_source("BURS:STAT?")?)
    }

    /// Send a software trigger to this channel.
    pub fn trigger(&mut self) -> Result<(), InstrumentError> {
        let cmd = format!("TRIG{}", self.source());
        self.resource.write_resource(&cmd)
    }

    /// Set the trigger source.
    pub fn set_trigger_source(&mut self, source: TriggerSource) -> Result<(), InstrumentError> {
        let cmd = format!("TRIG{}:SOUR {}", self.source(), source.as_scpi());
        self.resource.write_resource(&cmd)
    }

    /// Get the trigger source.
    pub fn get_trigger_source(&mut self) -> Result<TriggerSource, InstrumentError> {
        let cmd = format!("TRIG{}:SOUR?", self.source());
        let resp = self.resource.query_resource(&cmd)?;
        resp.parse()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Set the delay between trigger and output.
    pub fn set_trigger_delay(&mut self, delay: Duration) -> Result<(), InstrumentError> {
        let cmd = format!("TRIG{}:DEL {}", self.source(), delay.as_secs_f64());
        self.resource.write_resource(&cmd)
    }

    /// Get the delay between trigger and output.
    pub fn get_trigger_delay(&mut self) -> Result<Duration, InstrumentError> {
        let cmd = format!("TRIG{}:DEL?", self.source());
        let resp = self.resource.query_resource(&cmd)?;
        parse_duration(&resp)
    }

    /// Enable or disable the output.
    pub fn set_output_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        let cmd = format!("OUTP{} {}", self.source(), if state { 1 } else { 0 });
        self.resource.write_resource(&cmd)
    }

    /// Get the state of the output.
    pub fn get_output_state(&mut self) -> Result<bool, InstrumentError> {
        let cmd = format!("OUTP{}?", self.source());
        parse_bool(&self.resource.query_resource(&cmd)?)
    }

    /// Set the load the output expects.
    pub fn set_output_load(&mut self, load: OutputLoad) -> Result<(), InstrumentError> {
        let cmd = match load {
            OutputLoad::Impedance(r) => format!("OUTP{}:LOAD {}", self.source(), r.as_ohms()),
            OutputLoad::HighZ => format!("OUTP{}:LOAD INF", self.source()),
        };
        self.resource.write_resource(&cmd)
    }

    /// Get the load the output expects.
    pub fn get_output_load(&mut self) -> Result<OutputLoad, InstrumentError> {
        let cmd = format!("OUTP{}:LOAD?", self.source());
        let val = parse_f64(&self.resource.query_resource(&cmd)?)?;
        if val >= INFINITY_THRESHOLD {
            Ok(OutputLoad::HighZ)
        } else {
            Ok(OutputLoad::Impedance(Resistance::from_ohms(val)))
        }
    }

    fn write_source(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let cmd = format!("SOUR{}:{cmd}", self.source());
        self.resource.write_resource(&cmd)
    }

    fn query_source(&mut self, query: &str) -> Result<String, InstrumentError> {
        let cmd = format!("SOUR{}:{query}", self.source());
        self.resource.query_resource(&cmd)
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

fn check_percent(value: f64) -> Result<(), InstrumentError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(InstrumentError::FloatValueOutOfRange {
            value,
            min: 0.0,
            max: 100.0,
        })
    }
}

fn parse_duration(resp: &str) -> Result<Duration, InstrumentError> {
    Duration::try_from_secs_f64(parse_f64(resp)?)
        .map_err(|_| InstrumentError::ResponseParseError(resp.to_string()))
}

/// Center the samples around their mean and scale them to +/-32767.
fn scale_to_dac(data: &[f64]) -> Result<Vec<i32>, InstrumentError> {
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let centered: Vec<f64> = data.iter().map(|v| v - mean).collect();
    let max = centered.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max <= 0.0 || !max.is_finite() {
        return Err(InstrumentError::InvalidArgument(
            "Arbitrary waveform must not be constant".to_string(),
        ));
    }
    Ok(centered
        .iter()
        .map(|v| (v / max * 32767.0) as i32)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_to_dac() {
        let data = [0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0];
        let dac = scale_to_dac(&data).unwrap();
        assert_eq!(dac.iter().max(), Some(&32767));
        assert_eq!(dac.len(), data.len());
        assert!(dac[0] < 0);
    }

    #[test]
    fn test_scale_to_dac_constant() {
        assert!(scale_to_dac(&[1.0; 10]).is_err());
    }
}
