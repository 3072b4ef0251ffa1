//! Commands that can be run on a device during initialization.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A command from an initialization sequence.
///
/// Commands are parsed from a `(name, arguments)` pair, see [`InitCommand::parse`]. Channel
/// numbers are counted from 1, as on the front panel of the devices.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum InitCommand {
    /// Reset the device (`*RST`).
    Reset,
    /// Clear the status registers (`*CLS`).
    ClearStatus,
    /// Return the device to local control.
    SetLocal,
    /// Turn the output on.
    On {
        /// Channel of multi-channel devices.
        channel: Option<usize>,
    },
    /// Turn the output off.
    Off {
        /// Channel of multi-channel devices.
        channel: Option<usize>,
    },
    /// Toggle the output.
    Toggle {
        /// Channel of multi-channel devices.
        channel: Option<usize>,
    },
    /// Set the output state.
    SetState {
        /// `true` for on.
        state: bool,
        /// Channel of multi-channel devices.
        channel: Option<usize>,
    },
    /// Set the voltage setpoint in V.
    SetVoltage {
        /// Voltage in V.
        voltage: f64,
        /// Channel of multi-channel devices.
        channel: Option<usize>,
    },
    /// Set the current setpoint in A.
    SetCurrent {
        /// Current in A.
        current: f64,
        /// Channel of multi-channel devices.
        channel: Option<usize>,
        /// Load level of electronic loads: 1, 2, or 0 for both.
        level: Option<u8>,
    },
    /// Set the over voltage protection in V.
    SetOverVoltageProtection {
        /// Voltage in V.
        voltage: f64,
    },
    /// Set the over current protection in A.
    SetOverCurrentProtection {
        /// Current in A.
        current: f64,
    },
    /// Select the current range of an electronic load, `"LOW"` or `"HIGH"`.
    SetCurrentRange {
        /// The range.
        cc_range: String,
    },
    /// Select the current range of an electronic load that fits the given current in A.
    AutoRange {
        /// Current in A.
        current: f64,
    },
    /// Set the current slew rate of an electronic load in A/s.
    SetCurrentSlewRate {
        /// Slew rate in A/s.
        slew_rate: f64,
        /// `"rise"` or `"fall"`.
        edge: String,
    },
    /// Select the measurement mode of a multimeter.
    SetMode {
        /// Mode name, e.g., `"VDC"` or `"FREQ"`.
        mode: String,
    },
    /// Fully configure a multimeter measurement.
    Config {
        /// Mode name, e.g., `"VOLT"` or `"RES"`.
        mode: String,
        /// `"AC"` or `"DC"`, switches voltage and current modes.
        acdc: Option<String>,
        /// Range, autorange if not given.
        signal_range: Option<f64>,
        /// Resolution in units of the measurement.
        resolution: Option<f64>,
        /// Integration time in power line cycles.
        nplc: Option<f64>,
    },
    /// Configure the trigger of a multimeter.
    SetTrigger {
        /// Trigger source, e.g., `"BUS"`.
        trigger: String,
        /// Trigger delay in s.
        delay: Option<f64>,
        /// Trigger count.
        count: Option<u32>,
    },
    /// Set the trigger source of a multimeter.
    SetTriggerSource {
        /// Trigger source, e.g., `"BUS"`.
        trigger: String,
    },
    /// Set the number of samples per trigger.
    SetSampleCount {
        /// Number of samples.
        count: u32,
    },
    /// Arm the trigger of a multimeter.
    Init,
    /// Abort a running measurement.
    Abort,
    /// Send a bus trigger.
    Trigger,
    /// Configure the waveform of a function generator channel.
    SetWaveformConfig {
        /// Channel, 1 or 2.
        channel: usize,
        /// Waveform function, e.g., `"SIN"`. Unchanged if not given.
        waveform: Option<String>,
        /// Frequency in Hz. Unchanged if not given.
        frequency: Option<f64>,
        /// Amplitude in Vpp. Unchanged if not given.
        amplitude: Option<f64>,
        /// Offset in V. Unchanged if not given.
        offset: Option<f64>,
    },
    /// Set the waveform function of a function generator channel.
    SetFunction {
        /// Waveform function, e.g., `"SQU"`.
        function: String,
        /// Channel, 1 or 2.
        channel: usize,
    },
    /// Set the frequency of a function generator channel in Hz.
    SetFrequency {
        /// Frequency in Hz.
        frequency: f64,
        /// Channel, 1 or 2.
        channel: usize,
    },
    /// Set the amplitude of a function generator channel in Vpp.
    SetAmplitude {
        /// Amplitude in Vpp.
        amplitude: f64,
        /// Channel, 1 or 2.
        channel: usize,
    },
    /// Set the offset of a function generator channel in V.
    SetOffset {
        /// Offset in V.
        offset: f64,
        /// Channel, 1 or 2.
        channel: usize,
    },
    /// Set the output state of a function generator channel.
    SetOutputState {
        /// `true` for on.
        state: bool,
        /// Channel, 1 or 2.
        channel: usize,
    },
    /// Set the trigger mode of an oscilloscope, `"AUTO"` or `"NORMAL"`.
    SetTriggerMode {
        /// The mode.
        mode: String,
    },
    /// Set the trigger level of an oscilloscope in V.
    SetTriggerLevel {
        /// Level in V.
        level: f64,
    },
    /// Set the trigger position of an oscilloscope in percent of the record.
    SetTriggerPosition {
        /// Position in percent.
        position: f64,
    },
    /// Set the record length of an oscilloscope.
    SetRecordLength {
        /// Number of samples.
        length: u32,
    },
    /// Set the horizontal scale of an oscilloscope in s/div.
    SetHorizontalScale {
        /// Scale in s/div.
        scale: f64,
    },
    /// Show or hide an oscilloscope channel.
    SelectChannel {
        /// Channel, 1 to 4.
        channel: usize,
        /// `true` to show the channel.
        state: bool,
    },
    /// Set the vertical scale of an oscilloscope channel in V/div.
    SetChannelScale {
        /// Channel, 1 to 4.
        channel: usize,
        /// Scale in V/div.
        scale: f64,
    },
    /// Set the label of an oscilloscope channel.
    SetChannelLabel {
        /// Channel, 1 to 4.
        channel: usize,
        /// The label.
        label: String,
    },
}

impl InitCommand {
    /// Parse a command from its name and arguments.
    ///
    /// Unknown names, missing or unknown arguments and arguments of the wrong type are errors.
    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        if args.is_empty()
            && let Ok(cmd) = serde_json::from_value(Value::String(name.to_string()))
        {
            return Ok(cmd);
        }
        let mut tagged = Map::new();
        tagged.insert(name.to_string(), Value::Object(args.clone()));
        serde_json::from_value(Value::Object(tagged))
    }
}
