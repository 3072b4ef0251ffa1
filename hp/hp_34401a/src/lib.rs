//! A rust driver for the HP / Agilent 34401A 6.5 digit multimeter.
//!
//! All voltage and current readings are multiplied by a configurable `factor` before they are
//! returned. When measuring the voltage across a current shunt, the factor can for example be
//! set to the conductance of the shunt. Resistance and frequency readings are not scaled.
//!
//! The `measure_*` functions check that the meter is in the matching [`MeasurementMode`] first
//! and keep the range that is currently configured.
//!
//! # Example
//!
//! ```no_run
//! use equipmentrs::TcpIpInterface;
//! use hp_34401a::{Hp34401a, MeasurementMode};
//!
//! let interface = TcpIpInterface::simple("10.0.0.15:5025").unwrap();
//! let mut dmm = Hp34401a::try_new(interface, "TCPIP0::10.0.0.15::5025::SOCKET").unwrap();
//!
//! dmm.set_mode(MeasurementMode::VoltageDc).unwrap();
//! println!("{}", dmm.measure_voltage().unwrap());
//! ```

#![deny(warnings, missing_docs)]

use std::{str::FromStr, thread, time::Duration};

use equipmentrs::{
    InstrumentError, InstrumentInterface, ScpiResource, parse_bool, parse_f64, parse_int,
    parse_list,
};
use measurements::{Current, Frequency, Resistance, Voltage};
use tracing::warn;

const VOLTAGE_RANGES: [f64; 5] = [0.1, 1.0, 10.0, 100.0, 300.0];
const CURRENT_RANGES: [f64; 4] = [0.01, 0.1, 1.0, 3.0];
const RESISTANCE_RANGES: [f64; 7] = [100.0, 1e3, 10e3, 100e3, 1e6, 10e6, 100e6];
const VALID_NPLC: [f64; 8] = [0.02, 0.2, 1.0, 2.0, 10.0, 20.0, 100.0, 200.0];
const MAX_TRIGGER_COUNT: u32 = 50_000;

/// Measurement modes of the multimeter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementMode {
    /// DC voltage.
    VoltageDc,
    /// AC voltage (RMS).
    VoltageAc,
    /// DC current.
    CurrentDc,
    /// AC current (RMS).
    CurrentAc,
    /// Frequency.
    Frequency,
    /// Period.
    Period,
    /// Two wire resistance.
    Resistance,
    /// Four wire resistance.
    FourWireResistance,
    /// Diode test.
    Diode,
    /// Continuity test.
    Continuity,
}

impl MeasurementMode {
    /// The function as used in `CONF`, `MEAS` and `SENS` commands.
    pub fn as_scpi(&self) -> &'static str {
        match self {
            MeasurementMode::VoltageDc => "VOLT:DC",
            MeasurementMode::VoltageAc => "VOLT:AC",
            MeasurementMode::CurrentDc => "CURR:DC",
            MeasurementMode::CurrentAc => "CURR:AC",
            MeasurementMode::Frequency => "FREQ",
            MeasurementMode::Period => "PER",
            MeasurementMode::Resistance => "RES",
            MeasurementMode::FourWireResistance => "FRES",
            MeasurementMode::Diode => "DIOD",
            MeasurementMode::Continuity => "CONT",
        }
    }

    fn ranges(&self) -> Option<&'static [f64]> {
        match self {
            MeasurementMode::VoltageDc
            | MeasurementMode::VoltageAc
            | MeasurementMode::Frequency
            | MeasurementMode::Period => Some(&VOLTAGE_RANGES),
            MeasurementMode::CurrentDc | MeasurementMode::CurrentAc => Some(&CURRENT_RANGES),
            MeasurementMode::Resistance | MeasurementMode::FourWireResistance => {
                Some(&RESISTANCE_RANGES)
            }
            MeasurementMode::Diode | MeasurementMode::Continuity => None,
        }
    }

    fn has_integration_time(&self) -> bool {
        !matches!(
            self,
            MeasurementMode::Frequency
                | MeasurementMode::Period
                | MeasurementMode::Diode
                | MeasurementMode::Continuity
        )
    }
}

impl FromStr for MeasurementMode {
    type Err = InstrumentError;

    /// Parse a mode from a `FUNC?` response or from one of the short names, e.g., `"VDC"`,
    /// `"AAC"`, `"OHMS"`, case insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().trim_matches('"').to_ascii_uppercase();
        let mode = match upper.as_str() {
            "VOLT" | "VOLT:DC" | "VDC" | "V" => MeasurementMode::VoltageDc,
            "VOLT:AC" | "VAC" => MeasurementMode::VoltageAc,
            "CURR" | "CURR:DC" | "ADC" | "A" => MeasurementMode::CurrentDc,
            "CURR:AC" | "AAC" => MeasurementMode::CurrentAc,
            "FREQ" | "F" => MeasurementMode::Frequency,
            "PER" | "P" => MeasurementMode::Period,
            "RES" | "OHMS" | "O" => MeasurementMode::Resistance,
            "FRES" => MeasurementMode::FourWireResistance,
            "DIOD" | "D" => MeasurementMode::Diode,
            "CONT" => MeasurementMode::Continuity,
            _ => {
                return Err(InstrumentError::InvalidArgument(format!(
                    "Invalid measurement mode: {s}"
                )));
            }
        };
        Ok(mode)
    }
}

/// Trigger sources of the multimeter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerSource {
    /// Software trigger through `*TRG`.
    Bus,
    /// Trigger immediately.
    Immediate,
    /// Rear panel trigger input.
    External,
}

impl TriggerSource {
    fn as_scpi(&self) -> &'static str {
        match self {
            TriggerSource::Bus => "BUS",
            TriggerSource::Immediate => "IMMediate",
            TriggerSource::External => "EXTernal",
        }
    }
}

impl FromStr for TriggerSource {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUS" => Ok(TriggerSource::Bus),
            "IMM" | "IMMEDIATE" => Ok(TriggerSource::Immediate),
            "EXT" | "EXTERNAL" => Ok(TriggerSource::External),
            _ => Err(InstrumentError::InvalidArgument(format!(
                "Invalid trigger source: {s}"
            ))),
        }
    }
}

/// Number of readings taken per trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerCount {
    /// Fixed number of triggers, between 1 and 50000.
    Count(u32),
    /// Accept triggers until aborted.
    Infinite,
}

/// Settings that the multimeter driver keeps locally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterSettings {
    /// Multiplicative factor for voltage and current readings.
    pub factor: f64,
    /// Frequency of the power line in Hz, used to estimate the measurement time.
    pub line_frequency: f64,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            factor: 1.0,
            line_frequency: 50.0,
        }
    }
}

/// Full configuration of a measurement, see [`Hp34401a::config`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasurementConfig {
    /// Measurement mode.
    pub mode: MeasurementMode,
    /// Range of the measurement, `None` selects autorange. Ranges that the meter does not have
    /// for this mode are replaced with the maximum range.
    pub range: Option<f64>,
    /// Resolution in units of the measurement. Takes precedence over `nplc`.
    pub resolution: Option<f64>,
    /// Integration time in power line cycles.
    pub nplc: f64,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            mode: MeasurementMode::VoltageDc,
            range: None,
            resolution: None,
            nplc: 0.02,
        }
    }
}

/// A rust driver for the HP 34401A multimeter.
pub struct Hp34401a<T: InstrumentInterface> {
    resource: ScpiResource<T>,
    settings: MeterSettings,
    sample_count: u32,
    trigger_source: TriggerSource,
    measure_time: Duration,
}

impl<T: InstrumentInterface> Hp34401a<T> {
    /// Connect to the multimeter with the default [`MeterSettings`].
    pub fn try_new(interface: T, address: &str) -> Result<Self, InstrumentError> {
        Self::try_new_with(interface, address, MeterSettings::default())
    }

    /// Connect to the multimeter.
    ///
    /// The sample count and trigger source are read from the meter on connection.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address of the multimeter.
    /// * `settings` - Scaling factor and line frequency.
    pub fn try_new_with(
        interface: T,
        address: &str,
        settings: MeterSettings,
    ) -> Result<Self, InstrumentError> {
        if settings.line_frequency <= 0.0 {
            return Err(InstrumentError::InvalidArgument(format!(
                "Line frequency must be positive, got {}",
                settings.line_frequency
            )));
        }
        let mut inst = Self {
            resource: ScpiResource::connect(interface, address)?,
            settings,
            sample_count: 1,
            trigger_source: TriggerSource::Immediate,
            measure_time: Duration::ZERO,
        };
        inst.get_sample_count()?;
        inst.get_trigger_source()?;
        Ok(inst)
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

    /// The multiplicative factor applied to voltage and current readings.
    pub fn factor(&self) -> f64 {
        self.settings.factor
    }

    /// Set the multiplicative factor applied to voltage and current readings.
    pub fn set_factor(&mut self, factor: f64) {
        self.settings.factor = factor;
    }

    /// Configure the meter for the given measurement mode with default settings.
    pub fn set_mode(&mut self, mode: MeasurementMode) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("CONF:{}", mode.as_scpi()))
    }

    /// Get the measurement mode the meter is configured for.
    pub fn get_mode(&mut self) -> Result<MeasurementMode, InstrumentError> {
        let resp = self.resource.query_resource("FUNC?")?;
        resp.parse()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Measure a DC voltage.
    pub fn measure_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let val = self.measure_checked(MeasurementMode::VoltageDc, "voltage")?;
        Ok(Voltage::from_volts(self.settings.factor * val))
    }

    /// Measure an AC voltage (RMS).
    pub fn measure_voltage_rms(&mut self) -> Result<Voltage, InstrumentError> {
        let val = self.measure_checked(MeasurementMode::VoltageAc, "AC voltage")?;
        Ok(Voltage::from_volts(self.settings.factor * val))
    }

    /// Measure a DC current.
    pub fn measure_current(&mut self) -> Result<Current, InstrumentError> {
        let val = self.measure_checked(MeasurementMode::CurrentDc, "current")?;
        Ok(Current::from_amperes(self.settings.factor * val))
    }

    /// Measure an AC current (RMS).
    pub fn measure_current_rms(&mut self) -> Result<Current, InstrumentError> {
        let val = self.measure_checked(MeasurementMode::CurrentAc, "AC current")?;
        Ok(Current::from_amperes(self.settings.factor * val))
    }

    /// Measure a two wire resistance.
    pub fn measure_resistance(&mut self) -> Result<Resistance, InstrumentError> {
        let val = self.measure_checked(MeasurementMode::Resistance, "resistance")?;
        Ok(Resistance::from_ohms(val))
    }

    /// Measure a frequency.
    pub fn measure_frequency(&mut self) -> Result<Frequency, InstrumentError> {
        let val = self.measure_checked(MeasurementMode::Frequency, "frequency")?;
        Ok(Frequency::from_hertz(val))
    }

    /// Arm the meter (`INITiate`), typically followed by a bus trigger and [`Self::fetch_data`].
    pub fn init(&mut self) -> Result<(), InstrumentError> {
        self.resource.write_resource("INITiate")
    }

    /// Fetch all readings from the memory of the meter, scaled by the factor.
    pub fn fetch_data(&mut self) -> Result<Vec<f64>, InstrumentError> {
        let resp = self.resource.query_resource("FETC?")?;
        Ok(parse_list::<f64>(&resp)?
            .into_iter()
            .map(|v| v * self.settings.factor)
            .collect())
    }

    /// Abort a measurement in progress.
    pub fn abort(&mut self) -> Result<(), InstrumentError> {
        self.resource.write_resource("ABORt")
    }

    /// Send a bus trigger.
    ///
    /// The trigger is only sent if the trigger source is [`TriggerSource::Bus`], otherwise a
    /// warning is logged. With `wait`, the call blocks for the estimated measurement time.
    pub fn trigger(&mut self, wait: bool) -> Result<(), InstrumentError> {
        if self.trigger_source == TriggerSource::Bus {
            self.resource.write_resource("*TRG")?;
        } else {
            warn!(
                address = self.resource.address(),
                source = ?self.trigger_source,
                "Trigger not sent, trigger source is not BUS"
            );
        }
        if wait {
            thread::sleep(self.measure_time);
        }
        Ok(())
    }

    /// Set the number of samples taken per trigger.
    pub fn set_sample_count(&mut self, count: u32) -> Result<(), InstrumentError> {
        self.resource.write_resource(&format!("SAMP:COUN {count}"))?;
        self.sample_count = count;
        self.update_measure_time();
        Ok(())
    }

    /// Get the number of samples taken per trigger.
    pub fn get_sample_count(&mut self) -> Result<u32, InstrumentError> {
        let resp = self.resource.query_resource("SAMP:COUN?")?;
        let count = parse_int(&resp)?;
        self.sample_count =
            u32::try_from(count).map_err(|_| InstrumentError::ResponseParseError(resp))?;
        self.update_measure_time();
        Ok(self.sample_count)
    }

    /// Estimated time for one triggered measurement.
    pub fn measure_time(&self) -> Duration {
        self.measure_time
    }

    /// Override the estimated measurement time, `None` recomputes it from the sample count.
    pub fn set_measure_time(&mut self, measure_time: Option<Duration>) {
        match measure_time {
            Some(t) => self.measure_time = t,
            None => self.update_measure_time(),
        }
    }

    /// Configure source, and optionally delay and count, of the trigger.
    pub fn set_trigger(
        &mut self,
        source: TriggerSource,
        delay: Option<Duration>,
        count: Option<TriggerCount>,
    ) -> Result<(), InstrumentError> {
        if let Some(delay) = delay {
            self.set_trigger_delay(delay)?;
        }
        if let Some(count) = count {
            self.set_trigger_count(count)?;
        }
        self.set_trigger_source(source)
    }

    /// Set the trigger source.
    pub fn set_trigger_source(&mut self, source: TriggerSource) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("TRIG:SOUR {}", source.as_scpi()))?;
        self.trigger_source = source;
        Ok(())
    }

    /// Get the trigger source.
    pub fn get_trigger_source(&mut self) -> Result<TriggerSource, InstrumentError> {
        let resp = self.resource.query_resource("TRIG:SOUR?")?;
        self.trigger_source = resp
            .parse()
            .map_err(|_| InstrumentError::ResponseParseError(resp))?;
        Ok(self.trigger_source)
    }

    /// Set the delay between trigger and measurement.
    pub fn set_trigger_delay(&mut self, delay: Duration) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("TRIG:DELay {}", delay.as_secs_f64()))
    }

    /// Get the delay between trigger and measurement.
    pub fn get_trigger_delay(&mut self) -> Result<Duration, InstrumentError> {
        let resp = self.resource.query_resource("TRIG:DEL?")?;
        Duration::try_from_secs_f64(parse_f64(&resp)?)
            .map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Set the number of triggers accepted before returning to idle.
    pub fn set_trigger_count(&mut self, count: TriggerCount) -> Result<(), InstrumentError> {
        match count {
            TriggerCount::Count(n) => {
                if !(1..=MAX_TRIGGER_COUNT).contains(&n) {
                    return Err(InstrumentError::IntValueOutOfRange {
                        value: n as i64,
                        min: 1,
                        max: MAX_TRIGGER_COUNT as i64,
                    });
                }
                self.resource.write_resource(&format!("TRIG:COUNt {n}"))
            }
            TriggerCount::Infinite => self.resource.write_resource("TRIG:COUNt INF"),
        }
    }

    /// Get the number of triggers accepted before returning to idle.
    pub fn get_trigger_count(&mut self) -> Result<TriggerCount, InstrumentError> {
        let resp = self.resource.query_resource("TRIG:COUN?")?;
        let val = parse_f64(&resp)?;
        if val > MAX_TRIGGER_COUNT as f64 {
            Ok(TriggerCount::Infinite)
        } else {
            Ok(TriggerCount::Count(val as u32))
        }
    }

    /// Configure a measurement in one go.
    ///
    /// Sends `CONF:<mode> [<range>[,<resolution>]]`. If range and resolution are not both given,
    /// the resolution, or else the integration time, is set with a separate `SENS` command.
    pub fn config(&mut self, config: &MeasurementConfig) -> Result<(), InstrumentError> {
        if !VALID_NPLC.contains(&config.nplc) {
            return Err(InstrumentError::InvalidArgument(format!(
                "Invalid nplc {}, valid values are {VALID_NPLC:?}",
                config.nplc
            )));
        }
        let mode = config.mode.as_scpi();
        let range = match (config.range, config.mode.ranges()) {
            (Some(r), Some(valid)) if valid.contains(&r) => Some(r.to_string()),
            (Some(r), _) => {
                warn!(range = r, mode, "Range not available, using MAX");
                Some("MAX".to_string())
            }
            (None, _) => None,
        };

        let mut cmds = Vec::new();
        match (&range, config.resolution) {
            (Some(range), Some(res)) => cmds.push(format!("CONF:{mode} {range},{res}")),
            _ => {
                match &range {
                    Some(range) => cmds.push(format!("CONF:{mode} {range}")),
                    None => cmds.push(format!("CONF:{mode}")),
                }
                if config.mode.has_integration_time() {
                    match config.resolution {
                        Some(res) => cmds.push(format!("SENS:{mode}:RES {res}")),
                        None => cmds.push(format!("SENS:{mode}:NPLC {}", config.nplc)),
                    }
                }
            }
        }
        for cmd in cmds {
            self.resource.write_resource(&cmd)?;
        }
        Ok(())
    }

    /// Pop the oldest entry of the error queue, `None` if the queue is empty.
    pub fn pop_error_queue(&mut self) -> Result<Option<String>, InstrumentError> {
        self.resource.pop_error_queue()
    }

    /// Return the meter to local control.
    ///
    /// Over GPIB this is done through the interface, otherwise with `SYSTem:LOCal`.
    pub fn set_local(&mut self) -> Result<(), InstrumentError> {
        if self.resource.address().to_uppercase().contains("GPIB") {
            self.resource.set_local()
        } else {
            self.resource.write_resource("SYSTem:LOCal")
        }
    }

    fn measure_checked(
        &mut self,
        mode: MeasurementMode,
        name: &str,
    ) -> Result<f64, InstrumentError> {
        if self.get_mode()? != mode {
            return Err(InstrumentError::InstrumentStatus(format!(
                "Multimeter is not configured to measure {name}"
            )));
        }
        let func = mode.as_scpi();
        let range = self.resource.query_resource(&format!("SENS:{func}:RANG?"))?;
        let autorange = parse_bool(
            &self
                .resource
                .query_resource(&format!("SENS:{func}:RANG:AUTO?"))?,
        )?;
        let cmd = if autorange {
            format!("MEAS:{func}?")
        } else {
            format!("MEAS:{func}? {range}")
        };
        parse_f64(&self.resource.query_resource(&cmd)?)
    }

    fn update_measure_time(&mut self) {
        let secs = self.sample_count as f64 / self.settings.line_frequency + 0.01;
        self.measure_time = Duration::from_secs_f64(secs);
    }
}

impl<T: InstrumentInterface> Clone for Hp34401a<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            settings: self.settings,
            sample_count: self.sample_count,
            trigger_source: self.trigger_source,
            measure_time: self.measure_time,
        }
    }
}
