//! Tests for the HP 34401A multimeter driver.

use std::time::Duration;

use rstest::*;

use equipmentrs::{InstrumentError, LoopbackInterfaceString};

use hp_34401a::*;

const IDN: &str = "HEWLETT-PACKARD,34401A,0,11-5-2";

type DmmLbk = Hp34401a<LoopbackInterfaceString>;

/// Create a new multimeter on the given address with the given settings.
///
/// The queries sent when connecting are prepended, the meter reports a sample count of 1 and the
/// given trigger source.
fn crt_full(
    address: &str,
    settings: MeterSettings,
    trig_src: &str,
    host2inst: Vec<&str>,
    inst2host: Vec<&str>,
) -> DmmLbk {
    let mut h2i = vec!["*IDN?", "SAMP:COUN?", "TRIG:SOUR?"];
    h2i.extend(host2inst);
    let mut i2h = vec![IDN, "+1.00000000E+00", trig_src];
    i2h.extend(inst2host);
    let interface = LoopbackInterfaceString::from_strs(&h2i, &i2h, "\n");
    Hp34401a::try_new_with(interface, address, settings).unwrap()
}

/// Create a new multimeter with default settings and immediate triggering.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> DmmLbk {
    crt_full(
        "ASRL/dev/ttyUSB0::INSTR",
        MeterSettings::default(),
        "IMM",
        host2inst,
        inst2host,
    )
}

#[fixture]
fn emp_inst() -> DmmLbk {
    crt_inst(vec![], vec![])
}

#[rstest]
fn test_initialization(emp_inst: DmmLbk) {
    assert_eq!(emp_inst.get_name(), IDN);
    assert_eq!(emp_inst.factor(), 1.0);
    // one sample at 50 Hz plus 10 ms
    assert_eq!(emp_inst.measure_time(), Duration::from_millis(30));
}

#[rstest]
fn test_invalid_line_frequency() {
    let interface = LoopbackInterfaceString::from_strs(&[], &[], "\n");
    let settings = MeterSettings {
        factor: 1.0,
        line_frequency: 0.0,
    };
    assert!(matches!(
        Hp34401a::try_new_with(interface, "GPIB0::22::INSTR", settings),
        Err(InstrumentError::InvalidArgument(_))
    ));
}

#[rstest]
#[case(MeasurementMode::VoltageDc, "CONF:VOLT:DC")]
#[case(MeasurementMode::VoltageAc, "CONF:VOLT:AC")]
#[case(MeasurementMode::CurrentDc, "CONF:CURR:DC")]
#[case(MeasurementMode::CurrentAc, "CONF:CURR:AC")]
#[case(MeasurementMode::Frequency, "CONF:FREQ")]
#[case(MeasurementMode::Period, "CONF:PER")]
#[case(MeasurementMode::Resistance, "CONF:RES")]
#[case(MeasurementMode::FourWireResistance, "CONF:FRES")]
#[case(MeasurementMode::Diode, "CONF:DIOD")]
#[case(MeasurementMode::Continuity, "CONF:CONT")]
fn test_set_mode(#[case] mode: MeasurementMode, #[case] cmd: &str) {
    let mut inst = crt_inst(vec![cmd], vec![]);
    inst.set_mode(mode).unwrap();
}

#[rstest]
#[case("\"VOLT\"", MeasurementMode::VoltageDc)]
#[case("\"VOLT:AC\"", MeasurementMode::VoltageAc)]
#[case("\"CURR\"", MeasurementMode::CurrentDc)]
#[case("\"CURR:AC\"", MeasurementMode::CurrentAc)]
#[case("\"FREQ\"", MeasurementMode::Frequency)]
#[case("\"RES\"", MeasurementMode::Resistance)]
#[case("\"FRES\"", MeasurementMode::FourWireResistance)]
fn test_get_mode(#[case] resp: &str, #[case] mode: MeasurementMode) {
    let mut inst = crt_inst(vec!["FUNC?"], vec![resp]);
    assert_eq!(inst.get_mode().unwrap(), mode);
}

#[rstest]
#[case("vdc", MeasurementMode::VoltageDc)]
#[case("AAC", MeasurementMode::CurrentAc)]
#[case("ohms", MeasurementMode::Resistance)]
#[case("P", MeasurementMode::Period)]
fn test_mode_from_short_name(#[case] name: &str, #[case] mode: MeasurementMode) {
    assert_eq!(name.parse::<MeasurementMode>().unwrap(), mode);
}

#[rstest]
fn test_mode_from_invalid_name() {
    assert!("XYZ".parse::<MeasurementMode>().is_err());
}

/// With autorange on, the range is not sent along with the measurement.
#[rstest]
fn test_measure_voltage_autorange() {
    let mut inst = crt_full(
        "ASRL/dev/ttyUSB0::INSTR",
        MeterSettings {
            factor: 2.0,
            line_frequency: 50.0,
        },
        "IMM",
        vec![
            "FUNC?",
            "SENS:VOLT:DC:RANG?",
            "SENS:VOLT:DC:RANG:AUTO?",
            "MEAS:VOLT:DC?",
        ],
        vec!["\"VOLT\"", "+1.00000000E+01", "1", "+1.25000000E+00"],
    );
    assert_eq!(inst.measure_voltage().unwrap().as_volts(), 2.5);
}

/// With a fixed range, the measurement keeps that range.
#[rstest]
fn test_measure_current_fixed_range() {
    let mut inst = crt_inst(
        vec![
            "FUNC?",
            "SENS:CURR:DC:RANG?",
            "SENS:CURR:DC:RANG:AUTO?",
            "MEAS:CURR:DC? +1.00000000E-01",
        ],
        vec!["\"CURR\"", "+1.00000000E-01", "0", "+5.00000000E-02"],
    );
    assert_eq!(inst.measure_current().unwrap().as_amperes(), 0.05);
}

/// Resistance readings are not scaled with the factor.
#[rstest]
fn test_measure_resistance_unscaled() {
    let mut inst = crt_full(
        "ASRL/dev/ttyUSB0::INSTR",
        MeterSettings {
            factor: 10.0,
            line_frequency: 60.0,
        },
        "IMM",
        vec![
            "FUNC?",
            "SENS:RES:RANG?",
            "SENS:RES:RANG:AUTO?",
            "MEAS:RES?",
        ],
        vec!["\"RES\"", "+1.00000000E+03", "1", "+4.70000000E+02"],
    );
    assert_eq!(inst.measure_resistance().unwrap().as_ohms(), 470.0);
}

#[rstest]
fn test_measure_frequency() {
    let mut inst = crt_inst(
        vec![
            "FUNC?",
            "SENS:FREQ:RANG?",
            "SENS:FREQ:RANG:AUTO?",
            "MEAS:FREQ?",
        ],
        vec!["\"FREQ\"", "+1.00000000E+01", "1", "+5.00000000E+01"],
    );
    assert_eq!(inst.measure_frequency().unwrap().as_hertz(), 50.0);
}

/// Measuring in the wrong mode fails before a measurement is taken.
#[rstest]
fn test_measure_wrong_mode() {
    let mut inst = crt_inst(vec!["FUNC?", "FUNC?"], vec!["\"VOLT:AC\"", "\"VOLT\""]);
    assert!(matches!(
        inst.measure_voltage(),
        Err(InstrumentError::InstrumentStatus(_))
    ));
    assert!(inst.measure_current_rms().is_err());
}

#[rstest]
fn test_init_fetch_abort() {
    let mut inst = crt_full(
        "ASRL/dev/ttyUSB0::INSTR",
        MeterSettings {
            factor: 2.0,
            line_frequency: 50.0,
        },
        "IMM",
        vec!["INITiate", "FETC?", "FETC?", "ABORt"],
        vec!["+1.0E+00,+2.0E+00,+3.0E+00", "+4.0E+00"],
    );
    inst.init().unwrap();
    assert_eq!(inst.fetch_data().unwrap(), vec![2.0, 4.0, 6.0]);
    assert_eq!(inst.fetch_data().unwrap(), vec![8.0]);
    inst.abort().unwrap();
}

#[rstest]
fn test_trigger_bus() {
    let mut inst = crt_full(
        "ASRL/dev/ttyUSB0::INSTR",
        MeterSettings::default(),
        "BUS",
        vec!["*TRG"],
        vec![],
    );
    inst.trigger(false).unwrap();
}

/// With any other trigger source no trigger is sent.
#[rstest]
fn test_trigger_not_bus(mut emp_inst: DmmLbk) {
    emp_inst.trigger(false).unwrap();
}

/// Changing the trigger source locally changes whether a bus trigger is sent.
#[rstest]
fn test_set_trigger() {
    let mut inst = crt_inst(
        vec!["TRIG:DELay 0.5", "TRIG:COUNt 10", "TRIG:SOUR BUS", "*TRG"],
        vec![],
    );
    inst.set_trigger(
        TriggerSource::Bus,
        Some(Duration::from_millis(500)),
        Some(TriggerCount::Count(10)),
    )
    .unwrap();
    inst.trigger(false).unwrap();
}

#[rstest]
fn test_trigger_source_parse_errors() {
    assert!(matches!(
        "manual".parse::<TriggerSource>(),
        Err(InstrumentError::InvalidArgument(_))
    ));

    let mut inst = crt_inst(vec!["TRIG:SOUR?"], vec!["HOLD"]);
    assert!(matches!(
        inst.get_trigger_source(),
        Err(InstrumentError::ResponseParseError(_))
    ));
}

#[rstest]
#[case(TriggerSource::Immediate, "TRIG:SOUR IMMediate")]
#[case(TriggerSource::External, "TRIG:SOUR EXTernal")]
fn test_set_trigger_source(#[case] source: TriggerSource, #[case] cmd: &str) {
    let mut inst = crt_inst(vec![cmd], vec![]);
    inst.set_trigger_source(source).unwrap();
}

#[rstest]
fn test_trigger_count() {
    let mut inst = crt_inst(
        vec!["TRIG:COUNt INF", "TRIG:COUN?", "TRIG:COUN?"],
        vec!["+9.90000000E+37", "+5.00000000E+00"],
    );
    inst.set_trigger_count(TriggerCount::Infinite).unwrap();
    assert_eq!(inst.get_trigger_count().unwrap(), TriggerCount::Infinite);
    assert_eq!(inst.get_trigger_count().unwrap(), TriggerCount::Count(5));
}

#[rstest]
#[case(0)]
#[case(50_001)]
fn test_trigger_count_out_of_range(mut emp_inst: DmmLbk, #[case] count: u32) {
    assert!(matches!(
        emp_inst.set_trigger_count(TriggerCount::Count(count)),
        Err(InstrumentError::IntValueOutOfRange { .. })
    ));
}

#[rstest]
fn test_trigger_delay() {
    let mut inst = crt_inst(vec!["TRIG:DEL?"], vec!["+2.50000000E-01"]);
    assert_eq!(inst.get_trigger_delay().unwrap(), Duration::from_millis(250));
}

/// The measurement time follows the sample count.
#[rstest]
fn test_sample_count() {
    let mut inst = crt_inst(vec!["SAMP:COUN 5", "SAMP:COUN?"], vec!["+5.00000000E+00"]);
    inst.set_sample_count(5).unwrap();
    assert_eq!(inst.measure_time(), Duration::from_millis(110));
    assert_eq!(inst.get_sample_count().unwrap(), 5);
    inst.set_measure_time(Some(Duration::from_secs(1)));
    assert_eq!(inst.measure_time(), Duration::from_secs(1));
    inst.set_measure_time(None);
    assert_eq!(inst.measure_time(), Duration::from_millis(110));
}

#[rstest]
#[case(
    MeasurementConfig::default(),
    vec!["CONF:VOLT:DC", "SENS:VOLT:DC:NPLC 0.02"]
)]
#[case(
    MeasurementConfig { mode: MeasurementMode::VoltageAc, range: Some(10.0), resolution: None, nplc: 10.0 },
    vec!["CONF:VOLT:AC 10", "SENS:VOLT:AC:NPLC 10"]
)]
#[case(
    MeasurementConfig { mode: MeasurementMode::CurrentDc, range: Some(1.0), resolution: Some(0.0001), nplc: 1.0 },
    vec!["CONF:CURR:DC 1,0.0001"]
)]
#[case(
    MeasurementConfig { mode: MeasurementMode::CurrentDc, range: None, resolution: Some(0.0001), nplc: 1.0 },
    vec!["CONF:CURR:DC", "SENS:CURR:DC:RES 0.0001"]
)]
#[case(
    MeasurementConfig { mode: MeasurementMode::CurrentDc, range: Some(10.0), resolution: None, nplc: 1.0 },
    vec!["CONF:CURR:DC MAX", "SENS:CURR:DC:NPLC 1"]
)]
#[case(
    MeasurementConfig { mode: MeasurementMode::Resistance, range: Some(1e3), resolution: None, nplc: 100.0 },
    vec!["CONF:RES 1000", "SENS:RES:NPLC 100"]
)]
#[case(
    MeasurementConfig { mode: MeasurementMode::Frequency, range: None, resolution: None, nplc: 1.0 },
    vec!["CONF:FREQ"]
)]
fn test_config(#[case] config: MeasurementConfig, #[case] cmds: Vec<&str>) {
    let mut inst = crt_inst(cmds, vec![]);
    inst.config(&config).unwrap();
}

#[rstest]
fn test_config_invalid_nplc(mut emp_inst: DmmLbk) {
    let config = MeasurementConfig {
        nplc: 5.0,
        ..Default::default()
    };
    assert!(matches!(
        emp_inst.config(&config),
        Err(InstrumentError::InvalidArgument(_))
    ));
}

#[rstest]
fn test_set_local_serial() {
    let mut inst = crt_inst(vec!["SYSTem:LOCal"], vec![]);
    inst.set_local().unwrap();
}

/// Over GPIB the interface returns the meter to local, the loopback accepts this silently.
#[rstest]
fn test_set_local_gpib() {
    let mut inst = crt_full(
        "GPIB0::22::INSTR",
        MeterSettings::default(),
        "IMM",
        vec![],
        vec![],
    );
    inst.set_local().unwrap();
}

#[rstest]
fn test_error_queue() {
    let mut inst = crt_inst(vec!["SYST:ERR?"], vec!["-113,\"Undefined header\""]);
    assert_eq!(
        inst.pop_error_queue().unwrap(),
        Some("-113,\"Undefined header\"".to_string())
    );
}

/// Ensure cloning an instrument works correctly.
#[rstest]
fn test_cloning(emp_inst: DmmLbk) {
    assert_eq!(emp_inst.clone().measure_time(), emp_inst.measure_time());
}
