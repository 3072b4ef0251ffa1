//! Tests for the Tektronix DPO4xxx oscilloscope driver.

use measurements::{Frequency, Voltage};
use rstest::*;

use equipmentrs::{InstrumentError, LoopbackInterfaceString};

use tektronix_dpo4xxx::*;

const IDN: &str = "TEKTRONIX,DPO4104,C010101,CF:91.1CT FV:v2.15";

type ScopeLbk = Dpo4xxx<LoopbackInterfaceString>;

/// Create a new scope. The `*IDN?` query sent when connecting is prepended.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> ScopeLbk {
    let mut h2i = vec!["*IDN?"];
    h2i.extend(host2inst);
    let mut i2h = vec![IDN];
    i2h.extend(inst2host);
    let interface = LoopbackInterfaceString::from_strs(&h2i, &i2h, "\n");
    Dpo4xxx::try_new(interface, "TCPIP0::10.0.0.20::4000::SOCKET").unwrap()
}

#[fixture]
fn emp_inst() -> ScopeLbk {
    crt_inst(vec![], vec![])
}

#[rstest]
fn test_get_name(emp_inst: ScopeLbk) {
    assert_eq!(emp_inst.get_name(), IDN);
}

#[rstest]
fn test_channel_out_of_range(mut emp_inst: ScopeLbk) {
    assert!(emp_inst.get_channel(4).is_err());
}

#[rstest]
#[case(0, true, "SEL:CH1 ON")]
#[case(3, false, "SEL:CH4 OFF")]
fn test_select(#[case] idx: usize, #[case] state: bool, #[case] cmd: &str) {
    let mut inst = crt_inst(vec![cmd], vec![]);
    inst.get_channel(idx).unwrap().select(state).unwrap();
}

#[rstest]
fn test_channel_vertical() {
    let mut inst = crt_inst(
        vec![
            "CH2:LAB \"V_out\"",
            "CH2:LAB?",
            "CH2:BAN 20000000",
            "CH2:BAN?",
            "CH2:SCA 0.5",
            "CH2:SCA?",
            "CH2:OFFS 1.2",
            "CH2:OFFS?",
            "CH2:POS -2",
            "CH2:POS?",
        ],
        vec!["\"V_out\"", "2.0000E+07", "500.0000E-03", "1.2000", "-2.0000"],
    );
    let mut ch = inst.get_channel(1).unwrap();
    ch.set_label("V_out").unwrap();
    assert_eq!(ch.get_label().unwrap(), "V_out");
    ch.set_bandwidth(Frequency::from_hertz(20e6)).unwrap();
    assert_eq!(ch.get_bandwidth().unwrap().as_hertz(), 20e6);
    ch.set_scale(0.5).unwrap();
    assert_eq!(ch.get_scale().unwrap(), 0.5);
    ch.set_offset(1.2).unwrap();
    assert_eq!(ch.get_offset().unwrap(), 1.2);
    ch.set_position(-2.0).unwrap();
    assert_eq!(ch.get_position().unwrap(), -2.0);
}

#[rstest]
fn test_trigger_buttons() {
    let mut inst = crt_inst(
        vec!["FPANEL:PRESS RUnstop", "TRIG FORC", "FPANEL:PRESS SING"],
        vec![],
    );
    inst.trigger_run_stop().unwrap();
    inst.trigger_force().unwrap();
    inst.trigger_single().unwrap();
}

#[rstest]
fn test_trigger_position() {
    let mut inst = crt_inst(vec!["HOR:POS 25", "HOR:POS?"], vec!["25.0000"]);
    inst.set_trigger_position(25.0).unwrap();
    assert_eq!(inst.get_trigger_position().unwrap(), 25.0);
}

#[rstest]
#[case(-0.5)]
#[case(100.5)]
fn test_trigger_position_out_of_range(mut emp_inst: ScopeLbk, #[case] pos: f64) {
    assert!(matches!(
        emp_inst.set_trigger_position(pos),
        Err(InstrumentError::FloatValueOutOfRange { .. })
    ));
}

#[rstest]
fn test_trigger_mode_level() {
    let mut inst = crt_inst(
        vec![
            "TRIG:A:MOD NORM",
            "TRIG:A:MOD?",
            "TRIG:A:MOD?",
            "TRIG:A:LEV 1.5",
            "TRIG:A:LEV?",
        ],
        vec!["NORMAL", "AUTO", "1.5000"],
    );
    inst.set_trigger_mode(TriggerMode::Normal).unwrap();
    assert_eq!(inst.get_trigger_mode().unwrap(), TriggerMode::Normal);
    assert_eq!(inst.get_trigger_mode().unwrap(), TriggerMode::Auto);
    inst.set_trigger_level(Voltage::from_volts(1.5)).unwrap();
    assert_eq!(inst.get_trigger_level().unwrap().as_volts(), 1.5);
}

#[rstest]
fn test_horizontal() {
    let mut inst = crt_inst(
        vec!["HOR:RECO 10000", "HOR:RECO?", "HOR:SCA 0.001", "HOR:SCA?"],
        vec!["10000", "1.0000E-03"],
    );
    inst.set_record_length(10000).unwrap();
    assert_eq!(inst.get_record_length().unwrap(), 10000);
    inst.set_horizontal_scale(0.001).unwrap();
    assert_eq!(inst.get_horizontal_scale().unwrap(), 0.001);
}

#[rstest]
fn test_zoom() {
    let mut inst = crt_inst(
        vec![
            "ZOO:MODE ON",
            "ZOO:MODE?",
            "ZOO:ZOOM:POS 50",
            "ZOO:ZOOM:POS?",
            "ZOO:ZOOM:SCA 0.0001",
            "ZOO:ZOOM:SCA?",
        ],
        vec!["1", "50.0000", "100.0000E-06"],
    );
    inst.set_zoom_mode(true).unwrap();
    assert!(inst.get_zoom_mode().unwrap());
    inst.set_zoom_position(50.0).unwrap();
    assert_eq!(inst.get_zoom_position().unwrap(), 50.0);
    inst.set_zoom_scale(0.0001).unwrap();
    assert_eq!(inst.get_zoom_scale().unwrap(), 0.0001);
}

#[rstest]
fn test_configure_measurement() {
    let mut inst = crt_inst(
        vec![
            "MEASU:MEAS1:TYP FREQuency",
            "MEASU:MEAS1:SOU1 CH1",
            "MEASU:IMM:TYP PHAse",
            "MEASU:IMM:SOU1 CH1",
            "MEASU:IMM:SOU2 CH3",
        ],
        vec![],
    );
    inst.configure_measurement(1, MeasurementType::Frequency, 0, Some(1))
        .unwrap();
    inst.configure_measurement(0, MeasurementType::Phase, 0, Some(2))
        .unwrap();
}

#[rstest]
fn test_configure_measurement_missing_source(mut emp_inst: ScopeLbk) {
    assert!(matches!(
        emp_inst.configure_measurement(2, MeasurementType::Delay, 0, None),
        Err(InstrumentError::InvalidArgument(_))
    ));
    assert!(matches!(
        emp_inst.configure_measurement(2, MeasurementType::Rms, 5, None),
        Err(InstrumentError::ChannelIndexOutOfRange { .. })
    ));
}

/// Unassigned slots report a value that is returned as NaN.
#[rstest]
fn test_get_measure_data() {
    let mut inst = crt_inst(
        vec!["MEASU:IMM:VAL?", "MEASU:MEAS3:VAL?"],
        vec!["1.0000E+03", "UNDEF"],
    );
    assert_eq!(inst.get_measure_data(0).unwrap(), 1000.0);
    assert!(inst.get_measure_data(3).unwrap().is_nan());
}

/// Transfer a waveform with the trigger in the center of a 10 sample record.
///
/// The payload `ABC` holds the raw bytes 65, 66 and 67.
#[rstest]
fn test_get_channel_data() {
    let mut inst = crt_inst(
        vec![
            "HOR:RECO?",
            "HOR:POS?",
            "DATA:SOU CH2",
            "DATA:WIDTH 1",
            "DATA:ENC RPB",
            "DATA:START 0",
            "DATA:STOP 10",
            "WFMPRE:XINCR?",
            "WFMPRE:YOFF?",
            "WFMPRE:YMULT?",
            "WFMPRE:YZERO?",
            "CURVE?",
        ],
        vec!["10", "50.0", "0.5", "65.0", "0.5", "1.0", "#13ABC"],
    );
    let wfm = inst.get_channel_data(1, 0.0, 100.0).unwrap();
    assert_eq!(wfm.amplitude, vec![1.0, 1.5, 2.0]);
    assert_eq!(wfm.time, vec![-2.5, -2.0, -1.5]);
}

/// Start and stop are clipped to the record, the time axis starts at the smaller of the two.
#[rstest]
fn test_get_channel_data_window() {
    let mut inst = crt_inst(
        vec![
            "HOR:RECO?",
            "HOR:POS?",
            "DATA:SOU CH1",
            "DATA:WIDTH 1",
            "DATA:ENC RPB",
            "DATA:START 10",
            "DATA:STOP 6",
            "WFMPRE:XINCR?",
            "WFMPRE:YOFF?",
            "WFMPRE:YMULT?",
            "WFMPRE:YZERO?",
            "CURVE?",
        ],
        vec!["10", "20.0", "1.0", "48.0", "2.0", "0.0", "#14 !09"],
    );
    let mut ch = inst.get_channel(0).unwrap();
    let wfm = ch.get_data(150.0, 60.0).unwrap();
    assert_eq!(wfm.amplitude, vec![-32.0, -30.0, 0.0, 18.0]);
    assert_eq!(wfm.time, vec![4.0, 5.0, 6.0, 7.0]);
}

#[rstest]
fn test_get_channel_data_bad_block() {
    let mut inst = crt_inst(
        vec![
            "HOR:RECO?",
            "HOR:POS?",
            "DATA:SOU CH1",
            "DATA:WIDTH 1",
            "DATA:ENC RPB",
            "DATA:START 0",
            "DATA:STOP 10",
            "WFMPRE:XINCR?",
            "WFMPRE:YOFF?",
            "WFMPRE:YMULT?",
            "WFMPRE:YZERO?",
            "CURVE?",
        ],
        vec!["10", "0.0", "1.0", "0.0", "1.0", "0.0", "XABC"],
    );
    let res = inst.get_channel_data(0, 0.0, 100.0);
    assert!(matches!(res, Err(InstrumentError::ResponseParseError(_))));
}

/// Ensure cloning an instrument and a channel works correctly.
#[rstest]
fn test_cloning(mut emp_inst: ScopeLbk) {
    let _ = emp_inst.clone();
    let ch = emp_inst.get_channel(3).unwrap();
    assert_eq!(ch.clone().number(), 4);
}
