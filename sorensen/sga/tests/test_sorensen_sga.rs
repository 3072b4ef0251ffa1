//! Tests for the Sorensen SGA driver.

use measurements::{Current, Voltage};
use rstest::*;

use equipmentrs::LoopbackInterfaceString;

use sorensen_sga::*;

const IDN: &str = "Sorensen,SGA100X50D-1AAA,1234A56789,1.2.3";

// Type alias for the loopback interface with the Sorensen SGA driver.
type SgaLbk = SorensenSga<LoopbackInterfaceString>;

/// Function that creates a new SorensenSga instance with the given input and output commands.
///
/// The `*IDN?` query sent when connecting is prepended automatically.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> SgaLbk {
    let mut h2i = vec!["*IDN?"];
    h2i.extend(host2inst);
    let mut i2h = vec![IDN];
    i2h.extend(inst2host);
    let interface = LoopbackInterfaceString::from_strs(&h2i, &i2h, "\n");
    SorensenSga::try_new(interface, "TCPIP0::10.0.0.5::5025::SOCKET").unwrap()
}

#[fixture]
fn emp_inst() -> SgaLbk {
    crt_inst(vec![], vec![])
}

#[rstest]
fn test_get_name(emp_inst: SgaLbk) {
    assert_eq!(emp_inst.get_name(), IDN);
}

#[rstest]
#[case(true, "OUTP:STAT 1")]
#[case(false, "OUTP:STAT 0")]
fn test_set_state(#[case] state: bool, #[case] cmd: &str) {
    let mut inst = crt_inst(vec![cmd], vec![]);
    inst.set_state(state).unwrap();
}

#[rstest]
#[case("1", true)]
#[case("0", false)]
fn test_get_state(#[case] resp: &str, #[case] exp: bool) {
    let mut inst = crt_inst(vec!["OUTP:STAT?"], vec![resp]);
    assert_eq!(inst.get_state().unwrap(), exp);
}

#[rstest]
fn test_on_off() {
    let mut inst = crt_inst(vec!["OUTP:STAT 1", "OUTP:STAT 0"], vec![]);
    inst.on().unwrap();
    inst.off().unwrap();
}

#[rstest]
fn test_toggle() {
    let mut inst = crt_inst(vec!["OUTP:STAT?", "OUTP:STAT 0"], vec!["1"]);
    inst.toggle().unwrap();
}

#[rstest]
fn test_voltage_setpoint() {
    let mut inst = crt_inst(vec!["SOUR:VOLT 48.5", "SOUR:VOLT?"], vec!["48.50"]);
    inst.set_voltage(Voltage::from_volts(48.5)).unwrap();
    assert_eq!(inst.get_voltage().unwrap().as_volts(), 48.5);
}

#[rstest]
fn test_current_setpoint() {
    let mut inst = crt_inst(vec!["SOUR:CURR 2", "SOUR:CURR?"], vec!["2.000"]);
    inst.set_current(Current::from_amperes(2.0)).unwrap();
    assert_eq!(inst.get_current().unwrap().as_amperes(), 2.0);
}

#[rstest]
fn test_measurements() {
    let mut inst = crt_inst(
        vec!["MEAS:VOLT?", "MEAS:CURR?", "MEAS:POW?"],
        vec!["12.01", "1.5", "18.015"],
    );
    assert_eq!(inst.measure_voltage().unwrap().as_volts(), 12.01);
    assert_eq!(inst.measure_current().unwrap().as_amperes(), 1.5);
    assert_eq!(inst.measure_power().unwrap().as_watts(), 18.015);
}

#[rstest]
fn test_measure_unparsable() {
    let mut inst = crt_inst(vec!["MEAS:VOLT?"], vec!["ERR"]);
    assert!(inst.measure_voltage().is_err());
}

#[rstest]
fn test_protection() {
    let mut inst = crt_inst(
        vec![
            "SOUR:VOLT:PROT 55",
            "SOUR:VOLT:PROT?",
            "SOUR:CURR:LIM 5.5",
            "SOUR:CURR:LIM?",
        ],
        vec!["55.0", "5.5"],
    );
    inst.set_over_voltage_protection(Voltage::from_volts(55.0))
        .unwrap();
    assert_eq!(inst.get_over_voltage_protection().unwrap().as_volts(), 55.0);
    inst.set_over_current_protection(Current::from_amperes(5.5))
        .unwrap();
    assert_eq!(
        inst.get_over_current_protection().unwrap().as_amperes(),
        5.5
    );
}

#[rstest]
fn test_error_queue() {
    let mut inst = crt_inst(
        vec!["SYST:ERR?", "SYST:ERR?"],
        vec!["-222,\"Data out of range\"", "0,\"No error\""],
    );
    assert_eq!(
        inst.error_queue().unwrap(),
        vec!["-222,\"Data out of range\""]
    );
}

#[rstest]
fn test_local() {
    let mut inst = crt_inst(
        vec!["SYST:LOCAL 1", "SYST:LOCAL?", "SYST:LOCAL 0", "SYST:LOCAL?"],
        vec!["ON", "OFF"],
    );
    inst.set_local(true).unwrap();
    assert!(inst.get_local().unwrap());
    inst.set_local(false).unwrap();
    assert!(!inst.get_local().unwrap());
}

#[rstest]
fn test_common_commands() {
    let mut inst = crt_inst(vec!["*RST", "*CLS"], vec![]);
    inst.resource().reset().unwrap();
    inst.resource().clear_status().unwrap();
}

/// Ensure cloning an instrument works correctly.
#[rstest]
fn test_cloning(emp_inst: SgaLbk) {
    let _ = emp_inst.clone();
}
