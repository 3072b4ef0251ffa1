//! Tests for the [`ScpiResource`].

use std::time::Duration;

use rstest::*;

use equipmentrs::{Identity, InstrumentError, LoopbackInterfaceString, ScpiResource};

const IDN: &str = "ACME Instruments,PSU-1000,SN1234,1.02";
const ADDR: &str = "TCPIP0::10.0.0.5::5025::SOCKET";

type ResLbk = ScpiResource<LoopbackInterfaceString>;

/// Create a connected resource. The `*IDN?` query of the connection is prepended.
fn crt_res(host2inst: Vec<&str>, inst2host: Vec<&str>) -> ResLbk {
    let mut h2i = vec!["*IDN?"];
    h2i.extend(host2inst);
    let mut i2h = vec![IDN];
    i2h.extend(inst2host);
    let lbk = LoopbackInterfaceString::from_strs(&h2i, &i2h, "\n");
    ScpiResource::connect(lbk, ADDR).unwrap()
}

#[fixture]
fn emp_res() -> ResLbk {
    crt_res(vec![], vec![])
}

#[rstest]
fn test_connect(emp_res: ResLbk) {
    assert_eq!(emp_res.idn(), IDN);
    assert_eq!(emp_res.address(), ADDR);
    assert_eq!(
        emp_res.identity(),
        Identity {
            manufacturer: "ACME Instruments".to_string(),
            model: "PSU-1000".to_string(),
            serial: "SN1234".to_string(),
            firmware: "1.02".to_string(),
        }
    );
    assert_eq!(
        emp_res.to_string(),
        format!("Resource ID: {IDN}\nAddress: {ADDR}")
    );
}

#[rstest]
fn test_identity_short() {
    let id = Identity::parse("HEWLETT-PACKARD,34401A");
    assert_eq!(id.model, "34401A");
    assert_eq!(id.serial, "");
}

#[rstest]
fn test_check_identity(emp_res: ResLbk) {
    assert!(emp_res.check_identity("PSU-1000", |id| id.model == "PSU-1000").is_ok());
    match emp_res.check_identity("EDU36311A", |id| id.model == "EDU36311A") {
        Err(InstrumentError::WrongInstrument {
            address,
            expected,
            idn,
        }) => {
            assert_eq!(address, ADDR);
            assert_eq!(expected, "EDU36311A");
            assert_eq!(idn, IDN);
        }
        _ => panic!("Expected a wrong instrument error."),
    }
}

#[rstest]
fn test_common_commands() {
    let mut res = crt_res(vec!["*CLS", "*RST", "*OPC?"], vec!["1"]);
    res.clear_status().unwrap();
    res.reset().unwrap();
    res.wait_operation_complete().unwrap();
}

#[rstest]
fn test_write_query_read() {
    let mut res = crt_res(vec!["VOLT 5", "VOLT?"], vec![" 5.000 ", "late"]);
    res.write_resource("VOLT 5").unwrap();
    assert_eq!(res.query_resource("VOLT?").unwrap(), "5.000");
    assert_eq!(res.read_resource().unwrap(), "late");
}

#[rstest]
fn test_read_resource_raw() {
    let mut res = crt_res(vec!["CURV?"], vec!["#203abc"]);
    res.write_resource("CURV?").unwrap();
    assert_eq!(res.read_resource_raw().unwrap(), b"abc");
}

#[rstest]
fn test_error_queue() {
    let mut res = crt_res(
        vec!["SYST:ERR?", "SYST:ERR?", "SYST:ERR?"],
        vec![
            "-113,\"Undefined header\"",
            "-222,\"Data out of range\"",
            "+0,\"No error\"",
        ],
    );
    let errors = res.error_queue().unwrap();
    assert_eq!(
        errors,
        vec!["-113,\"Undefined header\"", "-222,\"Data out of range\""]
    );
}

#[rstest]
fn test_pop_error_queue_empty() {
    let mut res = crt_res(vec!["SYST:ERR?"], vec!["0,\"No error\""]);
    assert_eq!(res.pop_error_queue().unwrap(), None);
}

#[rstest]
fn test_pop_error_queue_garbage() {
    let mut res = crt_res(vec!["SYST:ERR?"], vec!["garbage"]);
    assert!(res.pop_error_queue().is_err());
}

#[rstest]
fn test_timeout_clear_local(mut emp_res: ResLbk) {
    emp_res.set_timeout(Duration::from_millis(500)).unwrap();
    assert_eq!(emp_res.timeout(), Duration::from_millis(500));
    emp_res.clear().unwrap();
    emp_res.set_local().unwrap();
}

/// Clones share the interface, so the expected commands are consumed across both handles.
#[rstest]
fn test_clone_shares_interface() {
    let mut res = crt_res(vec!["*RST", "*CLS"], vec![]);
    let mut res2 = res.clone();
    res.reset().unwrap();
    res2.clear_status().unwrap();
    assert_eq!(res2.idn(), IDN);
}
