//! Tests for the default implementation of the [`InstrumentInterface`] trait.

use std::time::Duration;

use rstest::*;

use equipmentrs::{DynInterface, InstrumentError, InstrumentInterface, LoopbackInterfaceString};

struct TestInstrument {
    written: Vec<u8>,
}

impl InstrumentInterface for TestInstrument {
    fn read_exact(&mut self, _buf: &mut [u8]) -> Result<(), InstrumentError> {
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.written.extend_from_slice(data);
        Ok(())
    }
}

#[fixture]
fn inst() -> TestInstrument {
    TestInstrument {
        written: Vec::new(),
    }
}

#[rstest]
fn test_default_get_terminator(inst: TestInstrument) {
    assert_eq!(inst.get_terminator(), "\n");
}

#[rstest]
fn test_default_get_timeout(inst: TestInstrument) {
    assert_eq!(inst.get_timeout(), Duration::from_secs(3));
}

#[rstest]
fn test_default_set_timeout(mut inst: TestInstrument) {
    assert!(matches!(
        inst.set_timeout(Duration::from_secs(1)),
        Err(InstrumentError::InterfaceCommandNotSupported)
    ));
}

#[rstest]
fn test_default_sendcmd(mut inst: TestInstrument) {
    inst.sendcmd("OUTP ON").unwrap();
    inst.write("raw").unwrap();
    assert_eq!(inst.written, b"OUTP ON\nraw");
}

#[rstest]
fn test_default_clear_and_local(mut inst: TestInstrument) {
    assert!(inst.clear().is_err());
    assert!(inst.go_to_local().is_err());
}

/// A boxed interface forwards to the interface it holds, including overridden defaults.
#[rstest]
fn test_boxed_interface_forwards() {
    let lbk = LoopbackInterfaceString::from_strs(&["*IDN?"], &["ACME,PSU1,42,1.0"], "\n");
    let mut boxed: DynInterface = Box::new(lbk);

    boxed.set_timeout(Duration::from_millis(10)).unwrap();
    assert_eq!(boxed.get_timeout(), Duration::from_millis(10));
    boxed.clear().unwrap();
    boxed.go_to_local().unwrap();
    assert_eq!(boxed.query("*IDN?").unwrap(), "ACME,PSU1,42,1.0");
}
