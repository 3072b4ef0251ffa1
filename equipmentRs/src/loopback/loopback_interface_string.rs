//! Loopback interface for testing SCPI drivers.
//!
//! End-of-command is always determined by a terminator string, usually `"\n"`.

use std::{collections::VecDeque, time::Duration};

use crate::{InstrumentError, InstrumentInterface, loopback::Script};

/// An interface that allows you to simply write tests for your instrument driver.
///
/// Expected commands from the host and scripted responses from the instrument are consumed in
/// order. Device clear and go-to-local requests always succeed.
///
/// # Example
///
/// ```
/// use equipmentrs::{InstrumentInterface, LoopbackInterfaceString};
///
/// let mut lbk = LoopbackInterfaceString::from_strs(&["*IDN?"], &["ACME,PSU1,42,1.0"], "\n");
/// assert_eq!(lbk.query("*IDN?").unwrap(), "ACME,PSU1,42,1.0");
/// ```
///
/// The following panics, as the driver sends a command that is not expected:
///
/// ```should_panic
/// use equipmentrs::{InstrumentInterface, LoopbackInterfaceString};
///
/// let mut lbk = LoopbackInterfaceString::from_strs(&["*IDN?"], &["ACME,PSU1,42,1.0"], "\n");
/// let _ = lbk.query("*IDX?");
/// ```
#[derive(Debug)]
pub struct LoopbackInterfaceString {
    from_host: Script,
    from_inst: Script,
    terminator_exp: String,
    curr_bytes: VecDeque<u8>,
    terminator: String,
    timeout: Duration,
}

impl LoopbackInterfaceString {
    /// Create a new loopback instrument with given commands to and from instrument.
    ///
    /// The commands are read in order. At the end, when the [`LoopbackInterfaceString`] is
    /// dropped, [`LoopbackInterfaceString::finalize`] checks that all commands have been used and
    /// panics otherwise. Whenever something is sent to the instrument that is not expected, the
    /// interface panics as well.
    ///
    /// # Arguments:
    /// * `from_host` - Commands from host to instrument, without terminator.
    /// * `from_inst` - Responses from instrument to host, without terminator.
    /// * `terminator_exp` - The terminator appended to every message in both directions.
    pub fn new(from_host: Vec<String>, from_inst: Vec<String>, terminator_exp: &str) -> Self {
        LoopbackInterfaceString {
            from_host: Script::new(from_host),
            from_inst: Script::new(from_inst),
            terminator_exp: terminator_exp.to_string(),
            curr_bytes: VecDeque::new(),
            terminator: "\n".to_string(),
            timeout: Duration::from_secs(3),
        }
    }

    /// Same as [`LoopbackInterfaceString::new`], taking string slices.
    pub fn from_strs(from_host: &[&str], from_inst: &[&str], terminator_exp: &str) -> Self {
        Self::new(
            from_host.iter().map(|s| s.to_string()).collect(),
            from_inst.iter().map(|s| s.to_string()).collect(),
            terminator_exp,
        )
    }

    /// This command panics if not all commands in the [`LoopbackInterfaceString`] have been used.
    ///
    /// It is automatically called when the interface is dropped, but you can also call it
    /// manually.
    pub fn finalize(&mut self) {
        if let Some(fil) = self.from_host.leftover() {
            panic!("Leftover expected commands found from host to instrument: {fil}");
        }
        if let Some(fil) = self.from_inst.leftover() {
            panic!("Leftover expected commands found from instrument to host: {fil}");
        }
    }

    fn get_next_from_host_with_terminator(&mut self) -> String {
        let cmd = self
            .from_host
            .take("No more commands were expected from host to instrument.");
        format!("{cmd}{}", self.terminator_exp)
    }

    fn get_next_from_inst_with_terminator(&mut self) -> String {
        let cmd = self
            .from_inst
            .take("No more commands were expected from instrument to host.");
        format!("{cmd}{}", self.terminator_exp)
    }

    fn read_one_byte(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.curr_bytes.pop_front() {
                return byte;
            }
            let next_cmd = self.get_next_from_inst_with_terminator();
            self.curr_bytes = next_cmd.into_bytes().into();
        }
    }
}

impl InstrumentInterface for LoopbackInterfaceString {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.timeout = timeout;
        Ok(())
    }

    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self.get_next_from_host_with_terminator();
        assert_eq!(
            exp.as_bytes(),
            cmd,
            "Expected sendcmd '{0}', got '{1:?}'",
            exp,
            str::from_utf8(cmd)
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<(), InstrumentError> {
        self.curr_bytes.clear();
        Ok(())
    }

    fn go_to_local(&mut self) -> Result<(), InstrumentError> {
        Ok(())
    }
}

impl Drop for LoopbackInterfaceString {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}
