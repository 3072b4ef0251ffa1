//! Tests for the [`Instrument`] interface itself.
//!
//! Most of the provided functionality of the [`InstrumentInterface`] trait is also exercised by
//! the [`equipmentrs::LoopbackInterfaceString`] tests.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use equipmentrs::{Instrument, InstrumentError, InstrumentInterface};

/// Set up a empty instrument with default 3 second timeout.
#[fixture]
fn empt_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::new(), Duration::from_secs(3))
}

/// Set up a instrument with no terminator and no timeout duration.
#[fixture]
fn no_term_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::from(b"resp".to_vec()), Duration::from_secs(0))
}

/// Create an instrument that has the given bytes waiting to be read.
fn crt_inst(data: &[u8]) -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::from(data.to_vec()), Duration::from_secs(3))
}

#[rstest]
fn test_instrument_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_terminator(), "\n");

    empt_inst.set_terminator("\r\n");
    assert_eq!(empt_inst.get_terminator(), "\r\n");
}

#[rstest]
fn test_instrument_timeout(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_timeout(), Duration::from_secs(3));

    empt_inst.set_timeout(Duration::from_millis(250)).unwrap();
    assert_eq!(empt_inst.get_timeout(), Duration::from_millis(250));
}

#[rstest]
fn test_instrument_write_read(mut empt_inst: Instrument<VecDeque<u8>>) {
    let data = b"Hello, Instrument!";
    empt_inst.write_raw(data).unwrap();

    let mut buf = vec![0; data.len()];
    empt_inst.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, data);
}

/// `sendcmd` appends exactly one terminator.
#[rstest]
fn test_instrument_sendcmd(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.set_terminator("\r\n");
    empt_inst.sendcmd("*RST").unwrap();

    let mut buf = vec![0; 6];
    empt_inst.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"*RST\r\n");
}

#[rstest]
fn test_instrument_read_until_terminator() {
    let mut inst = crt_inst(b"  +1.5E+00 \nrest");
    assert_eq!(inst.read_until_terminator().unwrap(), "+1.5E+00");
}

#[rstest]
fn test_instrument_read_until_multichar_terminator() {
    let mut inst = crt_inst(b"a\rb\r\n");
    inst.set_terminator("\r\n");
    assert_eq!(inst.read_until_terminator().unwrap(), "a\rb");
}

/// Invalid UTF-8 bytes are dropped from the response.
#[rstest]
fn test_instrument_read_invalid_utf8() {
    let mut inst = crt_inst(&[b'o', 0xff, b'k', b'\n']);
    assert_eq!(inst.read_until_terminator().unwrap(), "ok");
}

#[rstest]
fn test_instrument_read_until_terminator_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);

    match no_term_inst.read_until_terminator() {
        Err(InstrumentError::Timeout(timeout)) => {
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

#[rstest]
fn test_instrument_query_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);
    let query_exp = "QUERY";

    match no_term_inst.query(query_exp) {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query_exp, query);
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

/// A stream that runs dry before the terminator is an IO error.
#[rstest]
fn test_instrument_read_eof() {
    let mut inst = crt_inst(b"abc");
    assert!(matches!(
        inst.read_until_terminator(),
        Err(InstrumentError::Io(_))
    ));
}

#[rstest]
fn test_instrument_read_block() {
    let mut inst = crt_inst(b"#15hello\n#210abcdefghij\n");
    assert_eq!(inst.read_block().unwrap(), b"hello");
    assert_eq!(inst.read_block().unwrap(), b"abcdefghij");
}

#[rstest]
#[case(&b"X15hello\n"[..])]
#[case(&b"#x5hello\n"[..])]
#[case(&b"#05hello\n"[..])]
#[case(&b"#2x5hello\n"[..])]
fn test_instrument_read_block_bad_header(#[case] data: &[u8]) {
    let mut inst = crt_inst(data);
    assert!(matches!(
        inst.read_block(),
        Err(InstrumentError::ResponseParseError(_))
    ));
}

/// A block that is shorter than its header announces cannot be read.
#[rstest]
fn test_instrument_read_block_truncated() {
    let mut inst = crt_inst(b"#19abc");
    assert!(inst.read_block().is_err());
}

/// The generic instrument does not know how to clear or go to local.
#[rstest]
fn test_instrument_unsupported(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert!(matches!(
        empt_inst.clear(),
        Err(InstrumentError::InterfaceCommandNotSupported)
    ));
    assert!(matches!(
        empt_inst.go_to_local(),
        Err(InstrumentError::InterfaceCommandNotSupported)
    ));
}
