//! Scripted instruments for tests.
//!
//! A [`LoopbackInterfaceString`] plays back a conversation with an SCPI instrument: the commands
//! the driver must send and the replies the instrument gives, both ending in a terminator. Driver
//! tests script a single instrument this way. Collection tests hand one scripted interface per
//! address to the connection code, boxed as a [`crate::DynInterface`]. Identification,
//! initialization steps and error handling are then exercised without hardware.

mod loopback_interface_string;

use std::collections::VecDeque;

pub use loopback_interface_string::*;

/// The messages of one direction of a scripted conversation, consumed in order.
#[derive(Debug, Default)]
struct Script {
    messages: VecDeque<String>,
}

impl Script {
    fn new(messages: Vec<String>) -> Self {
        Self {
            messages: messages.into(),
        }
    }

    /// Take the next message. Panics with `exhausted` if the script is used up.
    fn take(&mut self, exhausted: &str) -> String {
        match self.messages.pop_front() {
            Some(msg) => msg,
            None => panic!("{exhausted}"),
        }
    }

    /// The first message that was never taken.
    fn leftover(&self) -> Option<&str> {
        self.messages.front().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_order() {
        let mut script = Script::new(vec!["*IDN?".to_string(), "*RST".to_string()]);
        assert_eq!(script.take("empty"), "*IDN?");
        assert_eq!(script.leftover(), Some("*RST"));
        assert_eq!(script.take("empty"), "*RST");
        assert_eq!(script.leftover(), None);
    }

    #[test]
    #[should_panic(expected = "script is done")]
    fn test_script_exhausted() {
        Script::default().take("script is done");
    }
}
