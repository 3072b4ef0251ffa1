//! Data logging for bench measurements.
//!
//! This crate contains the small helpers that measurement scripts use to store their results:
//! - [`log_to_csv`], [`dump_data`] and [`dump_array_data`] write rows or columns of values to CSV
//!   files. The `.csv` extension is always enforced.
//! - [`create_test_log`] creates a timestamped directory for a test run, with the test information
//!   stored next to it as JSON.
//! - [`Logger`] keeps a message log, an optional data table and metadata in one directory, and can
//!   resume an earlier session.
//!
//! # Example
//!
//! ```no_run
//! use equipment_datalog::{Logger, LoggerOptions, log_to_csv};
//! use serde_json::json;
//!
//! log_to_csv("efficiency", ["v_in", "i_out", "eff"], true).unwrap();
//! log_to_csv("efficiency", [48.0, 2.0, 0.94], false).unwrap();
//!
//! let options = LoggerOptions {
//!     log_table_data: true,
//!     ..Default::default()
//! };
//! let metadata = json!({"dut": "SN0123456789"}).as_object().unwrap().clone();
//! let logger = Logger::new("transients", options, metadata).unwrap();
//! logger.log_message("Starting sweep").unwrap();
//! logger.log_data([40.0, 0.5]).unwrap();
//! ```

#![deny(warnings, missing_docs)]

mod csv_log;
mod logger;
mod test_log;

use std::path::PathBuf;

use thiserror::Error;

pub use csv_log::{csv_path, dump_array_data, dump_data, log_to_csv};
pub use logger::{Logger, LoggerOptions};
pub use test_log::{TestLogOptions, create_test_log};

/// Errors of the data logging functions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatalogError {
    /// Writing a CSV file failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// A file or directory could not be created, read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A JSON file could not be read or written.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// An existing logging session was found with a different directory structure.
    #[error("Logging session in {0} can only be resumed with the same directory structure")]
    ResumeMismatch(PathBuf),
    /// Data was logged but the logger was created without a data table.
    #[error("Logger was created without a data table, enable `log_table_data` to log data")]
    TableDataDisabled,
}
