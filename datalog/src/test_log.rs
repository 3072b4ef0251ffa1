//! Timestamped directories for test runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde_json::{Map, Value};
use tracing::info;

use crate::DatalogError;

const DEFAULT_TEST_NAME: &str = "test_data";

/// Optional sub-directories of a test directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestLogOptions {
    /// Create an `images` sub-directory.
    pub images: bool,
    /// Create a `raw_data` sub-directory.
    pub raw_data: bool,
}

/// Create a directory for a test run in `base_dir` and return its path.
///
/// The directory is named `<test_name>_<YYYYMMDDHHMMSS>`, where the test name is taken from the
/// `test_name` entry of `test_info` and defaults to `test_data`. Creating the directory fails if
/// it already exists. The test information, extended by a `run_time` entry, is written to
/// `<directory name>.json` inside the directory.
pub fn create_test_log<P: AsRef<Path>>(
    base_dir: P,
    options: TestLogOptions,
    mut test_info: Map<String, Value>,
) -> Result<PathBuf, DatalogError> {
    let test_name = test_info
        .get("test_name")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TEST_NAME)
        .to_string();
    let now = Local::now();
    let dir_name = format!("{test_name}_{}", now.format("%Y%m%d%H%M%S"));
    test_info.insert(
        "run_time".to_string(),
        Value::String(now.format("%Y/%m/%d %H:%M:%S").to_string()),
    );

    let test_dir = base_dir.as_ref().join(&dir_name);
    fs::create_dir(&test_dir)?;
    if options.images {
        fs::create_dir(test_dir.join("images"))?;
    }
    if options.raw_data {
        fs::create_dir(test_dir.join("raw_data"))?;
    }

    let info_path = test_dir.join(format!("{dir_name}.json"));
    fs::write(&info_path, serde_json::to_string_pretty(&test_info)?)?;
    info!(path = %test_dir.display(), "Test directory created");
    Ok(test_dir)
}
