//! A file logger for a measurement session.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{DatalogError, log_to_csv};

const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// What a [`Logger`] keeps besides its message log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Emit every logged message as a `tracing` event as well. Defaults to `true`.
    pub print_messages: bool,
    /// Keep a `data.csv` table.
    pub log_table_data: bool,
    /// Keep an `images` sub-directory.
    pub log_images: bool,
    /// Keep a `raw_data` sub-directory.
    pub log_raw_data: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            print_messages: true,
            log_table_data: false,
            log_images: false,
            log_raw_data: false,
        }
    }
}

/// Locations of the parts of a logging session.
#[derive(Clone, Debug)]
struct SessionPaths {
    root_dir: PathBuf,
}

impl SessionPaths {
    fn message_log(&self) -> PathBuf {
        self.root_dir.join("message_log.txt")
    }

    fn data_log(&self) -> PathBuf {
        self.root_dir.join("data.csv")
    }

    fn image_dir(&self) -> PathBuf {
        self.root_dir.join("images")
    }

    fn raw_data_dir(&self) -> PathBuf {
        self.root_dir.join("raw_data")
    }

    fn metadata(&self) -> PathBuf {
        self.root_dir.join("metadata.json")
    }

    fn matches(&self, options: &LoggerOptions) -> bool {
        options.log_table_data == self.data_log().exists()
            && options.log_images == self.image_dir().exists()
            && options.log_raw_data == self.raw_data_dir().exists()
    }

    /// Path relative to the parent of the session directory, for messages.
    fn relative(&self, path: &Path) -> String {
        let base = self.root_dir.parent().unwrap_or(&self.root_dir);
        path.strip_prefix(base).unwrap_or(path).display().to_string()
    }

    /// Create the files and directories of a new session and describe what was created.
    fn create(&self, options: &LoggerOptions) -> Result<Vec<String>, DatalogError> {
        let mut messages = Vec::new();
        OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(self.message_log())?;
        messages.push(format!(
            "({}) Message Log Created\n\t{}",
            asctime(),
            self.relative(&self.message_log())
        ));
        if options.log_table_data {
            OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(self.data_log())?;
            messages.push(format!(
                "Tabular data log created:\n\t{}",
                self.relative(&self.data_log())
            ));
        }
        if options.log_images {
            fs::create_dir(self.image_dir())?;
            messages.push(format!(
                "Image subdirectory created:\n\t{}",
                self.relative(&self.image_dir())
            ));
        }
        if options.log_raw_data {
            fs::create_dir(self.raw_data_dir())?;
            messages.push(format!(
                "Raw data subdirectory created:\n\t{}",
                self.relative(&self.raw_data_dir())
            ));
        }
        Ok(messages)
    }
}

/// Logs messages, tabular data and metadata of a measurement session to a directory.
///
/// The directory contains:
/// - `message_log.txt`, always.
/// - `data.csv`, `images/` and `raw_data/`, depending on the [`LoggerOptions`].
/// - `metadata.json`, once metadata is logged.
///
/// If the directory already holds a message log, the session is resumed, which is only possible
/// if the optional files and directories match the options exactly. A closing line is written to
/// the message log when the logger is dropped.
#[derive(Debug)]
pub struct Logger {
    paths: SessionPaths,
    options: LoggerOptions,
}

impl Logger {
    /// Create a new logging session in `root_dir`, or resume the existing one.
    ///
    /// # Arguments
    /// * `root_dir` - Directory of the session, created if it does not exist.
    /// * `options` - Optional parts of the session.
    /// * `metadata` - Merged into `metadata.json` if not empty.
    pub fn new<P: AsRef<Path>>(
        root_dir: P,
        options: LoggerOptions,
        metadata: Map<String, Value>,
    ) -> Result<Self, DatalogError> {
        fs::create_dir_all(&root_dir)?;
        let paths = SessionPaths {
            root_dir: root_dir.as_ref().canonicalize()?,
        };

        let messages = if paths.message_log().exists() {
            if !paths.matches(&options) {
                return Err(DatalogError::ResumeMismatch(paths.root_dir));
            }
            vec![format!("({}) Resuming existing logging session", asctime())]
        } else {
            paths.create(&options)?
        };

        let logger = Self { paths, options };
        if !metadata.is_empty() {
            logger.log_metadata(metadata)?;
        }
        logger.log_message(messages.join("\n"))?;
        Ok(logger)
    }

    /// The session directory.
    pub fn root_dir(&self) -> &Path {
        &self.paths.root_dir
    }

    /// Path of the message log.
    pub fn message_log_path(&self) -> PathBuf {
        self.paths.message_log()
    }

    /// Path of the data table.
    pub fn data_log_path(&self) -> PathBuf {
        self.paths.data_log()
    }

    /// Directory for images.
    pub fn image_dir(&self) -> PathBuf {
        self.paths.image_dir()
    }

    /// Directory for raw data, e.g., waveforms.
    pub fn raw_data_dir(&self) -> PathBuf {
        self.paths.raw_data_dir()
    }

    /// Path of the metadata file.
    pub fn metadata_path(&self) -> PathBuf {
        self.paths.metadata()
    }

    /// Append a message to the message log. Multi-line messages are fine.
    pub fn log_message<S: AsRef<str>>(&self, message: S) -> Result<(), DatalogError> {
        let message = message.as_ref();
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.message_log_path())?;
        writeln!(file, "{message}")?;
        if self.options.print_messages {
            info!("{message}");
        }
        Ok(())
    }

    /// Append a row to the data table.
    ///
    /// Fails with [`DatalogError::TableDataDisabled`] if the logger keeps no data table. The
    /// failure is noted in the message log as well.
    pub fn log_data<I, T>(&self, row: I) -> Result<(), DatalogError>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        if !self.options.log_table_data {
            let err = DatalogError::TableDataDisabled;
            self.log_message(err.to_string())?;
            return Err(err);
        }
        log_to_csv(self.data_log_path(), row, false)
    }

    /// Merge metadata into `metadata.json`. New values overwrite existing ones with the same key.
    pub fn log_metadata(&self, metadata: Map<String, Value>) -> Result<(), DatalogError> {
        let mut existing = self.get_metadata()?;
        existing.extend(metadata);
        fs::write(
            self.metadata_path(),
            serde_json::to_string_pretty(&existing)?,
        )?;
        Ok(())
    }

    /// The logged metadata, empty if none was logged yet.
    pub fn get_metadata(&self) -> Result<Map<String, Value>, DatalogError> {
        let path = self.metadata_path();
        if !path.exists() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.log_message(format!("({}) Message Log Closed", asctime())) {
            warn!(path = %self.paths.root_dir.display(), error = %e, "Could not close message log");
        }
    }
}

fn asctime() -> String {
    Local::now().format(ASCTIME).to_string()
}
