//! Row and column wise CSV logging.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use csv::{Writer, WriterBuilder};
use tracing::trace;

use crate::DatalogError;

/// The path with its extension replaced by, or extended with, `.csv`.
pub fn csv_path<P: AsRef<Path>>(path: P) -> PathBuf {
    path.as_ref().with_extension("csv")
}

fn open_writer(path: &Path, truncate: bool) -> Result<Writer<File>, DatalogError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(truncate)
        .append(!truncate)
        .open(path)?;
    Ok(WriterBuilder::new().flexible(true).from_writer(file))
}

/// Write one row to a CSV file.
///
/// With `init`, the file is created or truncated, otherwise the row is appended and the file is
/// created if it does not exist. The `.csv` extension is added to the path if it is missing.
///
/// ```no_run
/// use equipment_datalog::log_to_csv;
///
/// log_to_csv("my_data", ["column A", "column B"], true).unwrap();
/// log_to_csv("my_data", [1, 2], false).unwrap();
/// ```
pub fn log_to_csv<P, I, T>(path: P, row: I, init: bool) -> Result<(), DatalogError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let path = csv_path(path);
    let mut wtr = open_writer(&path, init)?;
    wtr.write_record(row.into_iter().map(|v| v.to_string()))?;
    wtr.flush()?;
    trace!(path = %path.display(), "Row logged");
    Ok(())
}

/// Write all rows to a CSV file, replacing its content.
///
/// Rows do not need to have the same length.
pub fn dump_data<P, I, R, T>(path: P, rows: I) -> Result<(), DatalogError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = T>,
    T: ToString,
{
    let path = csv_path(path);
    let mut wtr = open_writer(&path, true)?;
    for row in rows {
        wtr.write_record(row.into_iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write columns of data to a CSV file, one row per index.
///
/// Without a `fill_value`, the output stops at the end of the shortest column. With one, it
/// continues to the end of the longest column and missing values are replaced by `fill_value`.
/// `init` truncates the file, otherwise rows are appended.
///
/// ```no_run
/// use equipment_datalog::dump_array_data;
///
/// let v_in = vec![40.0, 48.0, 54.0];
/// let eff = vec![0.91, 0.93];
/// // Writes 40,0.91 / 48,0.93 / 54,
/// dump_array_data("sweep", &[v_in, eff], true, Some("")).unwrap();
/// ```
pub fn dump_array_data<P, C, T>(
    path: P,
    columns: &[C],
    init: bool,
    fill_value: Option<&str>,
) -> Result<(), DatalogError>
where
    P: AsRef<Path>,
    C: AsRef<[T]>,
    T: ToString,
{
    let lengths = columns.iter().map(|c| c.as_ref().len());
    let nof_rows = match fill_value {
        Some(_) => lengths.max(),
        None => lengths.min(),
    }
    .unwrap_or(0);

    let path = csv_path(path);
    let mut wtr = open_writer(&path, init)?;
    for idx in 0..nof_rows {
        wtr.write_record(columns.iter().map(|c| match c.as_ref().get(idx) {
            Some(v) => v.to_string(),
            None => fill_value.unwrap_or_default().to_string(),
        }))?;
    }
    wtr.flush()?;
    Ok(())
}
