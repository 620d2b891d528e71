//! Delimited table codec
//!
//! Tables are UTF-8 with a leading byte-order mark and a configurable
//! single-character separator. Every write replaces the destination file.

use crate::HarvestError;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// UTF-8 byte-order mark written at the start of every table
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A record with a fixed column layout
pub trait TabularRecord {
    /// Column names, in output order
    const HEADERS: &'static [&'static str];

    /// Field values, one per header
    fn to_row(&self) -> Vec<String>;
}

/// Writes `records` to `path`, replacing any existing file
///
/// The table is first written next to the destination and then renamed over it,
/// so an interrupted write never leaves a truncated table behind.
pub fn write_table<R: TabularRecord>(
    path: &Path,
    delimiter: char,
    records: &[R],
) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    {
        let mut file = BufWriter::new(File::create(&staging)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter as u8)
            .from_writer(file);

        writer.write_record(R::HEADERS)?;
        for record in records {
            writer.write_record(record.to_row())?;
        }
        writer.flush()?;
    }
    fs::rename(&staging, path)?;

    Ok(())
}

/// Reads a table written by [`write_table`]
///
/// # Errors
///
/// * `HarvestError::MissingColumn` - one of `required` is not in the header row
/// * `HarvestError::Csv` - a row could not be decoded into `R`
pub fn read_table<R: DeserializeOwned>(
    path: &Path,
    delimiter: char,
    required: &[&str],
) -> Result<Vec<R>, HarvestError> {
    let content = fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(HarvestError::MissingColumn {
                column: column.to_string(),
                path: path.display().to_string(),
            });
        }
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
