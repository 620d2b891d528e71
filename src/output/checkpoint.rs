//! Checkpointed result accumulator
//!
//! Records stay in memory until flushed. Every flush rewrites the whole
//! accumulated set, so the partial snapshot is always a prefix of the final table.

use crate::config::OutputConfig;
use crate::output::table::{write_table, TabularRecord};
use crate::HarvestError;
use std::path::{Path, PathBuf};

/// Accumulates records and flushes full snapshots to disk
#[derive(Debug)]
pub struct CheckpointWriter<R> {
    records: Vec<R>,
    final_path: PathBuf,
    partial_path: PathBuf,
    interval: usize,
    delimiter: char,
}

impl<R: TabularRecord> CheckpointWriter<R> {
    /// Creates a writer that snapshots every `interval` seed positions
    pub fn new(
        final_path: impl Into<PathBuf>,
        partial_path: impl Into<PathBuf>,
        interval: usize,
        delimiter: char,
    ) -> Self {
        Self {
            records: Vec::new(),
            final_path: final_path.into(),
            partial_path: partial_path.into(),
            interval: interval.max(1),
            delimiter,
        }
    }

    /// Creates a writer for the enriched dataset described by `output`
    pub fn for_details(output: &OutputConfig) -> Self {
        Self::new(
            &output.details_path,
            &output.partial_path,
            output.partial_save_every,
            output.delimiter,
        )
    }

    pub fn push(&mut self, record: R) {
        self.records.push(record);
    }

    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Writes a partial snapshot if `position` (1-based seed position of a
    /// record that was just pushed) falls on the configured cadence
    ///
    /// Returns whether a snapshot was written.
    pub fn checkpoint(&self, position: usize) -> Result<bool, HarvestError> {
        if position == 0 || position % self.interval != 0 {
            return Ok(false);
        }

        write_table(&self.partial_path, self.delimiter, &self.records)?;
        tracing::info!(
            "Saved partial snapshot after {} clubs ({} records) to {}",
            position,
            self.records.len(),
            self.partial_path.display()
        );
        Ok(true)
    }

    /// Writes every accumulated record to the final destination
    fn flush(&self) -> Result<(), HarvestError> {
        write_table(&self.final_path, self.delimiter, &self.records)?;
        tracing::info!(
            "Saved {} total records to {}",
            self.records.len(),
            self.final_path.display()
        );
        Ok(())
    }

    /// Flushes and hands back the accumulated records
    pub fn finish(self) -> Result<Vec<R>, HarvestError> {
        self.flush()?;
        Ok(self.records)
    }
}
