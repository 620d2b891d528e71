//! Output module for persisting extraction results
//!
//! This module handles:
//! - Writing and reading the delimited, BOM-prefixed tables used for both datasets
//! - Accumulating enriched records and checkpointing them to disk

mod checkpoint;
mod table;

pub use checkpoint::CheckpointWriter;
pub use table::{read_table, write_table, TabularRecord, UTF8_BOM};
