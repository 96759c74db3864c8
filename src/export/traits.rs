//! Export sink trait and error types

use crate::crawler::ItemRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Trait for export sinks receiving one finalized batch per run
pub trait ExportSink {
    /// Writes the batch as a fresh tabular artifact and returns its path
    ///
    /// `run_label` is the run's start timestamp, used to name the artifact.
    fn export(&self, records: &[ItemRecord], run_label: &str) -> ExportResult<PathBuf>;
}
