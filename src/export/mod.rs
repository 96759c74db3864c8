//! Export sinks for finalized run batches
//!
//! A run that collected at least one new record hands its batch to an
//! export sink exactly once, after the ledger commit succeeded. Each run
//! produces a fresh artifact; prior exports are never appended to.

mod csv_export;
mod traits;

pub use csv_export::CsvExporter;
pub use traits::{ExportError, ExportResult, ExportSink};
