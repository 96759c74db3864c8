//! CSV export sink

use crate::crawler::ItemRecord;
use crate::export::traits::{ExportResult, ExportSink};
use std::path::{Path, PathBuf};

/// Writes one CSV file per run into a target directory
pub struct CsvExporter {
    dir: PathBuf,
}

impl CsvExporter {
    /// Creates an exporter targeting the given directory
    ///
    /// The directory is created on first export if it does not exist.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ExportSink for CsvExporter {
    fn export(&self, records: &[ItemRecord], run_label: &str) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(format!("freshlist-run-{}.csv", run_label));
        let mut writer = csv::Writer::from_path(&path)?;

        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(path)
    }
}
