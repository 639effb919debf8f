//! Flat CSV mirror of the trend store.
//!
//! The export is an independent append: a failure here never undoes the
//! primary write, and the two sinks may drift apart.

use csv::{ReaderBuilder, WriterBuilder};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;
use trendwatch_core::{CoreError, ExportError, TrendRecord};

pub const CSV_HEADER: [&str; 4] = ["Date", "Positive", "Neutral", "Negative"];

pub trait TrendExport {
    async fn export(&self, record: &TrendRecord) -> Result<(), CoreError>;
}

impl<T: TrendExport + ?Sized> TrendExport for &T {
    async fn export(&self, record: &TrendRecord) -> Result<(), CoreError> {
        (**self).export(record).await
    }
}

#[derive(Debug, Clone)]
pub struct CsvExport {
    path: PathBuf,
}

impl CsvExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is new or empty.
    pub fn append_record(&self, record: &TrendRecord) -> Result<(), CoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ExportError::OpenFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(CSV_HEADER).map_err(ExportError::Csv)?;
        }
        writer
            .write_record([
                record.formatted_timestamp(),
                record.positive.to_string(),
                record.neutral.to_string(),
                record.negative.to_string(),
            ])
            .map_err(ExportError::Csv)?;
        writer.flush()?;

        debug!(
            "Exported trend row for {} to {}",
            record.formatted_timestamp(),
            self.path.display()
        );
        Ok(())
    }

    /// Read every exported row back; a missing file reads as empty.
    pub fn read_records(&self) -> Result<Vec<TrendRecord>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(ExportError::Csv)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(ExportError::Csv)?;
            records.push(self.parse_row(&row)?);
        }
        Ok(records)
    }

    fn parse_row(&self, row: &csv::StringRecord) -> Result<TrendRecord, CoreError> {
        let bad_row = || {
            CoreError::Export(ExportError::ReadFailed {
                path: self.path.display().to_string(),
                reason: format!("malformed row {:?}", row),
            })
        };

        if row.len() != CSV_HEADER.len() {
            return Err(bad_row());
        }
        let timestamp = TrendRecord::parse_timestamp(&row[0]).ok_or_else(bad_row)?;
        let count = |i: usize| row[i].trim().parse::<u32>().map_err(|_| bad_row());

        Ok(TrendRecord::new(timestamp, count(1)?, count(2)?, count(3)?))
    }
}

impl TrendExport for CsvExport {
    async fn export(&self, record: &TrendRecord) -> Result<(), CoreError> {
        let export = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || export.append_record(&record))
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("export task failed: {}", e),
            })?
    }
}
