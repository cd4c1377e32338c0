//! Import service
//!
//! Drives a CSV upload row by row. Each row is written independently, so a
//! bad row is reported and the next one is still attempted.

use std::collections::HashSet;
use std::sync::Arc;

use crate::app::csv_import;
use crate::domain::entities::{ImportOutcome, ImportReport};
use crate::domain::ports::{ProcessImportRepository, ProcessRepository};
use crate::error::AppError;

pub struct ImportService {
    importer: Arc<dyn ProcessImportRepository>,
    processes: Arc<dyn ProcessRepository>,
}

impl ImportService {
    pub fn new(
        importer: Arc<dyn ProcessImportRepository>,
        processes: Arc<dyn ProcessRepository>,
    ) -> Self {
        Self {
            importer,
            processes,
        }
    }

    /// Import every row of a CSV file
    ///
    /// With `dry_run` nothing is written: rows are validated and checked for
    /// duplicates against the database and earlier rows of the same file.
    pub async fn import(&self, bytes: &[u8], dry_run: bool) -> Result<ImportReport, AppError> {
        let rows = csv_import::parse(bytes)?;
        let mut report = ImportReport {
            dry_run,
            ..Default::default()
        };
        let mut seen = HashSet::new();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    report.record_failed(e.line, e.number.as_deref(), e.message);
                    continue;
                }
            };

            if dry_run {
                let exists = !seen.insert(row.number.clone())
                    || self.processes.find_by_number(&row.number).await?.is_some();
                if exists {
                    report.record_skipped(row.line, &row.number);
                } else {
                    report.record_imported();
                }
                continue;
            }

            match self.importer.import_row(&row).await {
                Ok(ImportOutcome::Imported(id)) => {
                    tracing::debug!(line = row.line, process_id = %id, "Row imported");
                    report.record_imported();
                }
                Ok(ImportOutcome::Duplicate) => report.record_skipped(row.line, &row.number),
                Err(e) => {
                    tracing::warn!(line = row.line, number = %row.number, error = %e, "Row failed");
                    report.record_failed(row.line, Some(&row.number), e.to_string());
                }
            }
        }

        tracing::info!(
            total = report.total,
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed,
            dry_run,
            "Import finished"
        );

        Ok(report)
    }
}
