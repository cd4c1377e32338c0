//! Bulk import domain types
//!
//! A spreadsheet row carries names, not ids. The import resolves each name
//! to a foreign key (creating the referenced row when missing) before the
//! process is inserted.

use chrono::NaiveDate;
use serde::Serialize;

use super::process::ProcessId;

/// One parsed spreadsheet row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    /// 1-based line in the source file, header included
    pub line: usize,
    pub number: String,
    pub complainant: Option<String>,
    pub controller: Option<String>,
    pub responsible: Option<String>,
    pub entry_channel: Option<String>,
    pub situation: Option<String>,
    pub referral: Option<String>,
    pub description: Option<String>,
    pub received_at: Option<NaiveDate>,
    pub closed_at: Option<NaiveDate>,
}

/// Result of importing a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported(ProcessId),
    /// A process with the same number already exists; nothing was written
    Duplicate,
}

/// A row that was not imported, and why
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportRowError {
    pub line: usize,
    pub number: Option<String>,
    pub message: String,
}

/// Aggregate result of an import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    pub fn record_imported(&mut self) {
        self.total += 1;
        self.imported += 1;
    }

    pub fn record_skipped(&mut self, line: usize, number: &str) {
        self.total += 1;
        self.skipped += 1;
        self.errors.push(ImportRowError {
            line,
            number: Some(number.to_string()),
            message: format!("Process {} already exists", number),
        });
    }

    pub fn record_failed(&mut self, line: usize, number: Option<&str>, message: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push(ImportRowError {
            line,
            number: number.map(str::to_string),
            message,
        });
    }
}
