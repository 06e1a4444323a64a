use anyhow::Result;
use std::path::Path;
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::{utc_timestamp, write_error_to_log};

/// Non-fatal data quality problems found while building a report.
///
/// These never stop the pipeline: the affected row or file is skipped or
/// left as text and processing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataQualityIssue {
    #[error("row {row}: cells do not match any known test item layout")]
    MalformedRow { row: usize },

    #[error("row {row}: {columns:?} empty, the record may be incomplete")]
    IncompleteRow {
        row: usize,
        columns: Vec<&'static str>,
    },

    #[error("row {row}: image '{file}' referenced in {column} could not be found")]
    MissingImage {
        row: usize,
        column: &'static str,
        file: String,
    },

    #[error("file '{file}' could not be found")]
    MissingFile { file: String },

    #[error("file '{file}' could not be copied to the output folder: {message}")]
    CopyFailed { file: String, message: String },

    #[error("sheet '{sheet}' not found, its section is left empty")]
    MissingOptionalSheet { sheet: String },

    #[error("sheet '{sheet}': label '{label}' has no entry in the map sheet")]
    UnmappedLabel { sheet: String, label: String },
}

impl DataQualityIssue {
    /// Issues that leave a gap in the document are errors, the rest warnings.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DataQualityIssue::MalformedRow { .. }
                | DataQualityIssue::MissingImage { .. }
                | DataQualityIssue::MissingFile { .. }
        )
    }
}

/// Accumulated data quality issues of one generated document.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    issues: Vec<DataQualityIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue and log it immediately.
    pub fn push(&mut self, issue: DataQualityIssue) {
        if issue.is_error() {
            error!("{issue}");
        } else {
            warn!("{issue}");
        }
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[DataQualityIssue] {
        &self.issues
    }

    /// Format the issues into a structured string for the log file
    pub fn format_report(&self, title: &str) -> String {
        let mut report = String::new();

        report.push_str("=============================\n");
        report.push_str(&format!("{title}\n"));
        report.push_str(&format!("Generated at: {}\n\n", utc_timestamp()));
        report.push_str(&format!("Total issues: {}\n\n", self.issues.len()));

        for issue in &self.issues {
            let level = if issue.is_error() { "ERROR" } else { "WARN" };
            report.push_str(&format!("  - [{level}] {issue}\n"));
        }

        report
    }

    /// Append the report to the given log file; nothing is written when empty.
    pub fn write_to_log(&self, log_file: &Path, title: &str) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        write_error_to_log(log_file, "Data Quality Report", &self.format_report(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_report_lists_every_issue() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DataQualityIssue::MalformedRow { row: 12 });
        diagnostics.push(DataQualityIssue::IncompleteRow {
            row: 14,
            columns: vec!["unit", "result"],
        });

        let report = diagnostics.format_report("检验报告");
        assert!(report.contains("Total issues: 2"));
        assert!(report.contains("[ERROR] row 12: cells do not match"));
        assert!(report.contains("[WARN] row 14"));
        assert!(report.contains("\"unit\", \"result\""));
    }

    #[test]
    fn test_empty_diagnostics_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("errors.log");
        Diagnostics::new().write_to_log(&log, "检验报告").unwrap();
        assert!(!log.exists());
    }

    #[test]
    fn test_write_to_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("errors.log");
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DataQualityIssue::MissingFile {
            file: "eye.png".to_string(),
        });

        diagnostics.write_to_log(&log, "first").unwrap();
        diagnostics.write_to_log(&log, "second").unwrap();

        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content.matches("Data Quality Report").count(), 2);
        assert!(content.contains("eye.png"));
    }
}
