//! Core domain models for version policy violations and validation results
//!
//! CDD Principle: Rich Domain Models - Violations are value objects, reports are aggregates
//! - ViolationRecord pins one offending declaration to its source line
//! - ViolationReport aggregates all records of one failed policy location
//! - ValidationRun collects per-file outcomes for a whole invocation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single policy violation at one declaration in a build descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// `group:artifact:version` coordinate of the enclosing declaration
    pub coordinate: String,
    /// Line number (1-indexed) of the offending element's start tag
    pub line: Option<u32>,
    /// Column number (1-indexed); element positions never carry one
    pub column: Option<u32>,
}

impl ViolationRecord {
    /// Create a record without position information
    pub fn new(coordinate: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.into(),
            line: None,
            column: None,
        }
    }

    /// Set the source line
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the source column
    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    /// Format the record as one report line, without the trailing newline
    pub fn format_line(&self, source: Option<&Path>) -> String {
        let mut line = self.coordinate.clone();
        if let Some(number) = self.line {
            line.push_str(&format!(" on line {number}"));
        }
        if let Some(column) = self.column {
            line.push_str(&format!(" in column {column}"));
        }
        if let Some(path) = source {
            line.push_str(&format!(" in file {}", path.display()));
        }
        line
    }
}

/// All violations found at one policy location of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// File the records were found in
    pub source: Option<PathBuf>,
    /// Human-readable description of the failed policy
    pub description: String,
    /// Offending declarations in document order
    pub records: Vec<ViolationRecord>,
}

impl ViolationReport {
    /// Assemble a report. Callers only raise a failure for non-empty records.
    pub fn new(
        source: Option<PathBuf>,
        description: impl Into<String>,
        records: Vec<ViolationRecord>,
    ) -> Self {
        Self {
            source,
            description: description.into(),
            records,
        }
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.description)?;
        for record in &self.records {
            writeln!(f, "{}", record.format_line(self.source.as_deref()))?;
        }
        Ok(())
    }
}

/// Result of running one checker against one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerOutcome {
    /// Identifier of the checker (e.g. `release`, `versions`)
    pub checker: String,
    /// Report of the first failing location, if any
    pub report: Option<ViolationReport>,
}

impl CheckerOutcome {
    pub fn passed(&self) -> bool {
        self.report.is_none()
    }
}

/// Result of validating one file with every enabled checker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub checkers: Vec<CheckerOutcome>,
    /// Parse or IO failure that aborted the file's run
    pub error: Option<String>,
}

impl FileOutcome {
    /// Outcome for a file whose checks completed
    pub fn checked(path: PathBuf, checkers: Vec<CheckerOutcome>) -> Self {
        Self {
            path,
            checkers,
            error: None,
        }
    }

    /// Outcome for a file that could not be read or parsed
    pub fn errored(path: PathBuf, error: &GuardianError) -> Self {
        Self {
            path,
            checkers: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Reports of all failed checkers
    pub fn reports(&self) -> impl Iterator<Item = &ViolationReport> {
        self.checkers.iter().filter_map(|c| c.report.as_ref())
    }

    pub fn has_violations(&self) -> bool {
        self.checkers.iter().any(|c| !c.passed())
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary statistics for a validation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Total number of files checked
    pub total_files: usize,
    /// Files with at least one failed checker
    pub failed_files: usize,
    /// Files that could not be read or parsed
    pub errored_files: usize,
    /// Total number of violation records across all reports
    pub total_records: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// Outcomes of validating a set of files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRun {
    pub files: Vec<FileOutcome>,
    pub summary: ValidationSummary,
}

impl ValidationRun {
    /// Create a new empty run
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
        }
    }

    /// Add a file outcome, updating the summary
    pub fn add_outcome(&mut self, outcome: FileOutcome) {
        self.summary.total_files += 1;
        if outcome.has_error() {
            self.summary.errored_files += 1;
        }
        if outcome.has_violations() {
            self.summary.failed_files += 1;
        }
        self.summary.total_records += outcome.reports().map(|r| r.records.len()).sum::<usize>();
        self.files.push(outcome);
    }

    /// Whether any checker failed on any file
    pub fn has_violations(&self) -> bool {
        self.summary.failed_files > 0
    }

    /// Whether any file could not be read or parsed
    pub fn has_errors(&self) -> bool {
        self.summary.errored_files > 0
    }

    /// Process exit code: 2 for errors, 1 for violations, 0 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            2
        } else if self.has_violations() {
            1
        } else {
            0
        }
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Sort outcomes by path for consistent output
    pub fn sort_outcomes(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

impl Default for ValidationRun {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during validation
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not well-formed XML
    #[error("Malformed XML at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    /// Pattern or path expression compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// A checker found violations
    #[error("{0}")]
    PolicyViolation(Box<ViolationReport>),
}

impl GuardianError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an IO error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed input error
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            line,
            message: message.into(),
        }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Wrap a violation report
    pub fn violation(report: ViolationReport) -> Self {
        Self::PolicyViolation(Box::new(report))
    }

    /// Whether this error signals a policy failure rather than an internal one
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::PolicyViolation(_))
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_policy_violation() {
            1
        } else {
            2
        }
    }
}

/// Result type for Guardian operations
pub type GuardianResult<T> = Result<T, GuardianError>;
