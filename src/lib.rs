//! pom-guardian - Version policy enforcement for Maven build descriptors
//!
//! CDD Principle: Clean Architecture - Library interface serves as the application layer
//! - Line-tracking XML parsing and path queries form the infrastructure core
//! - Checkers evaluate declarative policy tables against parsed documents
//! - PomValidator coordinates discovery, checking and reporting for callers

pub mod checks;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod query;
pub mod report;
pub mod xml;

// Re-export main types for convenient access
pub use domain::violations::{
    CheckerOutcome, FileOutcome, GuardianError, GuardianResult, ValidationRun,
    ValidationSummary, ViolationRecord, ViolationReport,
};

pub use checks::{Checker, Location, Policy, PolicyKind, RELEASE_CHECKER, VERSIONS_CHECKER};

pub use config::{CheckerConfig, GuardianConfig, LocationConfig, PathConfig};

pub use discovery::DescriptorFinder;

pub use query::{query, PathExpression};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use xml::{parse, parse_bytes, parse_file, Document, ElementRef};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Main validator running the configured checkers over build descriptors
pub struct PomValidator {
    checkers: Vec<Checker>,
    finder: DescriptorFinder,
    report_formatter: ReportFormatter,
}

/// Options for validation runs
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Validate files in parallel
    pub parallel: bool,
    /// Stop at the first file that fails or errors
    pub fail_fast: bool,
    /// Restrict the run to these checker ids (all enabled checkers when empty)
    pub only_checkers: Vec<String>,
    /// Additional exclusion globs for directory discovery
    pub exclude_patterns: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            fail_fast: false,
            only_checkers: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl PomValidator {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: GuardianConfig) -> GuardianResult<Self> {
        config.validate()?;

        let checkers = config
            .enabled_checkers()
            .map(Checker::from_config)
            .collect::<GuardianResult<Vec<_>>>()?;
        let finder = DescriptorFinder::from_config(&config.paths)?;

        Ok(Self {
            checkers,
            finder,
            report_formatter: ReportFormatter::default(),
        })
    }

    /// Create a validator with default configuration
    pub fn new() -> GuardianResult<Self> {
        Self::new_with_config(GuardianConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> GuardianResult<Self> {
        let config = GuardianConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn checkers(&self) -> &[Checker] {
        &self.checkers
    }

    /// Look up an enabled checker
    pub fn checker(&self, id: &str) -> Option<&Checker> {
        self.checkers.iter().find(|checker| checker.id() == id)
    }

    /// Run one checker against one file.
    ///
    /// Succeeds when the checker passes; violations surface as
    /// `GuardianError::PolicyViolation` carrying the aggregated report.
    pub fn check_file<P: AsRef<Path>>(&self, checker_id: &str, path: P) -> GuardianResult<()> {
        let checker = self.checker(checker_id).ok_or_else(|| {
            GuardianError::config(format!("Checker '{checker_id}' is not enabled"))
        })?;
        checker.check_file(path)
    }

    /// Run the selected checkers against one file, collecting their outcomes
    pub fn validate_file<P: AsRef<Path>>(
        &self,
        path: P,
        only_checkers: &[String],
    ) -> GuardianResult<FileOutcome> {
        let path = path.as_ref();
        let document = parse_file(path)?;
        let source = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        let outcomes = self
            .selected_checkers(only_checkers)
            .map(|checker| CheckerOutcome {
                checker: checker.id().to_string(),
                report: checker.check_document(&document, Some(&source)),
            })
            .collect();

        Ok(FileOutcome::checked(path.to_path_buf(), outcomes))
    }

    /// Validate every descriptor found under `paths`
    pub fn validate_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &ValidationOptions,
    ) -> GuardianResult<ValidationRun> {
        let start_time = Instant::now();

        for id in &options.only_checkers {
            if self.checker(id).is_none() {
                return Err(GuardianError::config(format!(
                    "Checker '{id}' is not enabled"
                )));
            }
        }

        let mut finder = self.finder.clone();
        for pattern in &options.exclude_patterns {
            finder.add_exclude(pattern)?;
        }
        let files = finder.find(paths);
        tracing::debug!("Validating {} descriptor file(s)", files.len());

        let outcomes = if options.parallel && !options.fail_fast && files.len() > 1 {
            self.validate_parallel(&files, &options.only_checkers)
        } else {
            self.validate_sequential(&files, options)
        };

        let mut run = ValidationRun::new();
        for outcome in outcomes {
            run.add_outcome(outcome);
        }
        run.set_execution_time(start_time.elapsed().as_millis() as u64);
        run.sort_outcomes();

        Ok(run)
    }

    /// Format a validation run for output
    pub fn format_run(&self, run: &ValidationRun, format: OutputFormat) -> GuardianResult<String> {
        self.report_formatter.format_run(run, format)
    }

    /// Write a formatted run to `writer`
    pub fn write_run<W: std::io::Write>(
        &self,
        run: &ValidationRun,
        format: OutputFormat,
        writer: W,
    ) -> GuardianResult<()> {
        self.report_formatter.write_run(run, format, writer)
    }

    fn selected_checkers<'a>(
        &'a self,
        only_checkers: &'a [String],
    ) -> impl Iterator<Item = &'a Checker> + 'a {
        self.checkers.iter().filter(move |checker| {
            only_checkers.is_empty() || only_checkers.iter().any(|id| id == checker.id())
        })
    }

    fn outcome_for(&self, path: &Path, only_checkers: &[String]) -> FileOutcome {
        match self.validate_file(path, only_checkers) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Failed to check {}: {}", path.display(), e);
                FileOutcome::errored(path.to_path_buf(), &e)
            }
        }
    }

    fn validate_sequential(&self, files: &[PathBuf], options: &ValidationOptions) -> Vec<FileOutcome> {
        let mut outcomes = Vec::new();

        for path in files {
            let outcome = self.outcome_for(path, &options.only_checkers);
            let failed = outcome.has_error() || outcome.has_violations();
            outcomes.push(outcome);

            if failed && options.fail_fast {
                tracing::debug!("Stopping after {} (fail fast)", path.display());
                break;
            }
        }

        outcomes
    }

    fn validate_parallel(&self, files: &[PathBuf], only_checkers: &[String]) -> Vec<FileOutcome> {
        files
            .par_iter()
            .map(|path| self.outcome_for(path, only_checkers))
            .collect()
    }
}

/// Convenience function to validate paths with default settings
pub fn validate_paths<P: AsRef<Path>>(paths: &[P]) -> GuardianResult<ValidationRun> {
    let validator = PomValidator::new()?;
    validator.validate_paths(paths, &ValidationOptions::default())
}

/// Run the built-in release checker on one file
pub fn release_check<P: AsRef<Path>>(path: P) -> GuardianResult<()> {
    Checker::release()?.check_file(path)
}

/// Run the built-in version indirection checker on one file
pub fn versions_check<P: AsRef<Path>>(path: P) -> GuardianResult<()> {
    Checker::versions()?.check_file(path)
}
