//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - ValidationRun (domain) is converted to various external representations
//! - The human format embeds each ViolationReport's own rendering verbatim
//! - Domain logic remains pure while supporting multiple presentation needs

use crate::domain::violations::{FileOutcome, GuardianError, GuardianResult, ValidationRun};
use serde_json::Value as JsonValue;
use std::io::Write;

/// Supported output formats for validation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable report text
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions format for workflow integration
    GitHub,
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Maximum number of records to print per report
    pub max_records: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            max_records: None,
        }
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a validation run in the specified format
    pub fn format_run(&self, run: &ValidationRun, format: OutputFormat) -> GuardianResult<String> {
        match format {
            OutputFormat::Human => Ok(self.format_human(run)),
            OutputFormat::Json => self.format_json(run),
            OutputFormat::GitHub => Ok(self.format_github(run)),
        }
    }

    /// Write a formatted run to a writer
    pub fn write_run<W: Write>(
        &self,
        run: &ValidationRun,
        format: OutputFormat,
        mut writer: W,
    ) -> GuardianResult<()> {
        let formatted = self.format_run(run, format)?;
        writer
            .write_all(formatted.as_bytes())
            .map_err(|e| GuardianError::io("<output>", e))?;
        Ok(())
    }

    fn format_human(&self, run: &ValidationRun) -> String {
        let mut output = String::new();

        for outcome in &run.files {
            if let Some(error) = &outcome.error {
                output.push_str(&self.paint(&format!("{}: {}", outcome.path.display(), error), Tone::Error));
                output.push('\n');
                continue;
            }

            for checker in &outcome.checkers {
                let Some(report) = &checker.report else {
                    continue;
                };
                let header = format!("[{}] {}", checker.checker, outcome.path.display());
                output.push_str(&self.paint(&header, Tone::Failure));
                output.push('\n');

                match self.options.max_records {
                    Some(max) if report.records.len() > max => {
                        let mut truncated = report.clone();
                        truncated.records.truncate(max);
                        output.push_str(&truncated.to_string());
                        output.push_str(&format!(
                            "... and {} more\n",
                            report.records.len() - max
                        ));
                    }
                    _ => output.push_str(&report.to_string()),
                }
                output.push('\n');
            }
        }

        output.push_str(&self.format_summary(run));
        output
    }

    fn format_json(&self, run: &ValidationRun) -> GuardianResult<String> {
        let files: Vec<JsonValue> = run.files.iter().map(file_to_json).collect();

        let json_run = serde_json::json!({
            "files": files,
            "summary": {
                "total_files": run.summary.total_files,
                "failed_files": run.summary.failed_files,
                "errored_files": run.summary.errored_files,
                "total_records": run.summary.total_records,
                "execution_time_ms": run.summary.execution_time_ms,
                "validated_at": run.summary.validated_at.to_rfc3339()
            }
        });

        serde_json::to_string_pretty(&json_run)
            .map_err(|e| GuardianError::config(format!("JSON serialization failed: {e}")))
    }

    fn format_github(&self, run: &ValidationRun) -> String {
        let mut output = String::new();

        for outcome in &run.files {
            let file = outcome.path.display();
            if let Some(error) = &outcome.error {
                output.push_str(&format!("::error file={file},title=pom-guardian::{error}\n"));
                continue;
            }
            for checker in &outcome.checkers {
                let Some(report) = &checker.report else {
                    continue;
                };
                for record in &report.records {
                    let line = record
                        .line
                        .map(|line| format!(",line={line}"))
                        .unwrap_or_default();
                    output.push_str(&format!(
                        "::error file={file}{line},title={}::{}: {}\n",
                        checker.checker, report.description, record.coordinate
                    ));
                }
            }
        }

        output
    }

    fn format_summary(&self, run: &ValidationRun) -> String {
        let summary = &run.summary;
        let seconds = summary.execution_time_ms as f64 / 1000.0;

        if !run.has_violations() && !run.has_errors() {
            let line = format!(
                "No version policy violations found in {} file{} ({:.2}s)",
                summary.total_files,
                plural(summary.total_files),
                seconds
            );
            return format!("{}\n", self.paint(&line, Tone::Success));
        }

        let line = format!(
            "Checked {} file{}: {} failed, {} errored, {} violation{} ({:.2}s)",
            summary.total_files,
            plural(summary.total_files),
            summary.failed_files,
            summary.errored_files,
            summary.total_records,
            plural(summary.total_records),
            seconds
        );
        let tone = if run.has_errors() { Tone::Error } else { Tone::Failure };
        format!("{}\n", self.paint(&line, tone))
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.options.use_colors {
            return text.to_string();
        }
        colorize(text, tone)
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Success,
    Failure,
    Error,
}

#[cfg(feature = "colors")]
fn colorize(text: &str, tone: Tone) -> String {
    use colored::Colorize;

    match tone {
        Tone::Success => text.green().to_string(),
        Tone::Failure => text.yellow().bold().to_string(),
        Tone::Error => text.red().bold().to_string(),
    }
}

#[cfg(not(feature = "colors"))]
fn colorize(text: &str, _tone: Tone) -> String {
    text.to_string()
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn file_to_json(outcome: &FileOutcome) -> JsonValue {
    let checkers: Vec<JsonValue> = outcome
        .checkers
        .iter()
        .map(|checker| {
            serde_json::json!({
                "checker": checker.checker,
                "passed": checker.passed(),
                "report": checker.report.as_ref().map(|report| serde_json::json!({
                    "description": report.description,
                    "records": report.records
                }))
            })
        })
        .collect();

    serde_json::json!({
        "path": outcome.path.display().to_string(),
        "error": outcome.error,
        "checkers": checkers
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::violations::{CheckerOutcome, ViolationRecord, ViolationReport};
    use std::path::PathBuf;

    fn create_test_run() -> ValidationRun {
        let path = PathBuf::from("/work/pom.xml");
        let report = ViolationReport::new(
            Some(path.clone()),
            "You must not use snapshots in properties",
            vec![
                ViolationRecord::new("[unknown-groupid]:[unknown-artifactid]:[unknown-version]")
                    .with_line(4),
                ViolationRecord::new("[unknown-groupid]:[unknown-artifactid]:[unknown-version]")
                    .with_line(5),
            ],
        );

        let mut run = ValidationRun::new();
        run.add_outcome(FileOutcome::checked(
            path,
            vec![
                CheckerOutcome {
                    checker: "release".to_string(),
                    report: Some(report),
                },
                CheckerOutcome {
                    checker: "versions".to_string(),
                    report: None,
                },
            ],
        ));
        run.set_execution_time(1500);
        run
    }

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_human_format_embeds_report() {
        let output = plain().format_run(&create_test_run(), OutputFormat::Human).unwrap();

        assert!(output.contains("[release] /work/pom.xml\n"));
        assert!(output.contains(
            "You must not use snapshots in properties:\n[unknown-groupid]:[unknown-artifactid]:[unknown-version] on line 4 in file /work/pom.xml\n"
        ));
        assert!(output.contains("Checked 1 file: 1 failed, 0 errored, 2 violations"));
        assert!(!output.contains("[versions]"));
    }

    #[test]
    fn test_human_format_truncates_records() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            max_records: Some(1),
        });
        let output = formatter.format_run(&create_test_run(), OutputFormat::Human).unwrap();

        assert!(output.contains("on line 4"));
        assert!(!output.contains("on line 5"));
        assert!(output.contains("... and 1 more"));
    }

    #[test]
    fn test_json_format() {
        let output = plain().format_run(&create_test_run(), OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();

        assert_eq!(json["files"].as_array().unwrap().len(), 1);
        let release = &json["files"][0]["checkers"][0];
        assert_eq!(release["checker"], "release");
        assert_eq!(release["passed"], false);
        assert_eq!(release["report"]["records"][0]["line"], 4);
        assert!(release["report"]["records"][0]["column"].is_null());
        assert_eq!(json["files"][0]["checkers"][1]["passed"], true);
        assert_eq!(json["summary"]["total_records"], 2);
    }

    #[test]
    fn test_github_format() {
        let output = plain().format_run(&create_test_run(), OutputFormat::GitHub).unwrap();

        assert_eq!(output.lines().count(), 2);
        assert!(output.starts_with("::error file=/work/pom.xml,line=4,title=release::"));
    }

    #[test]
    fn test_clean_run() {
        let mut run = ValidationRun::new();
        run.add_outcome(FileOutcome::checked(PathBuf::from("pom.xml"), Vec::new()));

        let output = plain().format_run(&run, OutputFormat::Human).unwrap();
        assert!(output.starts_with("No version policy violations found in 1 file"));
    }

    #[test]
    fn test_write_run() {
        let mut buffer = Vec::new();
        plain()
            .write_run(&create_test_run(), OutputFormat::GitHub, &mut buffer)
            .unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.ends_with('\n'));
    }
}
