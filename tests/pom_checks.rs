use pom_guardian::{
    release_check, versions_check, GuardianError, OutputFormat, PomValidator, ReportFormatter,
    ReportOptions, ValidationOptions, ViolationReport,
};
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const UNKNOWN_COORDINATE: &str = "[unknown-groupid]:[unknown-artifactid]:[unknown-version]";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn expect_report(result: Result<(), GuardianError>) -> ViolationReport {
    match result {
        Err(GuardianError::PolicyViolation(report)) => *report,
        other => panic!("expected a policy violation, got {other:?}"),
    }
}

#[test]
fn good_file_passes_both_checkers() {
    release_check(fixture("good.xml")).expect("release check passes");
    versions_check(fixture("good.xml")).expect("versions check passes");
}

#[test]
fn snapshot_properties_are_reported_together() {
    let report = expect_report(release_check(fixture("bad-property.xml")));

    assert_eq!(report.description, "You must not use snapshots in properties");
    let lines: Vec<_> = report.records.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![Some(5), Some(7)]);
    assert!(report
        .records
        .iter()
        .all(|r| r.coordinate == UNKNOWN_COORDINATE && r.column.is_none()));
    assert!(report.source.as_ref().is_some_and(|p| p.is_absolute()));
}

#[test]
fn snapshot_profile_property_is_reported() {
    let report = expect_report(release_check(fixture("bad-profile-property.xml")));

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].line, Some(10));
}

#[rstest]
#[case(
    "non-prop-not-allowed-in-depmgmt.xml",
    "dependencyManagement sections must use property placeholders for versions",
    "org.slf4j:slf4j-api:2.0.9",
    8
)]
#[case(
    "non-prop-not-allowed-in-profile-depmgmt.xml",
    "dependencyManagement sections must use property placeholders for versions",
    "commons-io:commons-io:2.15.1",
    11
)]
#[case(
    "version-not-allowed-in-deps.xml",
    "Versions must be inherited",
    "org.slf4j:slf4j-api:2.0.9",
    7
)]
#[case(
    "prop-not-allowed-in-deps.xml",
    "Versions must be inherited",
    "org.slf4j:slf4j-api:${slf4j.version}",
    7
)]
#[case(
    "version-not-allowed-in-plugins.xml",
    "Versions must be inherited",
    "org.apache.maven.plugins:maven-surefire-plugin:3.2.2",
    8
)]
#[case(
    "version-not-allowed-in-profile-deps.xml",
    "Versions must be inherited",
    "org.testcontainers:postgresql:1.19.3",
    10
)]
#[case(
    "version-not-allowed-in-profile-plugins.xml",
    "Versions must be inherited",
    "org.apache.maven.plugins:maven-gpg-plugin:3.1.0",
    11
)]
fn versions_checker_rejects(
    #[case] file: &str,
    #[case] description_prefix: &str,
    #[case] coordinate: &str,
    #[case] line: u32,
) {
    let report = expect_report(versions_check(fixture(file)));

    assert!(report.description.starts_with(description_prefix));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].coordinate, coordinate);
    assert_eq!(report.records[0].line, Some(line));

    // versions problems never trip the release checker
    release_check(fixture(file)).expect("release check passes");
}

#[test]
fn snapshot_property_on_line_four() {
    let temp_dir = TempDir::new().unwrap();
    let pom = temp_dir.path().join("pom.xml");
    fs::write(
        &pom,
        "<?xml version=\"1.0\"?>\n<project>\n  <properties>\n    <foo.version>2.0-SNAPSHOT</foo.version>\n  </properties>\n</project>\n",
    )
    .unwrap();

    let report = expect_report(release_check(&pom));

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].coordinate, UNKNOWN_COORDINATE);
    assert_eq!(report.records[0].line, Some(4));
    assert_eq!(report.records[0].column, None);
    assert!(report
        .to_string()
        .starts_with("You must not use snapshots in properties:\n"));
}

#[test]
fn wrapped_values_are_checked_untrimmed() {
    let temp_dir = TempDir::new().unwrap();
    let pom = temp_dir.path().join("pom.xml");
    fs::write(
        &pom,
        r#"<project>
  <properties>
    <foo.version>
      1.0-SNAPSHOT
    </foo.version>
    <bar.version>1.0-SNAPSHOT-jdk8</bar.version>
    <baz.version>2.0-SNAPSHOT.1</baz.version>
  </properties>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.acme</groupId>
        <artifactId>core</artifactId>
        <version>
          ${core.version}
        </version>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>
"#,
    )
    .unwrap();

    let report = expect_report(release_check(&pom));
    let lines: Vec<_> = report.records.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![Some(3), Some(6), Some(7)]);

    let report = expect_report(versions_check(&pom));
    assert!(report.description.starts_with("dependencyManagement sections"));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].line, Some(14));
}

#[test]
fn malformed_file_is_not_a_policy_violation() {
    let temp_dir = TempDir::new().unwrap();
    let pom = temp_dir.path().join("pom.xml");
    fs::write(&pom, "<project>\n<properties>\n</project>\n").unwrap();

    let err = release_check(&pom).unwrap_err();
    assert!(matches!(err, GuardianError::MalformedInput { .. }));
    assert_eq!(err.exit_code(), 2);

    let err = versions_check(temp_dir.path().join("missing.xml")).unwrap_err();
    assert!(matches!(err, GuardianError::Io { .. }));
}

#[test]
fn directory_run_over_fixtures() {
    let temp_dir = TempDir::new().unwrap();
    for (module, name) in [
        ("app", "good.xml"),
        ("lib", "bad-property.xml"),
        ("web", "version-not-allowed-in-plugins.xml"),
    ] {
        let dir = temp_dir.path().join(module);
        fs::create_dir_all(&dir).unwrap();
        fs::copy(fixture(name), dir.join("pom.xml")).unwrap();
    }

    let validator = PomValidator::new()
        .unwrap()
        .with_report_formatter(ReportFormatter::new(ReportOptions {
            use_colors: false,
            max_records: None,
        }));
    let run = validator
        .validate_paths(&[temp_dir.path()], &ValidationOptions::default())
        .unwrap();

    assert_eq!(run.summary.total_files, 3);
    assert_eq!(run.summary.failed_files, 2);
    assert_eq!(run.summary.total_records, 3);
    assert_eq!(run.exit_code(), 1);

    let human = validator.format_run(&run, OutputFormat::Human).unwrap();
    assert!(human.contains("[release]"));
    assert!(human.contains("[versions]"));
    assert!(human.contains("Checked 3 files: 2 failed, 0 errored, 3 violations"));
}
