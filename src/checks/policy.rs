//! Version policies and their evaluation over matched elements
//!
//! CDD Principle: Domain Service - Policies are a closed set of rules dispatched by kind
//! - Pattern policies compare an element's raw text against a regex
//! - Presence policies reject the element outright
//! - Every violation is attributed to the enclosing declaration and the element's own line

use super::coordinate::describe;
use crate::domain::violations::{GuardianError, GuardianResult, ViolationRecord};
use crate::xml::ElementRef;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Snapshot marker anywhere in a value, e.g. `1.0-SNAPSHOT` or `1.0-SNAPSHOT-jdk8`
pub const SNAPSHOT_PATTERN: &str = r"-SNAPSHOT";

/// A value built around a single `${property}` reference
pub const PROPERTY_REFERENCE_PATTERN: &str = r"^.*\$\{[A-Za-z0-9\-.]+\}.*$";

lazy_static! {
    static ref SNAPSHOT_REGEX: Regex =
        Regex::new(SNAPSHOT_PATTERN).expect("snapshot pattern is a valid regex");
    static ref PROPERTY_REFERENCE_REGEX: Regex =
        Regex::new(PROPERTY_REFERENCE_PATTERN).expect("property reference pattern is a valid regex");
}

/// The kinds of policy a location can enforce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Text must not match the pattern
    ForbidPattern,
    /// Text must match the pattern
    RequirePattern,
    /// The element must not exist
    ForbidPresence,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForbidPattern => "forbid_pattern",
            Self::RequirePattern => "require_pattern",
            Self::ForbidPresence => "forbid_presence",
        }
    }

    /// Whether this kind is driven by a regex
    pub fn uses_pattern(self) -> bool {
        !matches!(self, Self::ForbidPresence)
    }

    /// Built-in pattern source for pattern-driven kinds
    pub fn default_pattern(self) -> Option<&'static str> {
        match self {
            Self::ForbidPattern => Some(SNAPSHOT_PATTERN),
            Self::RequirePattern => Some(PROPERTY_REFERENCE_PATTERN),
            Self::ForbidPresence => None,
        }
    }
}

/// A compiled policy
#[derive(Debug, Clone)]
pub enum Policy {
    ForbidPattern(Regex),
    RequirePattern(Regex),
    ForbidPresence,
}

impl Policy {
    /// Reject unreleased versions
    pub fn forbid_snapshots() -> Self {
        Self::ForbidPattern(SNAPSHOT_REGEX.clone())
    }

    /// Require a `${property}` reference
    pub fn require_property_reference() -> Self {
        Self::RequirePattern(PROPERTY_REFERENCE_REGEX.clone())
    }

    /// Compile a policy of the given kind, using the built-in pattern when
    /// `pattern` is `None`
    pub fn compile(kind: PolicyKind, pattern: Option<&str>) -> GuardianResult<Self> {
        let compile = |source: &str| {
            Regex::new(source)
                .map_err(|e| GuardianError::pattern(format!("Invalid regex '{source}': {e}")))
        };

        match (kind, pattern) {
            (PolicyKind::ForbidPattern, None) => Ok(Self::forbid_snapshots()),
            (PolicyKind::RequirePattern, None) => Ok(Self::require_property_reference()),
            (PolicyKind::ForbidPattern, Some(source)) => Ok(Self::ForbidPattern(compile(source)?)),
            (PolicyKind::RequirePattern, Some(source)) => {
                Ok(Self::RequirePattern(compile(source)?))
            }
            (PolicyKind::ForbidPresence, None) => Ok(Self::ForbidPresence),
            (PolicyKind::ForbidPresence, Some(_)) => Err(GuardianError::pattern(
                "forbid_presence policies do not take a pattern",
            )),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::ForbidPattern(_) => PolicyKind::ForbidPattern,
            Self::RequirePattern(_) => PolicyKind::RequirePattern,
            Self::ForbidPresence => PolicyKind::ForbidPresence,
        }
    }

    /// Whether `text` breaks this policy
    pub fn is_violated_by(&self, text: &str) -> bool {
        match self {
            Self::ForbidPattern(regex) => regex.is_match(text),
            Self::RequirePattern(regex) => !regex.is_match(text),
            Self::ForbidPresence => true,
        }
    }
}

/// Evaluate `policy` over matched elements, returning one record per violator
pub fn evaluate(nodes: &[ElementRef<'_>], policy: &Policy) -> Vec<ViolationRecord> {
    nodes
        .iter()
        .filter(|node| policy.is_violated_by(&node.text_content()))
        .map(|node| {
            let declaration = node.parent().unwrap_or(*node);
            let line = node.line();
            tracing::debug!("Adding artifact on line: [{}]", line);
            ViolationRecord::new(describe(&declaration)).with_line(line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{query, PathExpression};
    use crate::xml::parse_bytes;
    use rstest::rstest;

    #[rstest]
    #[case("1.0-SNAPSHOT", true)]
    #[case("2.0-SNAPSHOT", true)]
    #[case("${foo}-SNAPSHOT", true)]
    #[case("1.0", false)]
    #[case("${some.version}", false)]
    #[case("1.0-snapshot", false)]
    #[case("", false)]
    #[case("1.0-SNAPSHOT-jdk8", true)]
    #[case("2.0-SNAPSHOT.1", true)]
    #[case("\n    1.0-SNAPSHOT\n", true)]
    #[case("SNAPSHOT", false)]
    fn test_forbid_snapshots(#[case] value: &str, #[case] violates: bool) {
        assert_eq!(Policy::forbid_snapshots().is_violated_by(value), violates);
    }

    #[rstest]
    #[case("${app.version}", false)]
    #[case("rel-${app.version}", false)]
    #[case("${app-core.version}.Final", false)]
    #[case("1.2.3", true)]
    #[case("${}", true)]
    #[case("$app.version", true)]
    #[case("", true)]
    #[case("\n  ${app.version}\n", true)]
    fn test_require_property_reference(#[case] value: &str, #[case] violates: bool) {
        assert_eq!(
            Policy::require_property_reference().is_violated_by(value),
            violates
        );
    }

    #[rstest]
    #[case("1.0")]
    #[case("${app.version}")]
    #[case("")]
    fn test_forbid_presence_ignores_content(#[case] value: &str) {
        assert!(Policy::ForbidPresence.is_violated_by(value));
    }

    #[test]
    fn test_compile() {
        assert_eq!(
            Policy::compile(PolicyKind::ForbidPattern, None).unwrap().kind(),
            PolicyKind::ForbidPattern
        );
        let custom = Policy::compile(PolicyKind::ForbidPattern, Some("-RC\\d+$")).unwrap();
        assert!(custom.is_violated_by("1.0-RC1"));
        assert!(Policy::compile(PolicyKind::RequirePattern, Some("(")).is_err());
        assert!(Policy::compile(PolicyKind::ForbidPresence, Some(".*")).is_err());
    }

    #[test]
    fn test_evaluate_attributes_parent_and_own_line() {
        let doc = parse_bytes(
            br#"<project>
  <dependencies>
    <dependency>
      <groupId>org.acme</groupId>
      <artifactId>core</artifactId>
      <version>1.0</version>
    </dependency>
    <dependency>
      <groupId>org.acme</groupId>
      <artifactId>api</artifactId>
    </dependency>
  </dependencies>
</project>"#,
        )
        .unwrap();
        let expr = PathExpression::parse("/project/dependencies/dependency/version").unwrap();
        let records = evaluate(&query(&doc, &expr), &Policy::ForbidPresence);

        assert_eq!(
            records,
            vec![ViolationRecord::new("org.acme:core:1.0").with_line(6)]
        );
        assert!(records[0].column.is_none());
    }

    #[test]
    fn test_evaluate_collects_every_violator() {
        let doc = parse_bytes(
            b"<project>\n<properties>\n<a>1-SNAPSHOT</a>\n<b>1</b>\n<c>2-SNAPSHOT</c>\n</properties>\n</project>",
        )
        .unwrap();
        let expr = PathExpression::parse("/project/properties/*").unwrap();
        let records = evaluate(&query(&doc, &expr), &Policy::forbid_snapshots());

        let lines: Vec<_> = records.iter().filter_map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn test_evaluate_without_nodes() {
        assert!(evaluate(&[], &Policy::ForbidPresence).is_empty());
    }
}
