//! Checkers: ordered tables of policy locations evaluated against one document
//!
//! CDD Principle: Domain Services - A checker maps fixed document locations to policies
//! - Locations are evaluated in order and the first failing location ends the run
//! - All violators at the failing location are reported together
//! - Checkers hold only compiled, immutable data and can be shared across threads

pub mod coordinate;
pub mod policy;

use crate::config::{CheckerConfig, GuardianConfig};
use crate::domain::violations::{GuardianError, GuardianResult, ViolationReport};
use crate::query::{query, PathExpression};
use crate::xml::{parse_file, Document};
use std::path::Path;

pub use coordinate::describe;
pub use policy::{evaluate, Policy, PolicyKind};

/// Identifier of the release-readiness checker
pub const RELEASE_CHECKER: &str = "release";
/// Identifier of the version indirection checker
pub const VERSIONS_CHECKER: &str = "versions";

pub const SNAPSHOT_MESSAGE: &str = "You must not use snapshots in properties";
pub const PROPERTY_REQUIRED_MESSAGE: &str =
    "dependencyManagement sections must use property placeholders for versions";
pub const VERSION_FORBIDDEN_MESSAGE: &str = "Versions must be inherited from dependency/plugin management sections; \"version\" tag found where it is not allowed";

/// One place in a document and the policy enforced there
#[derive(Debug, Clone)]
pub struct Location {
    pub id: String,
    pub path: PathExpression,
    pub policy: Policy,
    pub message: String,
}

impl Location {
    /// Evaluate this location, returning a report only when something violates
    pub fn check(&self, document: &Document, source: Option<&Path>) -> Option<ViolationReport> {
        let matches = query(document, &self.path);
        let records = evaluate(&matches, &self.policy);

        if records.is_empty() {
            return None;
        }

        tracing::debug!(
            "Location '{}' failed with {} violation(s)",
            self.id,
            records.len()
        );
        Some(ViolationReport::new(
            source.map(Path::to_path_buf),
            self.message.clone(),
            records,
        ))
    }
}

/// An ordered set of locations checked fail-fast
#[derive(Debug, Clone)]
pub struct Checker {
    id: String,
    locations: Vec<Location>,
}

impl Checker {
    /// Compile a checker from its configuration
    pub fn from_config(config: &CheckerConfig) -> GuardianResult<Self> {
        let locations = config
            .locations
            .iter()
            .map(|location| {
                let path = PathExpression::parse(&location.path)?;
                let policy = Policy::compile(location.policy, location.pattern.as_deref())
                    .map_err(|e| {
                        GuardianError::config(format!(
                            "Location '{}' of checker '{}': {}",
                            location.id, config.id, e
                        ))
                    })?;
                Ok(Location {
                    id: location.id.clone(),
                    path,
                    policy,
                    message: location.message.clone(),
                })
            })
            .collect::<GuardianResult<Vec<_>>>()?;

        Ok(Self {
            id: config.id.clone(),
            locations,
        })
    }

    /// Built-in checker rejecting snapshot versions in properties
    pub fn release() -> GuardianResult<Self> {
        Self::builtin(RELEASE_CHECKER)
    }

    /// Built-in checker requiring versions to go through properties
    pub fn versions() -> GuardianResult<Self> {
        Self::builtin(VERSIONS_CHECKER)
    }

    fn builtin(id: &str) -> GuardianResult<Self> {
        let config = GuardianConfig::default();
        let checker = config
            .checker(id)
            .ok_or_else(|| GuardianError::config(format!("Unknown checker '{id}'")))?;
        Self::from_config(checker)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Run every location in order, stopping at the first one that fails
    pub fn check_document(
        &self,
        document: &Document,
        source: Option<&Path>,
    ) -> Option<ViolationReport> {
        self.locations
            .iter()
            .find_map(|location| location.check(document, source))
    }

    /// Parse `path` and check it, surfacing violations as an error
    pub fn check_file<P: AsRef<Path>>(&self, path: P) -> GuardianResult<()> {
        let path = path.as_ref();
        let document = parse_file(path)?;
        let source = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        match self.check_document(&document, Some(&source)) {
            Some(report) => Err(GuardianError::violation(report)),
            None => Ok(()),
        }
    }
}
