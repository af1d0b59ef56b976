//! Configuration loading and management for pom-guardian
//!
//! CDD Principle: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to compiled checkers at the boundary
//! - Default configuration reproduces the built-in location tables
//! - Configuration acts as a repository for checkers and discovery filters

use crate::checks::{
    PolicyKind, PROPERTY_REQUIRED_MESSAGE, RELEASE_CHECKER, SNAPSHOT_MESSAGE,
    VERSIONS_CHECKER, VERSION_FORBIDDEN_MESSAGE,
};
use crate::domain::violations::{GuardianError, GuardianResult};
use crate::query::PathExpression;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// File names searched for when no configuration path is given
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "pom_guardian.yaml",
    "pom_guardian.yml",
    ".pom_guardian.yaml",
];

/// Main configuration structure for pom-guardian
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Configuration format version
    pub version: String,
    /// Descriptor discovery configuration
    #[serde(default)]
    pub paths: PathConfig,
    /// Checkers in execution order
    pub checkers: Vec<CheckerConfig>,
}

/// Which files are treated as build descriptors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Exact file names to pick up when walking directories
    pub file_names: Vec<String>,
    /// Glob patterns for paths to skip
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            file_names: vec!["pom.xml".to_string()],
            exclude: vec![
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
        }
    }
}

/// A named, ordered table of policy locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Unique identifier of the checker
    pub id: String,
    /// Whether this checker runs
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Locations, evaluated in order
    pub locations: Vec<LocationConfig>,
}

/// One location of a checker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Identifier, unique across the configuration
    pub id: String,
    /// Absolute path expression selecting the elements to check
    pub path: String,
    /// Policy applied to each selected element
    pub policy: PolicyKind,
    /// Regex override for pattern policies
    #[serde(default)]
    pub pattern: Option<String>,
    /// Description heading the report when this location fails
    pub message: String,
}

impl LocationConfig {
    fn new(id: &str, path: &str, policy: PolicyKind, message: &str) -> Self {
        Self {
            id: id.to_string(),
            path: path.to_string(),
            policy,
            pattern: None,
            message: message.to_string(),
        }
    }

    /// Pattern in effect for this location
    pub fn effective_pattern(&self) -> Option<&str> {
        self.pattern
            .as_deref()
            .or_else(|| self.policy.default_pattern())
    }
}

impl GuardianConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GuardianResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GuardianError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GuardianError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GuardianResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GuardianError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the first default config file present in `dir`, or the defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> GuardianResult<Self> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.exists() {
                tracing::debug!("Using configuration {}", candidate.display());
                return Self::load_from_file(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Get default configuration with the built-in checkers
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            paths: PathConfig::default(),
            checkers: Self::default_checkers(),
        }
    }

    fn default_checkers() -> Vec<CheckerConfig> {
        use PolicyKind::*;

        let release = CheckerConfig {
            id: RELEASE_CHECKER.to_string(),
            enabled: true,
            locations: vec![
                LocationConfig::new(
                    "project_properties",
                    "/project/properties/*",
                    ForbidPattern,
                    SNAPSHOT_MESSAGE,
                ),
                LocationConfig::new(
                    "profile_properties",
                    "/project/profiles/profile/properties/*",
                    ForbidPattern,
                    SNAPSHOT_MESSAGE,
                ),
            ],
        };

        let versions = CheckerConfig {
            id: VERSIONS_CHECKER.to_string(),
            enabled: true,
            locations: vec![
                LocationConfig::new(
                    "dependency_management",
                    "/project/dependencyManagement/dependencies/dependency/version",
                    RequirePattern,
                    PROPERTY_REQUIRED_MESSAGE,
                ),
                LocationConfig::new(
                    "dependencies",
                    "/project/dependencies/dependency/version",
                    ForbidPresence,
                    VERSION_FORBIDDEN_MESSAGE,
                ),
                LocationConfig::new(
                    "profile_dependency_management",
                    "/project/profiles/profile/dependencyManagement/dependencies/dependency/version",
                    RequirePattern,
                    PROPERTY_REQUIRED_MESSAGE,
                ),
                LocationConfig::new(
                    "profile_dependencies",
                    "/project/profiles/profile/dependencies/dependency/version",
                    ForbidPresence,
                    VERSION_FORBIDDEN_MESSAGE,
                ),
                LocationConfig::new(
                    "plugins",
                    "/project/build/plugins/plugin/version",
                    ForbidPresence,
                    VERSION_FORBIDDEN_MESSAGE,
                ),
                LocationConfig::new(
                    "profile_plugins",
                    "/project/profiles/profile/build/plugins/plugin/version",
                    ForbidPresence,
                    VERSION_FORBIDDEN_MESSAGE,
                ),
            ],
        };

        vec![release, versions]
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> GuardianResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(GuardianError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.paths.file_names.is_empty() {
            return Err(GuardianError::config(
                "paths.file_names must name at least one descriptor file",
            ));
        }

        for pattern in &self.paths.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                GuardianError::config(format!("Invalid exclude pattern '{pattern}': {e}"))
            })?;
        }

        let mut checker_ids = HashSet::new();
        let mut location_ids = HashSet::new();
        for checker in &self.checkers {
            if !checker_ids.insert(checker.id.as_str()) {
                return Err(GuardianError::config(format!(
                    "Duplicate checker ID '{}'",
                    checker.id
                )));
            }

            for location in &checker.locations {
                if !location_ids.insert(location.id.as_str()) {
                    return Err(GuardianError::config(format!(
                        "Duplicate location ID '{}' in checker '{}'",
                        location.id, checker.id
                    )));
                }

                PathExpression::parse(&location.path).map_err(|e| {
                    GuardianError::config(format!(
                        "Invalid path in location '{}': {}",
                        location.id, e
                    ))
                })?;

                match (location.policy.uses_pattern(), &location.pattern) {
                    (true, Some(pattern)) => {
                        regex::Regex::new(pattern).map_err(|e| {
                            GuardianError::config(format!(
                                "Invalid regex pattern in location '{}': {}",
                                location.id, e
                            ))
                        })?;
                    }
                    (false, Some(_)) => {
                        return Err(GuardianError::config(format!(
                            "Location '{}' uses {} and cannot take a pattern",
                            location.id,
                            location.policy.as_str()
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Find a checker by id
    pub fn checker(&self, id: &str) -> Option<&CheckerConfig> {
        self.checkers.iter().find(|checker| checker.id == id)
    }

    /// All enabled checkers in order
    pub fn enabled_checkers(&self) -> impl Iterator<Item = &CheckerConfig> {
        self.checkers.iter().filter(|checker| checker.enabled)
    }

    /// Find a location by id together with its checker
    pub fn location(&self, id: &str) -> Option<(&CheckerConfig, &LocationConfig)> {
        self.checkers.iter().find_map(|checker| {
            checker
                .locations
                .iter()
                .find(|location| location.id == id)
                .map(|location| (checker, location))
        })
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> GuardianResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GuardianError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_true() -> bool {
    true
}
