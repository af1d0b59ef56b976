//! Build descriptor discovery
//!
//! CDD Principle: Service Layer - DescriptorFinder decides which files get checked
//! - Explicit file arguments are always honoured
//! - Directories are walked for descriptor file names, skipping excluded globs

use crate::config::PathConfig;
use crate::domain::violations::{GuardianError, GuardianResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds build descriptors under a set of paths
#[derive(Debug, Clone)]
pub struct DescriptorFinder {
    file_names: Vec<String>,
    exclude: Vec<glob::Pattern>,
}

impl DescriptorFinder {
    /// Create a finder for the given file names and exclusion globs
    pub fn new(file_names: Vec<String>, exclude: &[String]) -> GuardianResult<Self> {
        let exclude = exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| {
                    GuardianError::pattern(format!("Invalid pattern '{pattern}': {e}"))
                })
            })
            .collect::<GuardianResult<Vec<_>>>()?;

        Ok(Self { file_names, exclude })
    }

    pub fn from_config(config: &PathConfig) -> GuardianResult<Self> {
        Self::new(config.file_names.clone(), &config.exclude)
    }

    /// Add an exclusion glob
    pub fn add_exclude(&mut self, pattern: &str) -> GuardianResult<()> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| GuardianError::pattern(format!("Invalid pattern '{pattern}': {e}")))?;
        self.exclude.push(pattern);
        Ok(())
    }

    /// Whether a path falls under an exclusion glob
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|pattern| pattern.matches_path(path))
    }

    fn is_descriptor(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.file_names.iter().any(|n| n == name))
    }

    /// Expand paths into descriptor files, sorted and de-duplicated.
    ///
    /// Files given directly are kept even when their name differs; missing
    /// paths are kept too so the caller reports them as IO failures.
    pub fn find<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                files.extend(self.find_in_directory(path));
            } else {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        files.dedup();
        files
    }

    fn find_in_directory(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry.path()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.is_descriptor(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }
}
