//! Paths left out of template archives.

use crate::error::{BuildError, BuildResult};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Directory names never descended into (dependency caches, virtualenvs).
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".venv"];

/// File names never archived (OS metadata).
pub const EXCLUDED_FILES: &[&str] = &[".DS_Store"];

/// Exclusion rules: the built-in names plus optional extra globs.
///
/// Globs are matched against the path relative to the template directory,
/// with `/` separators.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    extra: GlobSet,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            extra: GlobSet::empty(),
        }
    }
}

impl IgnoreRules {
    /// Built-in rules plus `patterns`.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> BuildResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for p in patterns {
            let glob = Glob::new(p.as_ref()).map_err(|e| {
                BuildError::config(format!("invalid exclude pattern '{}': {e}", p.as_ref()))
            })?;
            builder.add(glob);
        }
        let extra = builder
            .build()
            .map_err(|e| BuildError::config(format!("invalid exclude patterns: {e}")))?;
        Ok(Self { extra })
    }

    /// Whether a directory at `rel_path` (named `name`) is pruned.
    pub fn skip_dir(&self, name: &str, rel_path: &str) -> bool {
        EXCLUDED_DIRS.contains(&name) || self.extra.is_match(rel_path)
    }

    /// Whether a file at `rel_path` (named `name`) is left out.
    pub fn skip_file(&self, name: &str, rel_path: &str) -> bool {
        EXCLUDED_FILES.contains(&name) || self.extra.is_match(rel_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_exclusions() {
        let rules = IgnoreRules::default();
        assert!(rules.skip_dir("node_modules", "node_modules"));
        assert!(rules.skip_dir("node_modules", "packages/a/node_modules"));
        assert!(rules.skip_dir(".venv", ".venv"));
        assert!(rules.skip_file(".DS_Store", "src/.DS_Store"));

        assert!(!rules.skip_dir("src", "src"));
        assert!(!rules.skip_dir(".actor", ".actor"));
        assert!(!rules.skip_file(".gitignore", ".gitignore"));
        assert!(!rules.skip_file("node_modules.txt", "node_modules.txt"));
    }

    #[test]
    fn extra_globs_match_relative_paths() {
        let rules = IgnoreRules::with_patterns(&["**/__pycache__", "*.pyc", "storage/**"]).unwrap();
        assert!(rules.skip_dir("__pycache__", "src/__pycache__"));
        assert!(rules.skip_file("main.pyc", "main.pyc"));
        assert!(rules.skip_file("x.json", "storage/datasets/x.json"));
        assert!(!rules.skip_file("main.py", "src/main.py"));
        assert_eq!(rules.extra.len(), 3);
    }

    #[test]
    fn invalid_glob_is_configuration_error() {
        let err = IgnoreRules::with_patterns(&["a[b"]).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("a[b"));
    }
}
