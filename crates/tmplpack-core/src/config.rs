//! Build configuration (`tmplpack.yaml`).
//!
//! Every field is optional; without a file the defaults package
//! `templates/` (required) and `wrappers/` (optional) into `dist/`.

use crate::error::{BuildError, BuildResult};
use crate::ignore::IgnoreRules;
use crate::timestamps::{default_epoch, epoch_secs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "tmplpack.yaml";

/// Manifest file name inside a target root when `manifest` is not set.
pub const DEFAULT_MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Output root; each target gets `<dist>/<name>/`.
    #[serde(default = "default_dist")]
    pub dist: PathBuf,

    /// Timestamp written into archive headers and onto source files.
    #[serde(default = "default_epoch")]
    pub epoch: DateTime<Utc>,

    /// Reset on-disk mtimes of archived source files to `epoch`.
    #[serde(default = "default_true")]
    pub normalize_source_mtimes: bool,

    /// Extra glob patterns excluded from every archive.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,
}

/// One source root packaged into its own output directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Output subdirectory name, e.g. `templates`.
    pub name: String,
    /// Directory holding one subdirectory per template id.
    pub root: PathBuf,
    /// Manifest path; defaults to `<root>/manifest.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    /// Skip this target (with a warning) when `root` does not exist.
    #[serde(default)]
    pub optional: bool,
}

impl TargetConfig {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            manifest: None,
            optional: false,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.root.join(DEFAULT_MANIFEST_FILE))
    }
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

fn default_true() -> bool {
    true
}

fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig::new("templates", "templates"),
        TargetConfig {
            optional: true,
            ..TargetConfig::new("wrappers", "wrappers")
        },
    ]
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dist: default_dist(),
            epoch: default_epoch(),
            normalize_source_mtimes: true,
            exclude: Vec::new(),
            targets: default_targets(),
        }
    }
}

impl BuildConfig {
    /// Parse YAML. Relative paths are left as written.
    pub fn from_yaml_str(text: &str) -> BuildResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| BuildError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file and resolve relative paths against its directory.
    pub fn load(path: &Path) -> BuildResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BuildError::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    /// Load `path` if given, else `<cwd>/tmplpack.yaml` if present, else defaults.
    ///
    /// Relative paths in the defaults resolve against `cwd`.
    pub fn discover(path: Option<&Path>, cwd: &Path) -> BuildResult<Self> {
        if let Some(p) = path {
            return Self::load(&cwd.join(p));
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(Self::default().resolve_paths(cwd))
    }

    /// Rebase every relative path onto `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.dist = base.join(&self.dist);
        for t in &mut self.targets {
            t.root = base.join(&t.root);
            t.manifest = t.manifest.as_ref().map(|m| base.join(m));
        }
        self
    }

    pub fn validate(&self) -> BuildResult<()> {
        epoch_secs(&self.epoch)?;
        IgnoreRules::with_patterns(&self.exclude)?;

        let mut names = std::collections::HashSet::new();
        for t in &self.targets {
            crate::manifest::validate_id(&t.name)
                .map_err(|_| BuildError::config(format!("invalid target name '{}'", t.name)))?;
            if !names.insert(t.name.as_str()) {
                return Err(BuildError::config(format!("duplicate target '{}'", t.name)));
            }
        }
        Ok(())
    }

    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Targets named in `names` (all targets when empty), in config order.
    pub fn select_targets(&self, names: &[String]) -> BuildResult<Vec<&TargetConfig>> {
        for n in names {
            if self.target(n).is_none() {
                return Err(BuildError::config(format!("unknown target '{n}'")));
            }
        }
        Ok(self
            .targets
            .iter()
            .filter(|t| names.is_empty() || names.contains(&t.name))
            .collect())
    }

    /// Output directory of a target.
    pub fn output_dir(&self, target: &TargetConfig) -> PathBuf {
        self.dist.join(&target.name)
    }
}
