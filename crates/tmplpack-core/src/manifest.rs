//! Template manifest: the ordered list of packageable directories.
//!
//! The manifest is JSON, either a bare array of descriptors or an object
//! whose `templates` key holds that array. Only `id` and `category` are
//! interpreted; everything else is carried through untouched.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Component, Path};

/// One manifest entry.
///
/// Descriptive fields (`name`, `label`, `description`, `useCases`,
/// `skipTests`, ...) stay in `extra` as raw JSON; the accessors below read
/// them and treat a value of an unexpected type as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateDescriptor {
    /// Directory name under the source root.
    pub id: String,
    /// Selection tag; not used by the archive builder.
    pub category: String,
    /// Pass-through metadata.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateDescriptor {
    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.extra_str("name")
    }

    pub fn label(&self) -> Option<&str> {
        self.extra_str("label")
    }

    pub fn description(&self) -> Option<&str> {
        self.extra_str("description")
    }

    /// String entries of `useCases`; a bare string counts as one entry.
    pub fn use_cases(&self) -> Vec<&str> {
        match self.extra.get("useCases") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    /// `true` only for a JSON `true`.
    pub fn skip_tests(&self) -> bool {
        self.extra
            .get("skipTests")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Display label: `label`, then `name`, then the id.
    pub fn display_name(&self) -> &str {
        self.label().or(self.name()).unwrap_or(&self.id)
    }
}

/// Filter applied to a manifest before building.
///
/// Empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub categories: Vec<String>,
    pub ids: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.ids.is_empty()
    }
}

/// Validated manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    templates: Vec<TemplateDescriptor>,
}

impl Manifest {
    /// Build a manifest from descriptors, enforcing id shape and uniqueness.
    pub fn new(templates: Vec<TemplateDescriptor>) -> BuildResult<Self> {
        let mut seen = HashSet::new();
        for t in &templates {
            validate_id(&t.id)?;
            if !seen.insert(t.id.as_str()) {
                return Err(BuildError::DuplicateId { id: t.id.clone() });
            }
        }
        Ok(Self { templates })
    }

    /// Read and validate a manifest file.
    pub fn load(path: &Path) -> BuildResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| BuildError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json_slice(&bytes).map_err(|e| match e {
            BuildError::Manifest { reason, .. } => BuildError::Manifest {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a manifest from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> BuildResult<Self> {
        let malformed = |reason: String| BuildError::Manifest {
            path: "<memory>".into(),
            reason,
        };

        let doc: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let list = match doc {
            Value::Array(_) => doc,
            Value::Object(mut obj) => obj
                .remove("templates")
                .filter(Value::is_array)
                .ok_or_else(|| malformed("object manifest must have a `templates` array".into()))?,
            _ => return Err(malformed("expected an array or an object".into())),
        };

        let templates: Vec<TemplateDescriptor> =
            serde_json::from_value(list).map_err(|e| malformed(e.to_string()))?;
        Self::new(templates)
    }

    pub fn templates(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&TemplateDescriptor> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Ids in manifest order.
    pub fn ids(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.id.clone()).collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.templates
            .iter()
            .map(|t| t.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Descriptors matching `selection`, in manifest order.
    ///
    /// An explicitly requested id that the manifest does not list is an error.
    pub fn select(&self, selection: &Selection) -> BuildResult<Vec<&TemplateDescriptor>> {
        for id in &selection.ids {
            if self.get(id).is_none() {
                return Err(BuildError::config(format!(
                    "template '{id}' is not listed in the manifest"
                )));
            }
        }

        Ok(self
            .templates
            .iter()
            .filter(|t| selection.categories.is_empty() || selection.categories.contains(&t.category))
            .filter(|t| selection.ids.is_empty() || selection.ids.contains(&t.id))
            .collect())
    }
}

/// Check that `id` is usable as a single directory / archive name.
pub fn validate_id(id: &str) -> BuildResult<()> {
    let invalid = |reason: &str| BuildError::InvalidId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("id is empty"));
    }
    if id.contains('/') || id.contains('\\') {
        return Err(invalid("id must not contain path separators"));
    }
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid("id must be a plain directory name")),
    }
}
