//! Config + manifest loading shared by `build`, `check` and `list`.

use crate::cli::args::SelectArgs;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tmplpack_core::{BuildConfig, BuildError, Manifest, Selection, TargetConfig, TemplateDescriptor};
use tracing::warn;

/// One target, its manifest and the templates selected from it.
pub(crate) struct TargetPlan {
    pub target: TargetConfig,
    pub output_dir: PathBuf,
    pub templates: Vec<TemplateDescriptor>,
    /// Manifest entries left out by `--category` / `--only`.
    pub skipped: usize,
}

impl TargetPlan {
    pub fn ids(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.id.as_str()).collect()
    }
}

pub(crate) fn load_config(path: Option<&Path>, dist: Option<&Path>) -> Result<BuildConfig> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let mut config = BuildConfig::discover(path, &cwd)?;
    if let Some(d) = dist {
        config.dist = cwd.join(d);
    }
    Ok(config)
}

/// Resolve the selected targets and templates.
///
/// Optional targets whose root is missing are skipped. With `--only`, a
/// target whose manifest lists none of the ids is left out; an id listed by
/// no target is an error.
pub(crate) fn plan_targets(config: &BuildConfig, select: &SelectArgs) -> Result<Vec<TargetPlan>> {
    let mut plans = Vec::new();
    let mut found_ids = Vec::new();

    for target in config.select_targets(&select.targets)? {
        if target.optional && !target.root.exists() {
            warn!(
                name = %target.name,
                root = %target.root.display(),
                "skipping optional target: root not found"
            );
            continue;
        }

        let manifest = Manifest::load(&target.manifest_path())?;
        let ids: Vec<String> = select
            .ids
            .iter()
            .filter(|id| manifest.get(id).is_some())
            .cloned()
            .collect();
        if !select.ids.is_empty() && ids.is_empty() {
            continue;
        }
        found_ids.extend(ids.iter().cloned());

        let selection = Selection {
            categories: select.categories.clone(),
            ids,
        };
        let templates: Vec<_> = manifest.select(&selection)?.into_iter().cloned().collect();
        plans.push(TargetPlan {
            output_dir: config.output_dir(target),
            target: target.clone(),
            skipped: manifest.templates().len() - templates.len(),
            templates,
        });
    }

    if let Some(missing) = select.ids.iter().find(|id| !found_ids.contains(id)) {
        return Err(BuildError::Config {
            reason: format!("template '{missing}' is not listed in any selected manifest"),
        }
        .into());
    }
    Ok(plans)
}
