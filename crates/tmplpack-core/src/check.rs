//! Compare archives on disk with what a fresh build would produce.
//!
//! Archives are rebuilt in memory; neither the sources nor the output
//! directory are modified.

use crate::archive::{archive_file_name, sha256_prefixed, write_archive};
use crate::builder::{resolve_templates, BuildOptions};
use crate::collect::collect_files;
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStatus {
    UpToDate,
    Stale,
    Missing,
}

impl std::fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UpToDate => "up-to-date",
            Self::Stale => "stale",
            Self::Missing => "missing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveCheck {
    pub id: String,
    pub path: PathBuf,
    pub status: ArchiveStatus,
    pub expected_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub output_dir: PathBuf,
    pub archives: Vec<ArchiveCheck>,
    /// Files in the output directory that no selected id accounts for.
    pub unexpected: Vec<PathBuf>,
}

impl CheckReport {
    /// Every archive up to date and nothing extra.
    pub fn is_clean(&self) -> bool {
        self.unexpected.is_empty()
            && self
                .archives
                .iter()
                .all(|a| a.status == ArchiveStatus::UpToDate)
    }
}

/// Check the archives of `ids` in `output_dir` against `source_root`.
pub fn check_archives<S: AsRef<str>>(
    source_root: &Path,
    output_dir: &Path,
    ids: &[S],
    options: &BuildOptions,
) -> BuildResult<CheckReport> {
    let templates = resolve_templates(source_root, ids)?;

    let mut archives = Vec::with_capacity(templates.len());
    let mut expected_names = HashSet::new();
    for t in &templates {
        let files = collect_files(&t.id, &t.dir, &options.ignore)?;
        let (_, summary) = write_archive(&t.id, &files, options.epoch_secs, std::io::sink())?;

        let name = archive_file_name(&t.id);
        let path = output_dir.join(&name);
        expected_names.insert(name);

        let actual_sha256 = match fs::read(&path) {
            Ok(bytes) => Some(sha256_prefixed(&bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(BuildError::io(&path, e)),
        };
        let status = match &actual_sha256 {
            None => ArchiveStatus::Missing,
            Some(actual) if *actual == summary.sha256 => ArchiveStatus::UpToDate,
            Some(_) => ArchiveStatus::Stale,
        };
        if status == ArchiveStatus::UpToDate {
            debug!(template = %t.id, "archive up to date");
        } else {
            warn!(template = %t.id, %status, path = %path.display(), "archive out of date");
        }

        archives.push(ArchiveCheck {
            id: t.id.clone(),
            path,
            status,
            expected_sha256: summary.sha256,
            actual_sha256,
        });
    }

    let unexpected = unexpected_entries(output_dir, &expected_names)?;
    Ok(CheckReport {
        output_dir: output_dir.to_path_buf(),
        archives,
        unexpected,
    })
}

fn unexpected_entries(output_dir: &Path, expected: &HashSet<String>) -> BuildResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(output_dir, e)),
    };

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(output_dir, e))?;
        let known = entry
            .file_name()
            .to_str()
            .is_some_and(|name| expected.contains(name));
        if !known {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}
