//! Build runs: one deterministic archive per template directory.
//!
//! A run validates every requested id before touching the filesystem, then
//! recreates the output directory and writes `<id>.tar.gz` for each id in
//! order. The first failure aborts the run; archives already written for
//! earlier ids stay on disk.

use crate::archive::{archive_file_name, write_archive, ArchiveSummary};
use crate::collect::collect_files;
use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::ignore::IgnoreRules;
use crate::manifest::validate_id;
use crate::timestamps::{epoch_secs, normalize_mtimes, DEFAULT_EPOCH_SECS};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Knobs shared by build and check runs.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Seconds since the Unix epoch stored as every entry's mtime.
    pub epoch_secs: u64,
    /// Also reset the on-disk mtime of every archived source file.
    pub normalize_source_mtimes: bool,
    pub ignore: IgnoreRules,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            epoch_secs: DEFAULT_EPOCH_SECS,
            normalize_source_mtimes: true,
            ignore: IgnoreRules::default(),
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &BuildConfig) -> BuildResult<Self> {
        Ok(Self {
            epoch_secs: epoch_secs(&config.epoch)?,
            normalize_source_mtimes: config.normalize_source_mtimes,
            ignore: IgnoreRules::with_patterns(&config.exclude)?,
        })
    }
}

/// One archive written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    pub id: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub summary: ArchiveSummary,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub archives: Vec<ArchiveReport>,
}

/// A validated template: id and its directory.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedTemplate {
    pub(crate) id: String,
    pub(crate) dir: PathBuf,
}

/// Package `ids` from `source_root` into `output_dir`.
///
/// # Process
///
/// 1. Validate the source root and every id (nothing is written on failure)
/// 2. Delete and recreate `output_dir`
/// 3. Per id: collect files in sorted order, reset their mtimes, write
///    `<output_dir>/<id>.tar.gz`
///
/// # Errors
///
/// - Configuration: missing source root, invalid/duplicate/missing id,
///   id that is not a directory, `output_dir` containing `source_root` or
///   overlapping a template directory
/// - Io: output directory reset, source read, archive file write
/// - Archive: tar/gzip stream failure
pub fn build_archives<S: AsRef<str>>(
    source_root: &Path,
    output_dir: &Path,
    ids: &[S],
    options: &BuildOptions,
) -> BuildResult<BuildReport> {
    let templates = resolve_templates(source_root, ids)?;
    ensure_output_is_disjoint(source_root, output_dir, &templates)?;

    info!(
        source = %source_root.display(),
        output = %output_dir.display(),
        count = templates.len(),
        "starting build run"
    );

    reset_output_dir(output_dir)?;

    let mut archives = Vec::with_capacity(templates.len());
    for t in &templates {
        archives.push(build_one(t, output_dir, options)?);
    }

    info!(output = %output_dir.display(), archives = archives.len(), "build run complete");
    Ok(BuildReport {
        source_root: source_root.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        archives,
    })
}

fn build_one(
    template: &ResolvedTemplate,
    output_dir: &Path,
    options: &BuildOptions,
) -> BuildResult<ArchiveReport> {
    let files = collect_files(&template.id, &template.dir, &options.ignore)?;
    if options.normalize_source_mtimes {
        normalize_mtimes(&files, options.epoch_secs)?;
    }

    let path = output_dir.join(archive_file_name(&template.id));
    let file = fs::File::create(&path).map_err(|e| BuildError::io(&path, e))?;
    let (writer, summary) = write_archive(
        &template.id,
        &files,
        options.epoch_secs,
        BufWriter::new(file),
    )?;
    let file = writer
        .into_inner()
        .map_err(|e| BuildError::io(&path, e.into_error()))?;
    file.sync_all().map_err(|e| BuildError::io(&path, e))?;

    info!(
        template = %template.id,
        entries = summary.entries,
        bytes = summary.bytes,
        sha256 = %summary.sha256,
        "archive written"
    );
    Ok(ArchiveReport {
        id: template.id.clone(),
        path,
        summary,
    })
}

/// Run the precondition checks of [`build_archives`] without building.
///
/// Lets callers packaging several roots fail before any of them is reset.
pub fn validate_templates<S: AsRef<str>>(source_root: &Path, ids: &[S]) -> BuildResult<()> {
    resolve_templates(source_root, ids).map(|_| ())
}

/// Validate the source root and every id; all-or-nothing.
pub(crate) fn resolve_templates<S: AsRef<str>>(
    source_root: &Path,
    ids: &[S],
) -> BuildResult<Vec<ResolvedTemplate>> {
    if !source_root.is_dir() {
        return Err(BuildError::MissingSourceRoot {
            path: source_root.to_path_buf(),
        });
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.as_ref();
        validate_id(id)?;
        if !seen.insert(id) {
            return Err(BuildError::DuplicateId { id: id.to_string() });
        }

        let dir = source_root.join(id);
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(BuildError::NotADirectory {
                    id: id.to_string(),
                    path: dir,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BuildError::MissingTemplate {
                    id: id.to_string(),
                    path: dir,
                })
            }
            Err(e) => return Err(BuildError::io(dir, e)),
        }
        out.push(ResolvedTemplate {
            id: id.to_string(),
            dir,
        });
    }
    Ok(out)
}

/// Refuse runs whose output reset would delete the sources, or whose output
/// would land inside a template being archived.
fn ensure_output_is_disjoint(
    source_root: &Path,
    output_dir: &Path,
    templates: &[ResolvedTemplate],
) -> BuildResult<()> {
    let out = resolve_existing_prefix(output_dir)?;
    let src = source_root
        .canonicalize()
        .map_err(|e| BuildError::io(source_root, e))?;
    if src.starts_with(&out) {
        return Err(BuildError::config(format!(
            "output directory {} contains source root {}",
            output_dir.display(),
            source_root.display()
        )));
    }
    for t in templates {
        let dir = t.dir.canonicalize().map_err(|e| BuildError::io(&t.dir, e))?;
        if out.starts_with(&dir) {
            return Err(BuildError::config(format!(
                "output directory {} is inside template '{}' ({})",
                output_dir.display(),
                t.id,
                t.dir.display()
            )));
        }
    }
    Ok(())
}

/// Canonicalize the nearest existing ancestor of `path` and re-apply the
/// missing tail lexically.
fn resolve_existing_prefix(path: &Path) -> BuildResult<PathBuf> {
    let mut tail = Vec::new();
    let mut cur = path;
    loop {
        let probe = if cur.as_os_str().is_empty() {
            Path::new(".")
        } else {
            cur
        };
        match probe.canonicalize() {
            Ok(mut base) => {
                for c in tail.iter().rev() {
                    match c {
                        Component::ParentDir => {
                            base.pop();
                        }
                        Component::Normal(name) => base.push(name),
                        _ => {}
                    }
                }
                return Ok(base);
            }
            Err(e) => {
                let mut components = cur.components();
                match components.next_back() {
                    Some(c) => {
                        tail.push(c);
                        cur = components.as_path();
                    }
                    None => return Err(BuildError::io(path, e)),
                }
            }
        }
    }
}

fn reset_output_dir(output_dir: &Path) -> BuildResult<()> {
    match fs::remove_dir_all(output_dir) {
        Ok(()) => debug!(path = %output_dir.display(), "removed previous output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::io(output_dir, e)),
    }
    fs::create_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))
}

/// Write an archive for a single template to any writer, without touching
/// the output directory or source mtimes.
pub fn write_template_archive<W: Write>(
    source_root: &Path,
    id: &str,
    options: &BuildOptions,
    writer: W,
) -> BuildResult<(W, ArchiveSummary)> {
    let resolved = resolve_templates(source_root, &[id])?;
    let t = &resolved[0];
    let files = collect_files(&t.id, &t.dir, &options.ignore)?;
    write_archive(&t.id, &files, options.epoch_secs, writer)
}
