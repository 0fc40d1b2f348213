//! Enumerate the files of a template directory in archive order.

use crate::error::{BuildError, BuildResult};
use crate::ignore::IgnoreRules;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file selected for archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the template directory, `/`-separated.
    pub rel_path: String,
    /// Path on disk.
    pub abs_path: PathBuf,
    /// Any execute bit set on the source file.
    pub executable: bool,
}

/// Collect every archivable file under `dir`, sorted by relative path.
///
/// Dotfiles are included. Directories and files matched by `rules` are
/// skipped; excluded directories are not descended. Symlinks to regular
/// files are kept, symlinks to directories are not followed.
pub fn collect_files(id: &str, dir: &Path, rules: &IgnoreRules) -> BuildResult<Vec<SourceFile>> {
    let mut files = Vec::new();
    walk(id, dir, "", rules, &mut files)?;
    // Archive formats are order sensitive; directory listing order is not stable.
    files.sort_by(|a, b| a.rel_path.as_bytes().cmp(b.rel_path.as_bytes()));
    Ok(files)
}

fn walk(
    id: &str,
    dir: &Path,
    prefix: &str,
    rules: &IgnoreRules,
    out: &mut Vec<SourceFile>,
) -> BuildResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| BuildError::InvalidPath {
                id: id.to_string(),
                path: path.clone(),
            })?;
        let rel = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type().map_err(|e| BuildError::io(&path, e))?;
        if file_type.is_dir() {
            if rules.skip_dir(&name, &rel) {
                debug!(template = id, path = %rel, "skipping excluded directory");
                continue;
            }
            walk(id, &path, &rel, rules, out)?;
        } else if file_type.is_file() || file_type.is_symlink() {
            let meta = match fs::metadata(&path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => {
                    debug!(template = id, path = %rel, "skipping symlink to non-file");
                    continue;
                }
                Err(e) if file_type.is_symlink() && e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(template = id, path = %rel, "skipping dangling symlink");
                    continue;
                }
                Err(e) => return Err(BuildError::io(&path, e)),
            };
            if rules.skip_file(&name, &rel) {
                debug!(template = id, path = %rel, "skipping excluded file");
                continue;
            }
            out.push(SourceFile {
                rel_path: rel,
                abs_path: path,
                executable: is_executable(&meta),
            });
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, rel.as_bytes()).unwrap();
    }

    fn rel_paths(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel_path.as_str()).collect()
    }

    #[test]
    fn sorted_with_dotfiles_and_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "b.txt",
            "sub/c.txt",
            "a.txt",
            ".actor/actor.json",
            ".DS_Store",
            "sub/.DS_Store",
            "node_modules/pkg/index.js",
            ".venv/lib/x.py",
            "src/node_modules/deep.js",
        ] {
            touch(dir.path(), rel);
        }

        let files = collect_files("t", dir.path(), &IgnoreRules::default()).unwrap();
        assert_eq!(
            rel_paths(&files),
            vec![".actor/actor.json", "a.txt", "b.txt", "sub/c.txt"]
        );
        assert!(files[1].abs_path.ends_with("a.txt"));
    }

    #[test]
    fn ordering_is_bytewise_on_full_paths() {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["sub.txt", "sub/a.txt", "Top/z.txt", "sub-x/b.txt"] {
            touch(dir.path(), rel);
        }
        let files = collect_files("t", dir.path(), &IgnoreRules::default()).unwrap();
        // '-' (0x2d) < '.' (0x2e) < '/' (0x2f); uppercase sorts first.
        assert_eq!(
            rel_paths(&files),
            vec!["Top/z.txt", "sub-x/b.txt", "sub.txt", "sub/a.txt"]
        );
    }

    #[test]
    fn extra_patterns_prune() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.py");
        touch(dir.path(), "src/__pycache__/main.cpython-311.pyc");
        let rules = IgnoreRules::with_patterns(&["**/__pycache__"]).unwrap();
        let files = collect_files("t", dir.path(), &rules).unwrap();
        assert_eq!(rel_paths(&files), vec!["src/main.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_and_exec_bits() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "run.sh");
        touch(dir.path(), "data/x.txt");
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        symlink(dir.path().join("data/x.txt"), dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("data"), dir.path().join("linkdir")).unwrap();
        symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();

        let files = collect_files("t", dir.path(), &IgnoreRules::default()).unwrap();
        assert_eq!(rel_paths(&files), vec!["data/x.txt", "link.txt", "run.sh"]);
        assert!(files[2].executable);
        assert!(!files[0].executable);
    }
}
