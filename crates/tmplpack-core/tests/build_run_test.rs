//! Build run behavior: output reset, exclusions, failure boundaries.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tmplpack_core::timestamps::DEFAULT_EPOCH_SECS;
use tmplpack_core::{
    build_archives, read_archive_file, BuildError, BuildOptions, ErrorClass, IgnoreRules, Manifest,
};

fn write_files(root: &Path, files: &[&str]) {
    for rel in files {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, format!("content of {rel}\n")).unwrap();
    }
}

fn dir_listing(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn entry_paths(archive: &Path) -> Vec<String> {
    read_archive_file(archive)
        .unwrap()
        .into_iter()
        .map(|e| e.path)
        .collect()
}

fn alpha_beta() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("templates");
    write_files(&src, &["alpha/main.js", "alpha/README.md", "beta/main.js"]);
    let out = dir.path().join("dist").join("templates");
    (dir, src, out)
}

// ============================================================================
// End to End
// ============================================================================

#[test]
fn test_alpha_beta_end_to_end() {
    let (_dir, src, out) = alpha_beta();
    let opts = BuildOptions::default();

    let report = build_archives(&src, &out, &["alpha", "beta"], &opts).unwrap();
    assert_eq!(report.archives.len(), 2);
    assert_eq!(
        dir_listing(&out),
        BTreeSet::from(["alpha.tar.gz".to_string(), "beta.tar.gz".to_string()])
    );

    assert_eq!(entry_paths(&out.join("alpha.tar.gz")), vec!["README.md", "main.js"]);
    assert_eq!(entry_paths(&out.join("beta.tar.gz")), vec!["main.js"]);
    for archive in ["alpha.tar.gz", "beta.tar.gz"] {
        let entries = read_archive_file(&out.join(archive)).unwrap();
        assert!(entries.iter().all(|e| e.mtime == DEFAULT_EPOCH_SECS));
    }

    // Contents round trip.
    let file = fs::File::open(out.join("beta.tar.gz")).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
    let mut body = String::new();
    entry.read_to_string(&mut body).unwrap();
    assert_eq!(body, "content of beta/main.js\n");

    let again = build_archives(&src, &out, &["alpha", "beta"], &opts).unwrap();
    for (a, b) in report.archives.iter().zip(&again.archives) {
        assert_eq!(a.summary.sha256, b.summary.sha256, "{}", a.id);
    }
}

#[test]
fn test_manifest_driven_build() {
    let (_dir, src, out) = alpha_beta();
    fs::write(
        src.join("manifest.json"),
        r#"{"templates":[{"id":"beta","category":"js"},{"id":"alpha","category":"js"}]}"#,
    )
    .unwrap();

    let manifest = Manifest::load(&src.join("manifest.json")).unwrap();
    let report = build_archives(&src, &out, &manifest.ids(), &BuildOptions::default()).unwrap();
    let ids: Vec<_> = report.archives.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["beta", "alpha"]);
}

// ============================================================================
// Exclusions
// ============================================================================

#[test]
fn test_excluded_paths_never_archived() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("templates");
    write_files(
        &src,
        &[
            "py/src/main.py",
            "py/.venv/lib/x.py",
            "py/.DS_Store",
            "py/src/__pycache__/main.cpython-312.pyc",
            "js/src/main.js",
            "js/node_modules/pkg/index.js",
            "js/.gitignore",
            "js/.actor/.DS_Store",
        ],
    );
    let out = dir.path().join("dist");
    let opts = BuildOptions {
        ignore: IgnoreRules::with_patterns(&["**/__pycache__"]).unwrap(),
        ..BuildOptions::default()
    };

    build_archives(&src, &out, &["js", "py"], &opts).unwrap();

    assert_eq!(entry_paths(&out.join("js.tar.gz")), vec![".gitignore", "src/main.js"]);
    assert_eq!(entry_paths(&out.join("py.tar.gz")), vec!["src/main.py"]);
}

// ============================================================================
// Output Directory Reset
// ============================================================================

#[test]
fn test_stale_outputs_removed() {
    let (_dir, src, out) = alpha_beta();
    let opts = BuildOptions::default();

    build_archives(&src, &out, &["alpha", "beta"], &opts).unwrap();
    fs::write(out.join("leftover.txt"), "stale").unwrap();
    fs::create_dir_all(out.join("nested")).unwrap();

    build_archives(&src, &out, &["beta"], &opts).unwrap();
    assert_eq!(dir_listing(&out), BTreeSet::from(["beta.tar.gz".to_string()]));
}

#[test]
fn test_empty_id_list_leaves_empty_output() {
    let (_dir, src, out) = alpha_beta();
    let ids: [&str; 0] = [];
    let report = build_archives(&src, &out, &ids, &BuildOptions::default()).unwrap();
    assert!(report.archives.is_empty());
    assert!(out.is_dir());
    assert!(dir_listing(&out).is_empty());
}

#[test]
fn test_empty_template_dir_yields_empty_archive() {
    let (_dir, src, out) = alpha_beta();
    fs::create_dir_all(src.join("empty")).unwrap();
    let report = build_archives(&src, &out, &["empty"], &BuildOptions::default()).unwrap();
    assert_eq!(report.archives[0].summary.entries, 0);
    assert!(entry_paths(&out.join("empty.tar.gz")).is_empty());
}

// ============================================================================
// Failure Boundaries
// ============================================================================

#[test]
fn test_missing_id_writes_nothing() {
    let (_dir, src, out) = alpha_beta();
    let opts = BuildOptions::default();

    // A previous good run.
    build_archives(&src, &out, &["alpha"], &opts).unwrap();
    let before = fs::read(out.join("alpha.tar.gz")).unwrap();

    let err = build_archives(&src, &out, &["beta", "foo", "alpha"], &opts).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert_eq!(err.template_id(), Some("foo"));
    assert!(matches!(err, BuildError::MissingTemplate { .. }));
    assert!(err.to_string().contains("'foo'"));

    // Output untouched: no beta archive, previous alpha archive intact.
    assert_eq!(dir_listing(&out), BTreeSet::from(["alpha.tar.gz".to_string()]));
    assert_eq!(fs::read(out.join("alpha.tar.gz")).unwrap(), before);
}

#[test]
fn test_missing_id_on_fresh_output_creates_nothing() {
    let (_dir, src, out) = alpha_beta();
    let err = build_archives(&src, &out, &["foo"], &BuildOptions::default()).unwrap_err();
    assert!(err.is_configuration());
    assert!(!out.exists());
}

#[test]
fn test_non_directory_id_is_rejected() {
    let (_dir, src, out) = alpha_beta();
    fs::write(src.join("notes.txt"), "not a template").unwrap();

    let err =
        build_archives(&src, &out, &["alpha", "notes.txt"], &BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::NotADirectory { ref id, .. } if id == "notes.txt"));
    assert!(!out.exists());
}

#[test]
fn test_output_inside_template_is_refused() {
    let (_dir, src, _out) = alpha_beta();
    let opts = BuildOptions::default();

    // Output is the template directory itself.
    let err = build_archives(&src, &src.join("alpha"), &["alpha"], &opts).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Configuration);
    assert!(err.to_string().contains("'alpha'"));
    assert!(src.join("alpha/main.js").is_file());
    assert!(src.join("alpha/README.md").is_file());

    // Output not created yet, nested in a template built later in the run.
    let nested = src.join("beta").join("dist");
    let err = build_archives(&src, &nested, &["alpha", "beta"], &opts).unwrap_err();
    assert!(err.is_configuration());
    assert!(!nested.exists());
    assert!(src.join("beta/main.js").is_file());
}

#[test]
fn test_output_beside_templates_under_source_root_is_allowed() {
    let (_dir, src, _out) = alpha_beta();
    let out = src.join("dist");

    build_archives(&src, &out, &["alpha", "beta"], &BuildOptions::default()).unwrap();
    assert_eq!(entry_paths(&out.join("beta.tar.gz")), vec!["main.js"]);
}

#[test]
fn test_missing_source_root() {
    let dir = tempfile::tempdir().unwrap();
    let err = build_archives(
        &dir.path().join("templates"),
        &dir.path().join("dist"),
        &["alpha"],
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::MissingSourceRoot { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_aborts_after_earlier_archives() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, src, out) = alpha_beta();
    let secret = src.join("beta/main.js");
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&secret).is_ok() {
        // Running as root; permissions are not enforced.
        return;
    }

    let err = build_archives(&src, &out, &["alpha", "beta"], &BuildOptions::default())
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Io);
    assert!(out.join("alpha.tar.gz").is_file());

    fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();
}
