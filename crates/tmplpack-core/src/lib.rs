//! Deterministic packaging of template and wrapper directories.
//!
//! Given a source root and an ordered list of template ids, a build run
//! recreates an output directory and writes one byte-reproducible
//! `<id>.tar.gz` per id. See [`builder::build_archives`].
//!
//! # Example
//!
//! ```no_run
//! use tmplpack_core::{build_archives, BuildOptions, Manifest};
//! use std::path::Path;
//!
//! let manifest = Manifest::load(Path::new("templates/manifest.json")).unwrap();
//! let report = build_archives(
//!     Path::new("templates"),
//!     Path::new("dist/templates"),
//!     &manifest.ids(),
//!     &BuildOptions::default(),
//! )
//! .unwrap();
//! for archive in &report.archives {
//!     println!("{} {}", archive.id, archive.summary.sha256);
//! }
//! ```

pub mod archive;
pub mod builder;
pub mod check;
pub mod collect;
pub mod config;
pub mod error;
pub mod ignore;
pub mod manifest;
pub mod timestamps;

// Convenience re-exports
pub use archive::{read_archive_entries, read_archive_file, ArchiveEntry, ArchiveSummary};
pub use builder::{
    build_archives, validate_templates, write_template_archive, ArchiveReport, BuildOptions,
    BuildReport,
};
pub use check::{check_archives, ArchiveCheck, ArchiveStatus, CheckReport};
pub use config::{BuildConfig, TargetConfig};
pub use error::{BuildError, BuildResult, ErrorClass};
pub use ignore::IgnoreRules;
pub use manifest::{Manifest, Selection, TemplateDescriptor};
