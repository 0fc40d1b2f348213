//! Deterministic `.tar.gz` archives of template directories.
//!
//! # Determinism Guarantees
//!
//! Archives are byte-for-byte reproducible when the same files (same bytes,
//! same relative paths, same execute bits) are archived with the same epoch:
//! - entries are written in the order given (callers pass sorted files)
//! - every header carries the epoch as mtime, uid/gid 0, no owner names
//! - mode is `0644`, or `0755` when the source has any execute bit
//! - the gzip header has mtime 0 and an "unknown" OS byte

mod tar_read;
mod tar_write;

pub use tar_read::{read_archive_entries, ArchiveEntry};

use crate::collect::SourceFile;
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::{self, Write};
use std::path::Path;

/// Archive file extension, without the leading dot.
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// `<id>.tar.gz`
pub fn archive_file_name(id: &str) -> String {
    format!("{id}.{ARCHIVE_EXTENSION}")
}

/// What was written for one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub entries: usize,
    pub bytes: u64,
    /// `sha256:<hex>` of the compressed archive.
    pub sha256: String,
}

/// Write `files` into a deterministic tar.gz on `writer`.
///
/// Source read failures are reported as [`BuildError::Io`]; failures of the
/// tar/gzip stream as [`BuildError::Archive`].
pub fn write_archive<W: Write>(
    id: &str,
    files: &[SourceFile],
    mtime: u64,
    writer: W,
) -> BuildResult<(W, ArchiveSummary)> {
    let archive_err = |source: io::Error| BuildError::Archive {
        id: id.to_string(),
        source,
    };

    let mut tar = tar_write::create_deterministic_tar(DigestWriter::new(writer));
    for f in files {
        let data = std::fs::read(&f.abs_path).map_err(|e| BuildError::io(&f.abs_path, e))?;
        tar_write::append_file(&mut tar, &f.rel_path, &data, f.executable, mtime)
            .map_err(archive_err)?;
    }

    let encoder = tar.into_inner().map_err(archive_err)?;
    let digest_writer = encoder.finish().map_err(archive_err)?;
    let (inner, sha256, bytes) = digest_writer.into_parts();

    Ok((
        inner,
        ArchiveSummary {
            entries: files.len(),
            bytes,
            sha256,
        },
    ))
}

/// Read entries of an archive on disk.
pub fn read_archive_file(path: &Path) -> BuildResult<Vec<ArchiveEntry>> {
    let file = std::fs::File::open(path).map_err(|e| BuildError::io(path, e))?;
    read_archive_entries(io::BufReader::new(file)).map_err(|e| BuildError::io(path, e))
}

/// `sha256:<hex>` of a byte slice.
pub fn sha256_prefixed(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

/// Passes writes through while hashing and counting them.
struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
    bytes: u64,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    fn into_parts(self) -> (W, String, u64) {
        let digest = format!("sha256:{}", hex::encode(self.hasher.finalize()));
        (self.inner, digest, self.bytes)
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
