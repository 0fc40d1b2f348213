use flate2::read::GzDecoder;
use serde::Serialize;
use std::io::{self, Read};

/// One entry of a packaged archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub path: String,
    pub size: u64,
    pub mtime: u64,
    pub mode: u32,
}

/// List the entries of a `.tar.gz` stream in archive order.
pub fn read_archive_entries<R: Read>(reader: R) -> io::Result<Vec<ArchiveEntry>> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut out = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        let header = entry.header();
        out.push(ArchiveEntry {
            path: entry.path()?.to_string_lossy().into_owned(),
            size: header.size()?,
            mtime: header.mtime()?,
            mode: header.mode()?,
        });
    }
    Ok(out)
}
