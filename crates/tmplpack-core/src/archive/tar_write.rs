use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::io::{self, Write};
use tar::{Builder, EntryType, Header};

/// Gzip OS byte for "unknown", so the host platform does not leak into the output.
const GZIP_OS_UNKNOWN: u8 = 255;

pub(crate) fn create_deterministic_tar<W: Write>(writer: W) -> Builder<GzEncoder<W>> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(GZIP_OS_UNKNOWN)
        .write(writer, Compression::best());

    let mut tar = Builder::new(encoder);
    tar.mode(tar::HeaderMode::Deterministic);
    tar
}

/// Append a regular file with normalized ownership, mode and mtime.
///
/// Paths longer than the ustar name field get a GNU long-name record.
pub(crate) fn append_file<T: Write>(
    tar: &mut Builder<T>,
    path: &str,
    data: &[u8],
    executable: bool,
    mtime: u64,
) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(if executable { 0o755 } else { 0o644 });
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(mtime);

    tar.append_data(&mut header, path, data)
}
