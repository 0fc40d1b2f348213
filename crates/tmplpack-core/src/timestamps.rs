//! Fixed-epoch timestamp normalization.

use crate::collect::SourceFile;
use crate::error::{BuildError, BuildResult};
use chrono::{DateTime, TimeZone, Utc};
use std::fs::File;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default epoch: 2000-01-01T00:00:00Z.
pub const DEFAULT_EPOCH_SECS: u64 = 946_684_800;

pub fn default_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(DEFAULT_EPOCH_SECS as i64, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Seconds since the Unix epoch, as stored in tar headers.
///
/// Sub-second precision is dropped; dates before 1970 are rejected.
pub fn epoch_secs(epoch: &DateTime<Utc>) -> BuildResult<u64> {
    u64::try_from(epoch.timestamp())
        .map_err(|_| BuildError::config(format!("epoch {epoch} is before 1970-01-01")))
}

/// Set the modification time of every file to `epoch_secs`.
pub fn normalize_mtimes(files: &[SourceFile], epoch_secs: u64) -> BuildResult<()> {
    let mtime = UNIX_EPOCH + Duration::from_secs(epoch_secs);
    for f in files {
        set_mtime(f, mtime)?;
    }
    Ok(())
}

fn set_mtime(file: &SourceFile, mtime: SystemTime) -> BuildResult<()> {
    let handle = open_for_times(file).map_err(|e| BuildError::io(&file.abs_path, e))?;
    handle
        .set_modified(mtime)
        .map_err(|e| BuildError::io(&file.abs_path, e))
}

#[cfg(unix)]
fn open_for_times(file: &SourceFile) -> std::io::Result<File> {
    File::open(&file.abs_path)
}

// Windows needs FILE_WRITE_ATTRIBUTES on the handle.
#[cfg(not(unix))]
fn open_for_times(file: &SourceFile) -> std::io::Result<File> {
    File::options().write(true).open(&file.abs_path)
}
