//! Process exit codes. Part of the CLI contract; CI scripts key off them.

pub const EXIT_SUCCESS: i32 = 0;
/// Build/IO failure, or `check` found out-of-date archives.
pub const EXIT_FAILURE: i32 = 1;
/// Bad config, manifest or template selection. Nothing was written.
pub const EXIT_CONFIG_ERROR: i32 = 2;
