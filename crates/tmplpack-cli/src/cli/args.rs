use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tmplpack",
    version,
    about = "Package template and wrapper directories into byte-reproducible archives"
)]
pub struct Cli {
    /// Config file (default: ./tmplpack.yaml if present)
    #[arg(long, global = true, env = "TMPLPACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild archives for the selected targets (output dirs are recreated)
    Build(BuildArgs),
    /// Verify archives on disk match a fresh build, without writing anything
    Check(CheckArgs),
    /// List manifest entries
    List(ListArgs),
    /// Print the entries of an archive
    Inspect(InspectArgs),
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Which targets and templates a command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Target to process (repeatable; default: all configured targets)
    #[arg(long = "target", value_name = "NAME")]
    pub targets: Vec<String>,

    /// Only templates in this category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Only this template id (repeatable). `build` still recreates the
    /// whole output directory, so unselected archives are removed.
    #[arg(long = "only", value_name = "ID")]
    pub ids: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output root (overrides config `dist`)
    #[arg(long, env = "TMPLPACK_DIST")]
    pub dist: Option<PathBuf>,

    /// Leave source file mtimes alone (archive headers still use the epoch)
    #[arg(long)]
    pub no_touch: bool,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output root (overrides config `dist`)
    #[arg(long, env = "TMPLPACK_DIST")]
    pub dist: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Archive path (.tar.gz)
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}
