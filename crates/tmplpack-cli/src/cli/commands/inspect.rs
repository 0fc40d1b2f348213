use crate::cli::args::{InspectArgs, OutputFormat};
use crate::exit_codes;
use anyhow::{Context, Result};
use tmplpack_core::read_archive_file;

pub fn run(args: InspectArgs) -> Result<i32> {
    let entries = read_archive_file(&args.archive)
        .with_context(|| format!("failed to read archive: {}", args.archive.display()))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for e in &entries {
                println!("{:o}  {:>10}  {:>10}  {}", e.mode, e.mtime, e.size, e.path);
            }
            eprintln!("{} entries", entries.len());
        }
    }
    Ok(exit_codes::EXIT_SUCCESS)
}
