use super::plan::{load_config, plan_targets};
use crate::cli::args::{BuildArgs, OutputFormat};
use crate::exit_codes;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tmplpack_core::{build_archives, validate_templates, BuildOptions, BuildReport};
use tracing::warn;

#[derive(Serialize)]
struct TargetOutput<'a> {
    target: &'a str,
    #[serde(flatten)]
    report: &'a BuildReport,
}

pub fn run(config_path: Option<&Path>, args: BuildArgs) -> Result<i32> {
    let mut config = load_config(config_path, args.dist.as_deref())?;
    if args.no_touch {
        config.normalize_source_mtimes = false;
    }
    let options = BuildOptions::from_config(&config)?;
    let plans = plan_targets(&config, &args.select)?;

    // Validate everything up front so a bad id in one target does not leave
    // an earlier target rebuilt and a later one wiped.
    for plan in &plans {
        validate_templates(&plan.target.root, &plan.ids())?;
    }

    let mut reports = Vec::with_capacity(plans.len());
    for plan in &plans {
        if plan.skipped > 0 {
            warn!(
                name = %plan.target.name,
                output = %plan.output_dir.display(),
                skipped = plan.skipped,
                "partial selection: archives of unselected templates will be removed"
            );
        }
        let report = build_archives(&plan.target.root, &plan.output_dir, &plan.ids(), &options)
            .with_context(|| format!("building target '{}'", plan.target.name))?;
        reports.push((plan.target.name.as_str(), report));
    }

    match args.format {
        OutputFormat::Json => {
            let out: Vec<_> = reports
                .iter()
                .map(|(target, report)| TargetOutput { target, report })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (target, report) in &reports {
                eprintln!(
                    "{target}: {} archive(s) -> {}",
                    report.archives.len(),
                    report.output_dir.display()
                );
                for a in &report.archives {
                    println!(
                        "{target}/{}  {} entries  {} bytes  {}",
                        a.id, a.summary.entries, a.summary.bytes, a.summary.sha256
                    );
                }
            }
        }
    }

    Ok(exit_codes::EXIT_SUCCESS)
}
