use super::plan::{load_config, plan_targets};
use crate::cli::args::{CheckArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tmplpack_core::{check_archives, ArchiveStatus, BuildOptions, CheckReport};

#[derive(Serialize)]
struct TargetOutput<'a> {
    target: &'a str,
    clean: bool,
    #[serde(flatten)]
    report: &'a CheckReport,
}

pub fn run(config_path: Option<&Path>, args: CheckArgs) -> Result<i32> {
    let config = load_config(config_path, args.dist.as_deref())?;
    let options = BuildOptions::from_config(&config)?;
    let plans = plan_targets(&config, &args.select)?;

    let mut reports = Vec::with_capacity(plans.len());
    for plan in &plans {
        let report = check_archives(&plan.target.root, &plan.output_dir, &plan.ids(), &options)?;
        reports.push((plan.target.name.as_str(), report));
    }
    let clean = reports.iter().all(|(_, r)| r.is_clean());

    match args.format {
        OutputFormat::Json => {
            let out: Vec<_> = reports
                .iter()
                .map(|(target, report)| TargetOutput {
                    target,
                    clean: report.is_clean(),
                    report,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (target, report) in &reports {
                for a in &report.archives {
                    println!("{target}/{}: {}", a.id, a.status);
                    if a.status == ArchiveStatus::Stale {
                        if let Some(actual) = &a.actual_sha256 {
                            println!("  expected {}\n  found    {}", a.expected_sha256, actual);
                        }
                    }
                }
                for p in &report.unexpected {
                    println!("{target}: unexpected {}", p.display());
                }
            }
            if clean {
                eprintln!("check: OK");
            } else {
                eprintln!("check: archives out of date; run `tmplpack build`");
            }
        }
    }

    Ok(if clean {
        exit_codes::EXIT_SUCCESS
    } else {
        exit_codes::EXIT_FAILURE
    })
}
