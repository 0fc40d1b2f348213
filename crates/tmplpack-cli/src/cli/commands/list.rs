use super::plan::{load_config, plan_targets};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tmplpack_core::TemplateDescriptor;

#[derive(Serialize)]
struct TargetOutput<'a> {
    target: &'a str,
    templates: &'a [TemplateDescriptor],
}

pub fn run(config_path: Option<&Path>, args: ListArgs) -> Result<i32> {
    let config = load_config(config_path, None)?;
    let plans = plan_targets(&config, &args.select)?;

    match args.format {
        OutputFormat::Json => {
            let out: Vec<_> = plans
                .iter()
                .map(|p| TargetOutput {
                    target: &p.target.name,
                    templates: &p.templates,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for plan in &plans {
                for t in &plan.templates {
                    let flags = if t.skip_tests() { "  [skip-tests]" } else { "" };
                    println!(
                        "{}/{}  {}  {}{}",
                        plan.target.name,
                        t.id,
                        t.category,
                        t.display_name(),
                        flags
                    );
                }
            }
        }
    }
    Ok(exit_codes::EXIT_SUCCESS)
}
