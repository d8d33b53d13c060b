//! List every event discovery would find in the sample handlers

use colored::*;
use eyre::{Context, Result};
use std::sync::Arc;

use crate::cli::OutputFormat;
use devtools::config::Config;
use devtools::demo::Sandbox;
use devtools::sink::LogSink;
use devtools::subscription::{Disposition, SubscriptionManager};

pub fn run(format: OutputFormat, config: &Config) -> Result<()> {
    let sandbox = Sandbox::new().context("Failed to build sample handlers")?;
    let manager = SubscriptionManager::new(config.devtools.handler_namespaces.clone(), Arc::new(LogSink));
    let plan = manager
        .plan(&sandbox.catalog, &config.devtools.exclusions())
        .context("Failed to discover events")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&plan)?);
        }
        OutputFormat::Text => {
            println!("{}", "Discovered events:".bold());
            println!();

            if plan.is_empty() {
                println!("  {}", "(none)".dimmed());
                return Ok(());
            }

            for planned in &plan {
                let d = &planned.descriptor;
                let marker = match planned.disposition {
                    Disposition::Attach => "✓".green(),
                    Disposition::Excluded => "✗".red(),
                };
                let payload = d.payload.unwrap_or("(no payload)");
                println!(
                    "  {} {}.{} {}",
                    marker,
                    d.handler.cyan(),
                    d.name.bold(),
                    payload.dimmed()
                );
            }

            let attached = plan.iter().filter(|p| p.disposition == Disposition::Attach).count();
            println!();
            println!("  {} observed, {} excluded", attached, plan.len() - attached);
        }
    }

    Ok(())
}
