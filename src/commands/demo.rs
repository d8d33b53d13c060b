//! Run devtools against the sample handlers and show what it logs

use colored::*;
use eyre::{Context, Result};
use std::sync::Arc;

use crate::cli::OutputFormat;
use devtools::DevTools;
use devtools::config::Config;
use devtools::demo::Sandbox;
use devtools::sink::{LogSink, MemorySink, Sink};

/// Keeps reports for printing while still logging them
struct Capture {
    memory: MemorySink,
}

impl Sink for Capture {
    fn emit(&self, report: &str) {
        LogSink.emit(report);
        self.memory.emit(report);
    }
}

pub fn run(filter: Option<&str>, format: OutputFormat, config: &Config) -> Result<()> {
    let sandbox = Sandbox::new().context("Failed to build sample handlers")?;
    let capture = Arc::new(Capture {
        memory: MemorySink::new(),
    });

    let mut plugin = DevTools::with_sink(config.devtools.clone(), sandbox.catalog.clone(), capture.clone());
    let subscribed = plugin.on_enabled();
    let fired = sandbox.play_round(filter);
    plugin.on_disabled();

    let reports = capture.memory.take();

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "subscribed": subscribed,
                "fired": fired,
                "reports": reports,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Yaml => {
            let out = serde_json::json!({
                "subscribed": subscribed,
                "fired": fired,
                "reports": reports,
            });
            println!("{}", serde_yaml::to_string(&out)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Subscribed to {} events, fired {}",
                "→".blue(),
                subscribed.to_string().cyan(),
                fired.len().to_string().cyan()
            );
            println!();

            if reports.is_empty() {
                println!("  {}", "(no reports)".dimmed());
            }
            for report in &reports {
                println!("{}", report);
                println!();
            }
        }
    }

    Ok(())
}
