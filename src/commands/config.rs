use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use devtools::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            let devtools = &config.devtools;

            println!("{}", "devtools Configuration".bold());
            println!();

            println!("log_level: {}", config.log_level.as_filter());
            println!();

            println!("{}:", "devtools".cyan());
            println!("  enabled: {}", devtools.enabled);
            println!("  instrumentation: {}", devtools.instrumentation);
            println!("  handler_namespaces:");
            for ns in &devtools.handler_namespaces {
                println!("    - {}", ns);
            }
            print_set("disabled_logging_events", &devtools.disabled_logging_events);
            print_set(
                "disabled_logging_class_name_for_nest",
                &devtools.disabled_logging_class_name_for_nest,
            );
        }
    }

    Ok(())
}

fn print_set(label: &str, values: &std::collections::HashSet<String>) {
    if values.is_empty() {
        println!("  {}: {}", label, "(none)".dimmed());
        return;
    }

    let mut sorted: Vec<&String> = values.iter().collect();
    sorted.sort();
    println!("  {}:", label);
    for value in sorted {
        println!("    - {}", value);
    }
}
