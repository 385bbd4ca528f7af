//! CLI mode
//!
//! One-shot commands against the same storage and provider as the server.
//! Records are printed to stdout as JSON.

use anyhow::{Result, anyhow};
use colored::Colorize;

use crate::config::args::Command;
use crate::errors::GeoError;
use crate::runtime::lifetime::startup::StartupContext;

pub async fn run_cli(command: Command, startup: &StartupContext) -> Result<()> {
    let resolver = &startup.resolver;

    let outcome: Result<(), GeoError> = match command {
        Command::Resolve { value } => match resolver.resolve(&value).await {
            Ok(resolution) => {
                let label = if resolution.is_created() {
                    "created".green()
                } else {
                    "found".cyan()
                };
                eprintln!("{} {}", label, value);
                print_json(resolution.record())
            }
            Err(e) => Err(e),
        },
        Command::Delete { value } => resolver.delete(&value).await.map(|()| {
            println!("{} {}", "deleted".green(), value);
        }),
        Command::List => match resolver.list_recent().await {
            Ok(records) => print_json(&records),
            Err(e) => Err(e),
        },
        Command::Serve | Command::GenerateConfig { .. } => {
            return Err(anyhow!("command is not a one-shot CLI command"));
        }
    };

    outcome.map_err(|e| {
        eprintln!("{}", e.format_colored());
        anyhow!(e)
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), GeoError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{}", rendered);
    Ok(())
}
