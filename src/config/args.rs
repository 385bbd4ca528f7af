//! Command-line argument parsing
//!
//! With no subcommand the HTTP server starts. One-shot subcommands share the
//! same configuration and storage setup as the server.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "geolocator", version, about = "IP / domain geolocation cache")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Look up an IP or URL, consulting the provider on a cache miss
    Resolve { value: String },
    /// Delete the stored record for an IP or URL
    Delete { value: String },
    /// Print the most recently created records
    List,
    /// Write a sample configuration file
    GenerateConfig {
        #[arg(default_value = "config.example.toml")]
        path: String,
    },
}

impl Cli {
    /// Subcommand to run, `Serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
