use anyhow::{Context, Result, anyhow};
use clap::Parser;

use geolocator::config::args::{Cli, Command};
use geolocator::config::{StaticConfig, get_config, init_config, init_config_from};
use geolocator::runtime::lifetime::startup::prepare_startup;
use geolocator::runtime::modes;
use geolocator::system::logging::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command();

    if let Command::GenerateConfig { path } = &command {
        StaticConfig::default()
            .save_to_file(path)
            .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
        println!("Sample configuration written to {}", path);
        return Ok(());
    }

    match cli.config.as_deref() {
        Some(path) => init_config_from(path),
        None => init_config(),
    }
    let config = get_config();

    let _guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    let startup = prepare_startup(&config)
        .await
        .context("Server startup failed")?;

    match command {
        #[cfg(feature = "server")]
        Command::Serve => modes::run_server(startup, &config).await,
        #[cfg(feature = "cli")]
        other => modes::run_cli(other, &startup).await,
        #[cfg(not(feature = "cli"))]
        _ => Err(anyhow!("CLI support is not enabled in this build")),
    }
}
