use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::services::{GeoResolver, build_provider};
use crate::storage::{GeoStore, SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub resolver: GeoResolver,
}

/// 准备启动上下文：存储（含迁移）、provider、resolver
///
/// Shared by the server and the one-shot CLI commands.
pub async fn prepare_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install rustls crypto provider: {:?}", e))?;

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!(
        "Using storage backend: {}",
        storage.backend_config().storage_type
    );

    let provider = build_provider(&config.provider);
    let store: Arc<dyn GeoStore> = storage.clone();
    let resolver = GeoResolver::new(store, provider);

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(StartupContext { storage, resolver })
}
