//! Server mode
//!
//! Configures and starts the HTTP server with all routes.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::{api_routes, health_routes};
use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::runtime::lifetime::startup::StartupContext;

/// Run the HTTP server until it stops or Ctrl+C is received.
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(startup: StartupContext, config: &StaticConfig) -> Result<()> {
    let resolver = web::Data::new(startup.resolver);
    let db_for_shutdown = startup.storage.get_db().clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(resolver.clone())
            .app_data(web::PayloadConfig::new(64 * 1024))
            .service(api_routes())
            .service(health_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(db_for_shutdown) => {
            warn!("Graceful shutdown complete");
        }
    }

    Ok(())
}
