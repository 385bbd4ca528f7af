use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::services::GeoResolver;

use super::helpers::json_response;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub provider: String,
    pub storage: HealthStorageCheck,
    pub response_time_ms: u32,
}

/// Health Service
///
/// 只查 count，不加载全表
pub struct HealthService;

impl HealthService {
    pub async fn health_check(resolver: web::Data<GeoResolver>) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let backend = resolver.backend_config().storage_type;
        let storage = match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, resolver.record_count())
            .await
        {
            Ok(Ok(count)) => HealthStorageCheck {
                status: "healthy".to_string(),
                backend,
                records: Some(count),
                error: None,
            },
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    records: None,
                    error: Some("storage unavailable".to_string()),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    records: None,
                    error: Some("timeout".to_string()),
                }
            }
        };

        let is_healthy = storage.records.is_some();
        let body = HealthResponse {
            status: storage.status.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            provider: resolver.provider_name().to_string(),
            storage,
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        let status = if is_healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_response(status, &body)
    }

    pub async fn liveness_check() -> impl Responder {
        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置 `/health`
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
}
