pub mod geolocations;
pub mod health;
pub mod helpers;

use actix_web::web;

pub use geolocations::geolocation_routes;
pub use health::{HealthService, health_routes};

/// 版本化 API 路由 `/api/v1`
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api/v1").service(geolocation_routes())
}
