//! 地理位置 CRUD 操作

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use serde_json::json;
use tracing::{info, trace};

use crate::services::{CreateGeoRequest, GeoResolver, Resolution};

use super::helpers::{error_from_geo, error_message, json_response};

pub const MISSING_PARAMETER_MESSAGE: &str = "Parameter IP or URL is required";

/// 获取最近创建的记录
pub async fn list_geolocations(resolver: web::Data<GeoResolver>) -> ActixResult<impl Responder> {
    trace!("API: request to list recent geolocations");

    Ok(match resolver.list_recent().await {
        Ok(records) => {
            info!("API: returning {} geolocations", records.len());
            json_response(StatusCode::OK, &records)
        }
        Err(e) => error_from_geo(&e),
    })
}

/// Resolve-or-create: 200 when already stored, 201 when fetched now
pub async fn get_geolocation(
    path: web::Path<String>,
    resolver: web::Data<GeoResolver>,
) -> ActixResult<impl Responder> {
    let Some(value) = decode_value(&path) else {
        return Ok(error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            MISSING_PARAMETER_MESSAGE,
        ));
    };
    trace!("API: resolving {}", value);

    Ok(match resolver.resolve(&value).await {
        Ok(resolution) => resolution_response(resolution),
        Err(e) => error_from_geo(&e),
    })
}

/// Direct create from a JSON body
pub async fn post_geolocation(
    body: web::Json<CreateGeoRequest>,
    resolver: web::Data<GeoResolver>,
) -> ActixResult<impl Responder> {
    let request = body.into_inner();
    trace!(
        "API: direct create for ip={:?} url={:?}",
        request.ip, request.url
    );

    Ok(match resolver.create(request).await {
        Ok(resolution) => resolution_response(resolution),
        Err(e) => error_from_geo(&e),
    })
}

pub async fn delete_geolocation(
    path: web::Path<String>,
    resolver: web::Data<GeoResolver>,
) -> ActixResult<impl Responder> {
    let Some(value) = decode_value(&path) else {
        return Ok(error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            MISSING_PARAMETER_MESSAGE,
        ));
    };

    Ok(match resolver.delete(&value).await {
        Ok(()) => json_response(StatusCode::OK, &json!({ "message": "Geolocation deleted" })),
        Err(e) => error_from_geo(&e),
    })
}

fn resolution_response(resolution: Resolution) -> HttpResponse {
    let status = if resolution.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    json_response(status, resolution.record())
}

/// Percent-decode a path value; `None` when blank.
fn decode_value(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    trace!("API: rejected JSON body: {}", err);
    let response = error_message(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {}", err));
    InternalError::from_response(err, response).into()
}

/// 地理位置路由 `/geolocations`
///
/// - GET /geolocations - 最近 100 条
/// - POST /geolocations - 直接创建
/// - GET /geolocations/{value} - 查询或创建
/// - DELETE /geolocations/{value} - 删除
pub fn geolocation_routes() -> actix_web::Scope {
    web::scope("/geolocations")
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("", web::get().to(list_geolocations))
        .route("", web::post().to(post_geolocation))
        // Wildcard so that encoded URLs containing '/' still match
        .route("/{value:.*}", web::get().to(get_geolocation))
        .route("/{value:.*}", web::delete().to(delete_geolocation))
}
