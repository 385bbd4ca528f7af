//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::errors::GeoError;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// `{"error": message}`
pub fn error_message(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &json!({ "error": message }))
}

/// 从 GeoError 构建错误响应
///
/// Storage and unexpected failures are logged in full; the caller only sees
/// an opaque message.
pub fn error_from_geo(err: &GeoError) -> HttpResponse {
    let status = err.http_status();
    match err {
        GeoError::PersistFailed(messages) => json_response(status, &json!({ "errors": messages })),
        GeoError::StorageUnavailable(detail) => {
            error!("Storage unavailable: {}", detail);
            error_message(status, "Storage unavailable")
        }
        GeoError::Config(_) | GeoError::Unexpected(_) | GeoError::UniquenessConflict(_) => {
            error!("Unexpected error: {}", err.format_simple());
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        _ => error_message(status, &err.message()),
    }
}
