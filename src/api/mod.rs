//! HTTP surface
//!
//! Thin actix-web glue: decode the request, call `GeoResolver`, map the
//! outcome to a status code.

pub mod services;

pub use services::{api_routes, health_routes};
