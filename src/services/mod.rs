//! Service layer for business logic
//!
//! Shared by the HTTP API and the one-shot CLI commands.

pub mod geoip;
mod resolver;

pub use geoip::{GeoLookup, ProviderRecord, ProviderUnavailable, build_provider};
pub use resolver::*;
