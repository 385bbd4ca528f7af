//! Geolocator - IP / domain geolocation with a persistent cache
//!
//! Resolves an IPv4 address or URL to coordinates and metadata. Results are
//! stored so that repeated lookups of the same identity never hit the paid
//! external provider twice.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: One-shot command-line subcommands
//!
//! # Architecture
//! - `identity`: IP / URL classification and canonicalization
//! - `storage`: Record store trait and SeaORM backend
//! - `services`: Provider client and the resolver
//! - `api`: HTTP services
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod config;
pub mod errors;
pub mod identity;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
