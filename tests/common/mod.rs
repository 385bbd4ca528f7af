//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use geolocator::config::DatabaseConfig;
use geolocator::errors::{GeoError, Result};
use geolocator::identity::Identity;
use geolocator::services::{GeoLookup, GeoResolver, ProviderRecord, ProviderUnavailable};
use geolocator::storage::{
    Coordinates, GeoMetadata, GeoRecord, GeoStore, NewGeoRecord, SeaOrmStorage, StorageConfig,
    StorageFactory,
};
use tempfile::TempDir;

/// Fresh SQLite database in a temp directory, migrations applied.
///
/// Keep the `TempDir` alive for as long as the storage is used.
pub async fn temp_storage() -> (TempDir, Arc<SeaOrmStorage>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("geolocations.db");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", path.display()),
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 5,
        ..DatabaseConfig::default()
    };
    let storage = StorageFactory::create(&config).await.unwrap();
    (dir, storage)
}

pub fn provider_record(ip: &str, longitude: f64, latitude: f64) -> ProviderRecord {
    ProviderRecord {
        ip: Some(ip.to_string()),
        coordinates: Coordinates::new(longitude, latitude),
        metadata: GeoMetadata {
            country_code: Some("US".to_string()),
            country_name: Some("United States".to_string()),
            region_code: Some("CA".to_string()),
            city: Some("Mountain View".to_string()),
        },
    }
}

/// Provider stub returning a fixed answer and counting calls
pub struct StubProvider {
    answer: std::result::Result<ProviderRecord, ProviderUnavailable>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn returning(record: ProviderRecord) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(record),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(record: ProviderRecord, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(record),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(ProviderUnavailable::new(reason)),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoLookup for StubProvider {
    async fn fetch(
        &self,
        _identity: &Identity,
    ) -> std::result::Result<ProviderRecord, ProviderUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Store whose backend is always unreachable
#[derive(Default)]
pub struct UnreachableStore {
    calls: AtomicUsize,
}

impl UnreachableStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GeoError::storage_unavailable("connection refused"))
    }
}

#[async_trait]
impl GeoStore for UnreachableStore {
    async fn lookup(&self, _identity: &Identity) -> Result<Option<GeoRecord>> {
        self.fail()
    }

    async fn insert(&self, _record: NewGeoRecord) -> Result<GeoRecord> {
        self.fail()
    }

    async fn delete(&self, _identity: &Identity) -> Result<bool> {
        self.fail()
    }

    async fn list_recent(&self, _limit: u64) -> Result<Vec<GeoRecord>> {
        self.fail()
    }

    async fn count(&self) -> Result<u64> {
        self.fail()
    }

    fn backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: "unreachable".to_string(),
        }
    }
}

pub fn resolver_with(storage: Arc<SeaOrmStorage>, provider: Arc<StubProvider>) -> GeoResolver {
    let store: Arc<dyn GeoStore> = storage;
    let provider: Arc<dyn GeoLookup> = provider;
    GeoResolver::new(store, provider)
}
