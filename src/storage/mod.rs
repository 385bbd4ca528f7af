use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::identity::Identity;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{Coordinates, GeoMetadata, GeoRecord, NewGeoRecord, StorageConfig};

/// Record store capability used by the resolver
///
/// `insert` must fail with `GeoError::UniquenessConflict` when another record
/// already holds the same IP or the same canonical URL; the backend enforces
/// this with unique indexes, not with a read-before-write.
#[async_trait]
pub trait GeoStore: Send + Sync {
    /// Exact match on `ip` for IP identities, on `url` for URL identities
    async fn lookup(&self, identity: &Identity) -> Result<Option<GeoRecord>>;

    async fn insert(&self, record: NewGeoRecord) -> Result<GeoRecord>;

    /// Returns true when a record was removed
    async fn delete(&self, identity: &Identity) -> Result<bool>;

    /// Most recent records first
    async fn list_recent(&self, limit: u64) -> Result<Vec<GeoRecord>>;

    async fn count(&self) -> Result<u64>;

    fn backend_config(&self) -> StorageConfig;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(&config.database_url)?;

        let storage = SeaOrmStorage::new(config, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
