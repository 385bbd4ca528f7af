//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.

use sea_orm::{ActiveModelTrait, EntityTrait, QueryFilter};
use tracing::info;

use super::converters::{model_to_record, new_record_to_active_model};
use super::query::identity_condition;
use super::{SeaOrmStorage, retry};
use crate::errors::{GeoError, Result};
use crate::identity::Identity;
use crate::storage::models::{GeoRecord, NewGeoRecord};

use migration::entities::geolocation;

impl SeaOrmStorage {
    /// Insert without retry: a unique index violation must reach the caller
    /// as `UniquenessConflict` on the first attempt.
    pub async fn insert_record(&self, record: NewGeoRecord) -> Result<GeoRecord> {
        let active_model = new_record_to_active_model(&record);

        let model = active_model.insert(&self.db).await.map_err(|e| {
            let err = GeoError::from(e);
            if let GeoError::UniquenessConflict(ref detail) = err {
                info!(
                    "Insert lost uniqueness race (ip: {:?}, url: {:?}): {}",
                    record.ip, record.url, detail
                );
            }
            err
        })?;

        info!(
            "Geolocation created: id={} ip={:?} url={:?}",
            model.id, model.ip, model.url
        );
        Ok(model_to_record(model))
    }

    pub async fn remove_by_identity(&self, identity: &Identity) -> Result<bool> {
        let db = &self.db;

        let result = retry::with_retry(
            &format!("delete({})", identity),
            self.retry_config,
            || async {
                geolocation::Entity::delete_many()
                    .filter(identity_condition(identity))
                    .exec(db)
                    .await
            },
        )
        .await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Geolocation deleted: {} {}", identity.kind(), identity);
        }
        Ok(removed)
    }
}
