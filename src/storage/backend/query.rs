//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::trace;

use super::converters::model_to_record;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::identity::Identity;
use crate::storage::models::GeoRecord;

use migration::entities::geolocation;

/// Exact-match filter for an identity; never partial or fuzzy.
pub(super) fn identity_condition(identity: &Identity) -> Condition {
    let condition = Condition::all();
    match identity {
        Identity::Ip(ip) => condition.add(geolocation::Column::Ip.eq(ip.as_str())),
        Identity::Url(url) => condition.add(geolocation::Column::Url.eq(url.as_str())),
    }
}

impl SeaOrmStorage {
    pub async fn find_by_identity(&self, identity: &Identity) -> Result<Option<GeoRecord>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("lookup({})", identity),
            self.retry_config,
            || async {
                geolocation::Entity::find()
                    .filter(identity_condition(identity))
                    .one(db)
                    .await
            },
        )
        .await?;

        trace!(
            "lookup {} {}: {}",
            identity.kind(),
            identity,
            if model.is_some() { "hit" } else { "miss" }
        );
        Ok(model.map(model_to_record))
    }

    pub async fn load_recent(&self, limit: u64) -> Result<Vec<GeoRecord>> {
        let db = &self.db;

        let models = retry::with_retry("list_recent", self.retry_config, || async {
            geolocation::Entity::find()
                .order_by_desc(geolocation::Column::CreatedAt)
                .order_by_desc(geolocation::Column::Id)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_record).collect())
    }

    pub async fn count_records(&self) -> Result<u64> {
        let db = &self.db;

        let count = retry::with_retry("count", self.retry_config, || async {
            geolocation::Entity::find().count(db).await
        })
        .await?;

        Ok(count)
    }
}
