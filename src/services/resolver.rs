//! 查询与缓存编排
//!
//! normalize → lookup → fetch → insert, strictly in that order for one call.
//! Concurrent calls for the same identity are not serialized in process; the
//! store's unique indexes decide the winner and the loser re-reads.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::errors::{GeoError, Result};
use crate::identity::{Identity, classify, is_valid_ipv4};
use crate::services::geoip::{GeoLookup, ProviderRecord};
use crate::storage::{
    Coordinates, GeoMetadata, GeoRecord, GeoStore, NewGeoRecord, StorageConfig,
};

/// 最近记录列表的分页大小
pub const RECENT_PAGE_SIZE: u64 = 100;

pub const UNRESOLVABLE_MESSAGE: &str = "Unable to fetch geolocation data";
pub const CREATE_INVALID_MESSAGE: &str = "A valid 'ip' or 'url' is required";
pub const NOT_FOUND_MESSAGE: &str = "Geolocation not found";

/// 成功的查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// 已存在，未调用 provider
    Found(GeoRecord),
    /// 本次调用获取（或直接提供）并写入
    Created(GeoRecord),
}

impl Resolution {
    pub fn record(&self) -> &GeoRecord {
        match self {
            Resolution::Found(record) | Resolution::Created(record) => record,
        }
    }

    pub fn into_record(self) -> GeoRecord {
        match self {
            Resolution::Found(record) | Resolution::Created(record) => record,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Resolution::Created(_))
    }
}

/// 直接创建请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGeoRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl CreateGeoRequest {
    fn metadata(&self) -> GeoMetadata {
        GeoMetadata {
            country_code: non_blank(&self.country_code),
            country_name: non_blank(&self.country_name),
            region_code: non_blank(&self.region_code),
            city: non_blank(&self.city),
        }
    }
}

/// Identities and coordinates of a create request after validation
struct ValidatedCreate {
    /// IP wins when both are given
    identity: Identity,
    ip: Option<String>,
    url: Option<String>,
    coordinates: Option<Coordinates>,
    metadata: GeoMetadata,
}

#[derive(Clone)]
pub struct GeoResolver {
    store: Arc<dyn GeoStore>,
    provider: Arc<dyn GeoLookup>,
}

impl GeoResolver {
    pub fn new(store: Arc<dyn GeoStore>, provider: Arc<dyn GeoLookup>) -> Self {
        Self { store, provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// 查询或创建（原始 IP / URL）
    ///
    /// Errors: `InvalidIdentity` before any I/O, `ProviderUnavailable` when
    /// the provider has no data, `PersistFailed` when the fetched record cannot
    /// be stored, `StorageUnavailable` when the store cannot be reached.
    pub async fn resolve(&self, raw: &str) -> Result<Resolution> {
        let identity = classify(raw)?;
        trace!("Resolving {} identity {}", identity.kind(), identity);

        if let Some(record) = self.store.lookup(&identity).await? {
            debug!("Cache hit for {}", identity);
            return Ok(Resolution::Found(record));
        }

        let fetched = self.fetch(&identity).await?;
        let url = match &identity {
            Identity::Url(canonical) => Some(canonical.clone()),
            Identity::Ip(_) => None,
        };
        let record = NewGeoRecord::new(fetched.ip, url, fetched.coordinates)
            .with_metadata(fetched.metadata);

        self.persist(&identity, record).await
    }

    /// 按显式字段直接创建
    ///
    /// With both coordinates the record is stored as given; with neither the
    /// provider is queried by IP, falling back to the URL.
    pub async fn create(&self, request: CreateGeoRequest) -> Result<Resolution> {
        let validated = validate_create(&request)?;

        if let Some(ip) = &validated.ip
            && let Some(record) = self.store.lookup(&Identity::Ip(ip.clone())).await?
        {
            return Ok(Resolution::Found(record));
        }
        if let Some(url) = &validated.url
            && let Some(record) = self.store.lookup(&Identity::Url(url.clone())).await?
        {
            return Ok(Resolution::Found(record));
        }

        let identity = validated.identity.clone();
        let record = match validated.coordinates {
            Some(coordinates) => {
                NewGeoRecord::new(validated.ip, validated.url, coordinates)
                    .with_metadata(validated.metadata)
            }
            None => {
                let fetched = self.fetch(&identity).await?;
                let ip = validated.ip.or(fetched.ip);
                let metadata = merge_metadata(validated.metadata, fetched.metadata);
                NewGeoRecord::new(ip, validated.url, fetched.coordinates).with_metadata(metadata)
            }
        };

        self.persist(&identity, record).await
    }

    /// 删除 IP / URL 对应的记录
    pub async fn delete(&self, raw: &str) -> Result<()> {
        let identity = classify(raw)?;
        if self.store.delete(&identity).await? {
            debug!("Deleted geolocation for {}", identity);
            Ok(())
        } else {
            Err(GeoError::not_found(NOT_FOUND_MESSAGE))
        }
    }

    /// 最近的记录，新的在前，最多 `RECENT_PAGE_SIZE` 条
    pub async fn list_recent(&self) -> Result<Vec<GeoRecord>> {
        self.store.list_recent(RECENT_PAGE_SIZE).await
    }

    pub async fn record_count(&self) -> Result<u64> {
        self.store.count().await
    }

    pub fn backend_config(&self) -> StorageConfig {
        self.store.backend_config()
    }

    async fn fetch(&self, identity: &Identity) -> Result<ProviderRecord> {
        self.provider.fetch(identity).await.map_err(|e| {
            warn!("{} had no data for {}: {}", self.provider.name(), identity, e.reason);
            GeoError::provider_unavailable(UNRESOLVABLE_MESSAGE)
        })
    }

    async fn persist(&self, identity: &Identity, record: NewGeoRecord) -> Result<Resolution> {
        let errors = record.validate();
        if !errors.is_empty() {
            warn!("Refusing to store record for {}: {}", identity, errors.join(", "));
            return Err(GeoError::persist_failed(errors));
        }

        let conflicting_ip = record.ip.clone();
        match self.store.insert(record).await {
            Ok(stored) => {
                debug!("Stored geolocation #{} for {}", stored.id, identity);
                Ok(Resolution::Created(stored))
            }
            Err(GeoError::UniquenessConflict(detail)) => {
                debug!("Lost insert race for {}: {}", identity, detail);
                self.recover_conflict(identity, conflicting_ip).await
            }
            Err(e) => Err(e),
        }
    }

    /// Another writer got there first: return its record, or explain which
    /// identity is already taken by a different record.
    async fn recover_conflict(
        &self,
        identity: &Identity,
        ip: Option<String>,
    ) -> Result<Resolution> {
        if let Some(record) = self.store.lookup(identity).await? {
            return Ok(Resolution::Found(record));
        }

        let ip_taken = match ip {
            Some(ip) if !identity.is_ip() => self.store.lookup(&Identity::Ip(ip)).await?.is_some(),
            _ => identity.is_ip(),
        };
        let message = if ip_taken {
            "Ip has already been taken"
        } else {
            "Url has already been taken"
        };
        Err(GeoError::persist_failed(vec![message.to_string()]))
    }
}

fn validate_create(request: &CreateGeoRequest) -> Result<ValidatedCreate> {
    let invalid = || GeoError::invalid_identity(CREATE_INVALID_MESSAGE);

    let ip = non_blank(&request.ip);
    let url = non_blank(&request.url);
    if ip.is_none() && url.is_none() {
        return Err(invalid());
    }

    if let Some(ip) = &ip
        && !is_valid_ipv4(ip)
    {
        return Err(invalid());
    }

    let url = match url {
        Some(raw) => match classify(&raw) {
            Ok(Identity::Url(canonical)) => Some(canonical),
            _ => return Err(invalid()),
        },
        None => None,
    };

    let coordinates = match (request.longitude, request.latitude) {
        (Some(longitude), Some(latitude)) => Some(Coordinates::new(longitude, latitude)),
        (None, None) => None,
        _ => {
            return Err(GeoError::invalid_identity(
                "Latitude and longitude must be supplied together",
            ));
        }
    };

    let identity = match (&ip, &url) {
        (Some(ip), _) => Identity::Ip(ip.clone()),
        (None, Some(url)) => Identity::Url(url.clone()),
        (None, None) => return Err(invalid()),
    };

    Ok(ValidatedCreate {
        identity,
        ip,
        url,
        coordinates,
        metadata: request.metadata(),
    })
}

/// 逐字段合并：请求提供的值优先于 provider 的值
fn merge_metadata(supplied: GeoMetadata, fetched: GeoMetadata) -> GeoMetadata {
    GeoMetadata {
        country_code: supplied.country_code.or(fetched.country_code),
        country_name: supplied.country_name.or(fetched.country_name),
        region_code: supplied.region_code.or(fetched.region_code),
        city: supplied.city.or(fetched.city),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
