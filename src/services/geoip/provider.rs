//! Provider 抽象层
//!
//! Provider 是静态配置选择的，构造后以 `Arc<dyn GeoLookup>` 注入 resolver，
//! 测试中可替换为 stub。

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::external_api::ExternalApiProvider;
use crate::config::ProviderConfig;
use crate::identity::Identity;
use crate::storage::{Coordinates, GeoMetadata};

/// 外部服务返回的地理位置数据
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRecord {
    /// Authoritative IP; may differ from the queried identity
    pub ip: Option<String>,
    pub coordinates: Coordinates,
    pub metadata: GeoMetadata,
}

/// The provider had no usable data.
///
/// Transport errors, timeouts, application-level failures and malformed
/// payloads all collapse into this one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUnavailable {
    pub reason: String,
}

impl ProviderUnavailable {
    pub fn new<T: Into<String>>(reason: T) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProviderUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider unavailable: {}", self.reason)
    }
}

impl std::error::Error for ProviderUnavailable {}

/// 地理位置查询 trait
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Fetch data for an identity; never panics on transport failure
    async fn fetch(&self, identity: &Identity) -> Result<ProviderRecord, ProviderUnavailable>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 根据配置构造 provider
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn GeoLookup> {
    let provider = ExternalApiProvider::from_config(config);
    info!(
        "Geolocation provider: {} ({}s timeout)",
        provider.name(),
        config.timeout_secs
    );
    Arc::new(provider)
}
