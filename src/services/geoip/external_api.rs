//! 外部地理位置 API 实现
//!
//! 同步 ureq 请求在 spawn_blocking 中执行。不做缓存也不重试：
//! 持久化存储本身就是缓存。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoLookup, ProviderRecord, ProviderUnavailable};
use crate::config::{ProviderConfig, ProviderKind};
use crate::identity::Identity;
use crate::storage::{Coordinates, GeoMetadata};

/// HTTP geolocation provider (ipstack or ip-api vocabulary)
pub struct ExternalApiProvider {
    kind: ProviderKind,
    api_url_template: String,
    api_key: String,
    agent: Agent,
}

impl ExternalApiProvider {
    /// `api_url_template` 使用 `{target}` 和 `{key}` 作为占位符
    pub fn new(kind: ProviderKind, api_url_template: &str, api_key: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            kind,
            api_url_template: api_url_template.to_string(),
            api_key: api_key.to_string(),
            agent,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.kind,
            config.url_template(),
            &config.api_key,
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    /// Request URL for an identity.
    ///
    /// URL identities are already bare registrable hosts, so the target is
    /// the identity value itself.
    pub fn request_url(&self, identity: &Identity) -> String {
        self.api_url_template
            .replace("{target}", &urlencoding::encode(identity.as_str()))
            .replace("{key}", &urlencoding::encode(&self.api_key))
    }

    /// 同步 HTTP 请求（在 spawn_blocking 中调用）
    fn fetch_sync(agent: Agent, url: String) -> Result<Value, ProviderUnavailable> {
        let resp = agent.get(&url).call().map_err(|e| {
            warn!("Geolocation API request failed: {}", e);
            ProviderUnavailable::new(format!("request failed: {}", e))
        })?;

        resp.into_body().read_json::<Value>().map_err(|e| {
            warn!("Geolocation API response parse failed: {}", e);
            ProviderUnavailable::new(format!("malformed response: {}", e))
        })
    }
}

#[async_trait]
impl GeoLookup for ExternalApiProvider {
    async fn fetch(&self, identity: &Identity) -> Result<ProviderRecord, ProviderUnavailable> {
        let url = self.request_url(identity);
        let agent = self.agent.clone();
        trace!("Fetching geolocation for {} from {}", identity, self.name());

        let json = tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url))
            .await
            .map_err(|e| {
                warn!("Geolocation spawn_blocking failed: {}", e);
                ProviderUnavailable::new("lookup task failed")
            })??;

        let record = parse_payload(&json, identity)?;
        trace!(
            "{} resolved {} to ({}, {})",
            self.name(),
            identity,
            record.coordinates.longitude,
            record.coordinates.latitude
        );
        Ok(record)
    }

    fn name(&self) -> &'static str {
        match self.kind {
            ProviderKind::Ipstack => "ipstack",
            ProviderKind::IpApi => "ip-api",
        }
    }
}

/// Map a provider payload into a `ProviderRecord`.
///
/// Both the ipstack and the ip-api field names are accepted. A payload that
/// signals failure or lacks either coordinate is `ProviderUnavailable`.
pub fn parse_payload(json: &Value, identity: &Identity) -> Result<ProviderRecord, ProviderUnavailable> {
    if !json.is_object() {
        return Err(ProviderUnavailable::new("payload is not an object"));
    }

    // ipstack: {"success": false, "error": {...}}
    if json["success"].as_bool() == Some(false) {
        let info = json["error"]["info"].as_str().unwrap_or("unknown error");
        return Err(ProviderUnavailable::new(format!("provider error: {}", info)));
    }

    // ip-api: {"status": "fail", "message": "..."}
    if json["status"].as_str() == Some("fail") {
        let message = json["message"].as_str().unwrap_or("unknown error");
        return Err(ProviderUnavailable::new(format!("provider error: {}", message)));
    }

    let latitude = number_field(json, &["latitude", "lat"]);
    let longitude = number_field(json, &["longitude", "lon"]);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(ProviderUnavailable::new("payload has no coordinates"));
    };

    let ip = text_field(json, &["ip", "query"]).or_else(|| match identity {
        Identity::Ip(value) => Some(value.clone()),
        Identity::Url(_) => None,
    });

    Ok(ProviderRecord {
        ip,
        coordinates: Coordinates::new(longitude, latitude),
        metadata: GeoMetadata {
            country_code: text_field(json, &["country_code", "countryCode"]),
            country_name: text_field(json, &["country_name", "country"]),
            region_code: text_field(json, &["region_code", "region"]),
            city: text_field(json, &["city"]),
        },
    })
}

fn number_field(json: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| json[*key].as_f64())
        .filter(|v| v.is_finite())
}

fn text_field(json: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| json[*key].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
