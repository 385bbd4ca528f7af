use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{is_canonical_url, is_valid_ipv4};

pub const COUNTRY_CODE_MAX_LEN: usize = 3;
pub const COUNTRY_NAME_MAX_LEN: usize = 100;
pub const REGION_CODE_MAX_LEN: usize = 10;
pub const CITY_MAX_LEN: usize = 100;

/// 地理坐标（WGS84 经度 / 纬度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// 记录附带的描述性元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoMetadata {
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
}

/// 已持久化的地理位置记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub id: i64,
    pub ip: Option<String>,
    pub url: Option<String>,
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(flatten)]
    pub metadata: GeoMetadata,
    pub created_at: DateTime<Utc>,
}

/// 尚未写入的记录
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeoRecord {
    pub ip: Option<String>,
    pub url: Option<String>,
    pub coordinates: Coordinates,
    pub metadata: GeoMetadata,
    pub created_at: DateTime<Utc>,
}

impl NewGeoRecord {
    pub fn new(ip: Option<String>, url: Option<String>, coordinates: Coordinates) -> Self {
        Self {
            ip,
            url,
            coordinates,
            metadata: GeoMetadata::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: GeoMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// 校验错误信息；为空表示可以写入
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.ip.is_none() && self.url.is_none() {
            errors.push("Ip or url must be present".to_string());
        }

        if let Some(ip) = &self.ip
            && !is_valid_ipv4(ip)
        {
            errors.push("Ip must be a valid IPv4 address".to_string());
        }

        if let Some(url) = &self.url
            && !is_canonical_url(url)
        {
            errors.push("Url must be a valid URL or domain name".to_string());
        }

        let Coordinates {
            longitude,
            latitude,
        } = self.coordinates;
        if !longitude.is_finite() || !latitude.is_finite() {
            errors.push("Coordinates can't be blank".to_string());
        } else {
            if !(-90.0..=90.0).contains(&latitude) {
                errors.push("Latitude must be between -90 and 90".to_string());
            }
            if !(-180.0..=180.0).contains(&longitude) {
                errors.push("Longitude must be between -180 and 180".to_string());
            }
        }

        let bounds = [
            ("Country code", &self.metadata.country_code, COUNTRY_CODE_MAX_LEN),
            ("Country name", &self.metadata.country_name, COUNTRY_NAME_MAX_LEN),
            ("Region code", &self.metadata.region_code, REGION_CODE_MAX_LEN),
            ("City", &self.metadata.city, CITY_MAX_LEN),
        ];
        for (label, value, max) in bounds {
            if let Some(v) = value
                && v.chars().count() > max
            {
                errors.push(format!(
                    "{} is too long (maximum is {} characters)",
                    label, max
                ));
            }
        }

        errors
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
}
