//! 地理位置服务模块
//!
//! 缓存未命中时查询外部 HTTP 服务：
//! - ipstack (api.ipstack.com)
//! - ip-api (ip-api.com)

mod external_api;
mod provider;

pub use external_api::{ExternalApiProvider, parse_payload};
pub use provider::{GeoLookup, ProviderRecord, ProviderUnavailable, build_provider};
