//! 查询标识归一化
//!
//! Classifies a raw lookup value as an IPv4 address or a domain, and reduces
//! domains to their registrable form so that `https://www.example.com/`,
//! `http://example.com` and `example.com` share a single storage key.
//!
//! 纯函数：不做 DNS 解析，不访问存储，不读取任何文件。

use std::fmt;
use std::net::Ipv4Addr;

use tracing::trace;
use url::Url;

use crate::errors::{GeoError, Result};

pub const INVALID_IDENTITY_MESSAGE: &str = "Invalid IP address or URL format";

/// 归一化后的查询键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Strict dotted-decimal IPv4 address, stored as typed.
    Ip(String),
    /// Lowercase registrable domain without scheme, `www.`, path or query.
    Url(String),
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Ip(value) | Identity::Url(value) => value,
        }
    }

    pub fn is_ip(&self) -> bool {
        matches!(self, Identity::Ip(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Identity::Ip(_) => "ip",
            Identity::Url(_) => "url",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对原始输入分类
///
/// IPv4 wins over every other interpretation: a value with the shape of four
/// numeric octets is either a valid IP or invalid, never a domain.
pub fn classify(raw: &str) -> Result<Identity> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(GeoError::invalid_identity(INVALID_IDENTITY_MESSAGE));
    }

    if is_ipv4_shaped(value) {
        return if is_valid_ipv4(value) {
            Ok(Identity::Ip(value.to_string()))
        } else {
            Err(GeoError::invalid_identity(INVALID_IDENTITY_MESSAGE))
        };
    }

    match canonical_domain(value) {
        Some(domain) => {
            trace!("classified {:?} as url identity {}", raw, domain);
            Ok(Identity::Url(domain))
        }
        None => Err(GeoError::invalid_identity(INVALID_IDENTITY_MESSAGE)),
    }
}

/// 严格的点分十进制 IPv4（四段，0-255，无前导零）
pub fn is_valid_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv4_shaped(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// 将 URL 或裸域名规约为可注册域名
///
/// 无法提取合理域名时返回 `None`
pub fn canonical_domain(value: &str) -> Option<String> {
    let host = extract_host(value)?;
    if !is_plausible_domain(&host) {
        return None;
    }

    let registrable = registrable_domain(&host);
    Some(registrable.to_lowercase())
}

/// 存储的 `url` 是否已是规范形式
pub fn is_canonical_url(value: &str) -> bool {
    canonical_domain(value).as_deref() == Some(value)
}

fn has_http_scheme(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn with_scheme(value: &str) -> String {
    if has_http_scheme(value) {
        value.to_string()
    } else {
        format!("http://{}", value)
    }
}

/// Extract the host part; if URL parsing fails the raw value itself is the
/// host candidate (minus anything after the first `/`, `?` or `#`).
fn extract_host(value: &str) -> Option<String> {
    let host = match Url::parse(&with_scheme(value)) {
        Ok(url) => url.host_str().map(str::to_string),
        Err(_) => None,
    };

    let host = host.unwrap_or_else(|| {
        let stripped = value
            .strip_prefix("http://")
            .or_else(|| value.strip_prefix("https://"))
            .unwrap_or(value);
        stripped
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .to_string()
    });

    let host = host.trim_end_matches('.').to_lowercase();
    if host.is_empty() { None } else { Some(host) }
}

/// 域名合理性检查：至少一个点，顶级域 2-6 个字母，
/// 每段只含字母、数字和中间连字符
fn is_plausible_domain(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let tld = labels[labels.len() - 1];
    if !(2..=6).contains(&tld.len()) || !tld.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

/// Registrable domain via the compiled-in public suffix list; falls back to
/// the last two labels when the host is itself a public suffix.
fn registrable_domain(host: &str) -> String {
    let host = host.strip_prefix("www.").unwrap_or(host);

    if let Some(domain) = psl::domain_str(host) {
        return domain.to_string();
    }

    let labels: Vec<&str> = host.split('.').collect();
    labels[labels.len().saturating_sub(2)..].join(".")
}
