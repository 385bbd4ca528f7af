use std::fmt;

use actix_web::http::StatusCode;
use sea_orm::DbErr;
use sea_orm::error::{RuntimeErr, SqlErr};

#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    InvalidIdentity(String),
    StorageUnavailable(String),
    ProviderUnavailable(String),
    UniquenessConflict(String),
    PersistFailed(Vec<String>),
    NotFound(String),
    Config(String),
    Unexpected(String),
}

impl GeoError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeoError::InvalidIdentity(_) => "E001",
            GeoError::StorageUnavailable(_) => "E002",
            GeoError::ProviderUnavailable(_) => "E003",
            GeoError::UniquenessConflict(_) => "E004",
            GeoError::PersistFailed(_) => "E005",
            GeoError::NotFound(_) => "E006",
            GeoError::Config(_) => "E007",
            GeoError::Unexpected(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeoError::InvalidIdentity(_) => "Invalid Identity",
            GeoError::StorageUnavailable(_) => "Storage Unavailable",
            GeoError::ProviderUnavailable(_) => "Provider Unavailable",
            GeoError::UniquenessConflict(_) => "Uniqueness Conflict",
            GeoError::PersistFailed(_) => "Persist Failed",
            GeoError::NotFound(_) => "Resource Not Found",
            GeoError::Config(_) => "Configuration Error",
            GeoError::Unexpected(_) => "Unexpected Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> String {
        match self {
            GeoError::InvalidIdentity(msg)
            | GeoError::StorageUnavailable(msg)
            | GeoError::ProviderUnavailable(msg)
            | GeoError::UniquenessConflict(msg)
            | GeoError::NotFound(msg)
            | GeoError::Config(msg)
            | GeoError::Unexpected(msg) => msg.clone(),
            GeoError::PersistFailed(messages) => messages.join(", "),
        }
    }

    /// HTTP 层使用的状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            GeoError::InvalidIdentity(_)
            | GeoError::ProviderUnavailable(_)
            | GeoError::PersistFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GeoError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GeoError::NotFound(_) => StatusCode::NOT_FOUND,
            GeoError::UniquenessConflict(_) => StatusCode::CONFLICT,
            GeoError::Config(_) | GeoError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 CLI 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeoError {}

// 便捷的构造函数
impl GeoError {
    pub fn invalid_identity<T: Into<String>>(msg: T) -> Self {
        GeoError::InvalidIdentity(msg.into())
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        GeoError::StorageUnavailable(msg.into())
    }

    pub fn provider_unavailable<T: Into<String>>(msg: T) -> Self {
        GeoError::ProviderUnavailable(msg.into())
    }

    pub fn uniqueness_conflict<T: Into<String>>(msg: T) -> Self {
        GeoError::UniquenessConflict(msg.into())
    }

    pub fn persist_failed(messages: Vec<String>) -> Self {
        GeoError::PersistFailed(messages)
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GeoError::NotFound(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        GeoError::Config(msg.into())
    }

    pub fn unexpected<T: Into<String>>(msg: T) -> Self {
        GeoError::Unexpected(msg.into())
    }
}

impl From<DbErr> for GeoError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return GeoError::UniquenessConflict(detail);
        }
        if matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
            || database_error_code(&err).is_some_and(|code| is_rejected_data_code(&code))
        {
            return GeoError::PersistFailed(vec![err.to_string()]);
        }
        GeoError::StorageUnavailable(err.to_string())
    }
}

fn database_error_code(err: &DbErr) -> Option<String> {
    use std::ops::Deref;

    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx_err))) = err
    else {
        return None;
    };
    let db_err = sqlx_err.deref().as_database_error()?;
    db_err.code().map(|code| code.into_owned())
}

/// 后端拒绝写入的数据（非连接故障）
///
/// SQLSTATE class 22 / 23 on PostgreSQL and MySQL; SQLite extended codes of
/// SQLITE_TOOBIG (18), SQLITE_CONSTRAINT (19) and SQLITE_MISMATCH (20).
fn is_rejected_data_code(code: &str) -> bool {
    if code.len() == 5 {
        return code.starts_with("22") || code.starts_with("23");
    }
    code.parse::<u32>()
        .is_ok_and(|n| matches!(n & 0xff, 18..=20))
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::Unexpected(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;
