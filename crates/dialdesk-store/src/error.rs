use dialdesk_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid id string: {0}")]
    InvalidId(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("invalid data path: {0}")]
    InvalidDataPath(PathBuf),
    #[error("duplicate identification code: {0}")]
    DuplicateIdentificationCode(String),
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Io,
    Sql,
    Core,
    Json,
    MissingHomeDir,
    InvalidId,
    NotFound,
    Migration,
    InvalidDataPath,
    DuplicateIdentificationCode,
    DuplicateEmail,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Io(_) => StoreErrorKind::Io,
            StoreError::Sql(_) => StoreErrorKind::Sql,
            StoreError::Core(_) => StoreErrorKind::Core,
            StoreError::Json(_) => StoreErrorKind::Json,
            StoreError::MissingHomeDir => StoreErrorKind::MissingHomeDir,
            StoreError::InvalidId(_) => StoreErrorKind::InvalidId,
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::Migration(_) => StoreErrorKind::Migration,
            StoreError::InvalidDataPath(_) => StoreErrorKind::InvalidDataPath,
            StoreError::DuplicateIdentificationCode(_) => {
                StoreErrorKind::DuplicateIdentificationCode
            }
            StoreError::DuplicateEmail(_) => StoreErrorKind::DuplicateEmail,
        }
    }
}
