use dialdesk_core::CoreError;
use dialdesk_store::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("cdr source error: {0}")]
    Source(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("cdr source schema mismatch: {0}")]
    Schema(String),
    #[error("invalid import options: {0}")]
    InvalidOptions(String),
    #[error("insert failed after {committed} rows were committed: {source}")]
    Insert {
        committed: usize,
        #[source]
        source: StoreError,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
