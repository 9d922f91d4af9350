use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_IMPORT_LIMIT: usize = 1000;
pub const DEFAULT_IMPORT_DAYS: i64 = 30;
pub const DEFAULT_IMPORT_CHUNK_SIZE: usize = 100;
pub const DEFAULT_CDR_TABLE: &str = "cdr";

/// Outcome of a call attempt as reported by the switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Answered,
    NoAnswer,
    Busy,
    Failed,
    Congestion,
    Other(String),
}

impl Disposition {
    /// Parses Asterisk labels (`ANSWERED`, `NO ANSWER`, ...) and the
    /// snake_case labels this crate writes back to the store.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let key: String = trimmed
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "answered" => Self::Answered,
            "noanswer" => Self::NoAnswer,
            "busy" => Self::Busy,
            "failed" => Self::Failed,
            "congestion" => Self::Congestion,
            _ => Self::Other(trimmed.to_ascii_lowercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Answered => "answered",
            Self::NoAnswer => "no_answer",
            Self::Busy => "busy",
            Self::Failed => "failed",
            Self::Congestion => "congestion",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call detail record as read from the telephony source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdrRow {
    pub uniqueid: String,
    pub calldate: i64,
    pub clid: String,
    pub src: String,
    pub dst: String,
    pub duration: i64,
    pub disposition: Disposition,
    pub recordingfile: Option<String>,
}

impl CdrRow {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.uniqueid.trim().is_empty() {
            return Err(CoreError::EmptyUniqueId);
        }
        if self.duration < 0 {
            return Err(CoreError::InvalidDuration(self.duration));
        }
        Ok(())
    }
}

/// A call detail record held in the local store. Immutable once imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: i64,
    pub uniqueid: String,
    pub calldate: i64,
    pub clid: String,
    pub src: String,
    pub dst: String,
    pub duration: i64,
    pub disposition: Disposition,
    pub recordingfile: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CallRecord {
    /// Wraps a source row that has not been persisted, for matching
    /// directly against the telephony source.
    pub fn unsaved(row: CdrRow) -> Self {
        Self {
            id: 0,
            uniqueid: row.uniqueid,
            calldate: row.calldate,
            clid: row.clid,
            src: row.src,
            dst: row.dst,
            duration: row.duration,
            disposition: row.disposition,
            recordingfile: row.recordingfile,
            created_at: 0,
            updated_at: 0,
        }
    }
}
