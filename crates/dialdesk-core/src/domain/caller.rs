use crate::domain::company::ContactPair;
use serde::{Deserialize, Serialize};

/// Canonical shape of a caller row uploaded from a spreadsheet.
///
/// Every field is always present; the normalizer fills absent text with an
/// empty string and absent numbers with zero. Records are display rows and
/// are never persisted, so `id` is only stable for the lifetime of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedCallerRecord {
    pub id: String,
    pub company_name: String,
    pub identification_code: String,
    pub contacts: [ContactPair; 3],
    pub caller_name: String,
    pub caller_number: String,
    pub receiver_number: String,
    pub call_count: u32,
    pub call_date: String,
    pub call_duration: i64,
    pub call_status: String,
}
