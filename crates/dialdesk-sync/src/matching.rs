use crate::error::Result;
use crate::source::{CdrFilter, CdrQuery, CdrSource};
use dialdesk_core::domain::{CallRecord, CallWindow, ImportedCallerRecord, PhoneMatchRule};
use dialdesk_core::matcher::{caller_keys, match_callers, MatchSet};
use dialdesk_store::Store;
use tracing::debug;

/// Matches callers against imported call records.
pub fn match_stored(
    store: &Store,
    callers: &[ImportedCallerRecord],
    rule: &PhoneMatchRule,
    window: &CallWindow,
) -> Result<MatchSet> {
    let mut keys: Vec<String> = callers
        .iter()
        .flat_map(|caller| caller_keys(caller, rule))
        .collect();
    keys.sort();
    keys.dedup();

    let records = store.call_records().list_for_numbers(&keys, window)?;
    debug!(
        callers = callers.len(),
        numbers = keys.len(),
        candidates = records.len(),
        "matching against stored records"
    );
    Ok(match_callers(callers, &records, rule, Some(window)))
}

/// Matches callers directly against the telephony source, without importing.
/// `limit` caps how many source rows inside the window are considered.
pub fn match_live(
    source: &dyn CdrSource,
    callers: &[ImportedCallerRecord],
    rule: &PhoneMatchRule,
    window: &CallWindow,
    limit: Option<usize>,
) -> Result<MatchSet> {
    source.check_schema()?;
    let filter = if window.is_unbounded() {
        CdrFilter::All
    } else {
        CdrFilter::Window(*window)
    };
    let records: Vec<CallRecord> = source
        .fetch(&CdrQuery { filter, limit })?
        .into_iter()
        .map(CallRecord::unsaved)
        .collect();
    debug!(
        source = source.source_name(),
        callers = callers.len(),
        candidates = records.len(),
        "matching against live source"
    );
    Ok(match_callers(callers, &records, rule, Some(window)))
}
