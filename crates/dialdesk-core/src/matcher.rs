use crate::domain::{CallRecord, CallWindow, ImportedCallerRecord, PhoneMatchRule};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerMatch {
    pub caller_id: String,
    pub matches: Vec<CallRecord>,
}

/// Matched call records per caller, in the order the callers were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchSet {
    pub entries: Vec<CallerMatch>,
}

impl MatchSet {
    pub fn get(&self, caller_id: &str) -> Option<&[CallRecord]> {
        self.entries
            .iter()
            .find(|entry| entry.caller_id == caller_id)
            .map(|entry| entry.matches.as_slice())
    }

    pub fn matched_callers(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.matches.is_empty())
            .count()
    }

    pub fn total_matches(&self) -> usize {
        self.entries.iter().map(|entry| entry.matches.len()).sum()
    }
}

/// Every number a caller can be matched on, reduced with `rule`.
pub fn caller_keys(caller: &ImportedCallerRecord, rule: &PhoneMatchRule) -> Vec<String> {
    let mut keys: Vec<String> = [&caller.caller_number, &caller.receiver_number]
        .into_iter()
        .filter_map(|number| rule.key(number))
        .collect();
    keys.dedup();
    keys
}

/// Pairs each caller with the records whose `src` or `dst` matches the
/// caller or receiver number. Matches are newest first.
pub fn match_callers(
    callers: &[ImportedCallerRecord],
    records: &[CallRecord],
    rule: &PhoneMatchRule,
    window: Option<&CallWindow>,
) -> MatchSet {
    let mut by_number: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        if window.is_some_and(|window| !window.contains(record.calldate)) {
            continue;
        }
        let src = rule.key(&record.src);
        let dst = rule.key(&record.dst);
        if let Some(src) = src.as_ref() {
            by_number.entry(src.clone()).or_default().push(index);
        }
        if let Some(dst) = dst {
            if src.as_ref() != Some(&dst) {
                by_number.entry(dst).or_default().push(index);
            }
        }
    }

    let entries = callers
        .iter()
        .map(|caller| {
            let mut hits: BTreeSet<usize> = BTreeSet::new();
            for key in caller_keys(caller, rule) {
                if let Some(indexes) = by_number.get(&key) {
                    hits.extend(indexes.iter().copied());
                }
            }
            let mut matches: Vec<CallRecord> =
                hits.into_iter().map(|index| records[index].clone()).collect();
            matches.sort_by(|a, b| {
                b.calldate
                    .cmp(&a.calldate)
                    .then_with(|| a.uniqueid.cmp(&b.uniqueid))
            });
            CallerMatch {
                caller_id: caller.id.clone(),
                matches,
            }
        })
        .collect();

    MatchSet { entries }
}
