//! Spreadsheet row normalization.
//!
//! Uploaded sheets name the same column in several ways (`caller_number`,
//! `callerNumber`, `Caller Number`). Each canonical field lists the source
//! keys it accepts in priority order; the first key whose value is non-empty
//! wins. Keys compare ignoring ASCII case and surrounding whitespace.

use crate::domain::{CompanyDraft, ContactPair, ImportedCallerRecord, MAX_CONTACT_PAIRS};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// One spreadsheet row: column header to cell text.
pub type RawRow = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerField {
    Id,
    CompanyName,
    IdentificationCode,
    ContactPerson(usize),
    ContactPhone(usize),
    CallerName,
    CallerNumber,
    ReceiverNumber,
    CallCount,
    CallDate,
    CallDuration,
    CallStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub field: CallerField,
    pub keys: &'static [&'static str],
}

const fn aliases(field: CallerField, keys: &'static [&'static str]) -> FieldAliases {
    FieldAliases { field, keys }
}

pub const CALLER_ALIASES: &[FieldAliases] = &[
    aliases(CallerField::Id, &["id", "_id", "uid", "row_id", "rowId"]),
    aliases(
        CallerField::CompanyName,
        &["company_name", "companyName", "company name", "company"],
    ),
    aliases(
        CallerField::IdentificationCode,
        &[
            "identification_code",
            "identificationCode",
            "identification code",
            "id_code",
            "idCode",
            "code",
        ],
    ),
    aliases(
        CallerField::ContactPerson(0),
        &[
            "contact_person_1",
            "contact person 1",
            "contactPerson1",
            "contact_person1",
            "contact1_name",
            "contact1Name",
            "contact_person",
            "contactPerson",
        ],
    ),
    aliases(
        CallerField::ContactPhone(0),
        &[
            "contact_phone_1",
            "contact phone 1",
            "contactPhone1",
            "contact_phone1",
            "contact1_phone",
            "contact1Phone",
            "contact_phone",
            "contactPhone",
            "phone",
        ],
    ),
    aliases(
        CallerField::ContactPerson(1),
        &[
            "contact_person_2",
            "contact person 2",
            "contactPerson2",
            "contact_person2",
            "contact2_name",
            "contact2Name",
        ],
    ),
    aliases(
        CallerField::ContactPhone(1),
        &[
            "contact_phone_2",
            "contact phone 2",
            "contactPhone2",
            "contact_phone2",
            "contact2_phone",
            "contact2Phone",
        ],
    ),
    aliases(
        CallerField::ContactPerson(2),
        &[
            "contact_person_3",
            "contact person 3",
            "contactPerson3",
            "contact_person3",
            "contact3_name",
            "contact3Name",
        ],
    ),
    aliases(
        CallerField::ContactPhone(2),
        &[
            "contact_phone_3",
            "contact phone 3",
            "contactPhone3",
            "contact_phone3",
            "contact3_phone",
            "contact3Phone",
        ],
    ),
    aliases(
        CallerField::CallerName,
        &["caller_name", "callerName", "caller name", "caller"],
    ),
    aliases(
        CallerField::CallerNumber,
        &[
            "caller_number",
            "callerNumber",
            "caller number",
            "caller_phone",
            "callerPhone",
            "src",
        ],
    ),
    aliases(
        CallerField::ReceiverNumber,
        &[
            "receiver_number",
            "receiverNumber",
            "receiver number",
            "receiver_phone",
            "receiverPhone",
            "dst",
        ],
    ),
    aliases(
        CallerField::CallCount,
        &["call_count", "callCount", "call count", "calls"],
    ),
    aliases(
        CallerField::CallDate,
        &["call_date", "callDate", "call date", "calldate", "date"],
    ),
    aliases(
        CallerField::CallDuration,
        &["call_duration", "callDuration", "call duration", "duration"],
    ),
    aliases(
        CallerField::CallStatus,
        &["call_status", "callStatus", "call status", "status", "disposition"],
    ),
];

const COMPANY_NAME_KEYS: &[&str] = &["company_name", "companyName", "company name", "company", "name"];

const TENDER_KEY_PREFIXES: &[&str] = &["tender", "contract"];

/// Normalizes a batch. Ids are unique within the returned batch: a row
/// whose own id was already taken by an earlier row gets a fresh one.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<ImportedCallerRecord> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .map(|row| {
            let mut record = normalize_row(row);
            while !seen.insert(record.id.clone()) {
                record.id = Uuid::new_v4().to_string();
            }
            record
        })
        .collect()
}

pub fn normalize_row(row: &RawRow) -> ImportedCallerRecord {
    let lookup = RowLookup::new(row);
    let mut record = ImportedCallerRecord::default();

    for entry in CALLER_ALIASES {
        let Some(value) = lookup.first_present(entry.keys) else {
            continue;
        };
        match entry.field {
            CallerField::Id => record.id = value.to_string(),
            CallerField::CompanyName => record.company_name = value.to_string(),
            CallerField::IdentificationCode => record.identification_code = value.to_string(),
            CallerField::ContactPerson(index) => record.contacts[index].person = value.to_string(),
            CallerField::ContactPhone(index) => record.contacts[index].phone = value.to_string(),
            CallerField::CallerName => record.caller_name = value.to_string(),
            CallerField::CallerNumber => record.caller_number = value.to_string(),
            CallerField::ReceiverNumber => record.receiver_number = value.to_string(),
            CallerField::CallCount => record.call_count = parse_count(value),
            CallerField::CallDate => record.call_date = value.to_string(),
            CallerField::CallDuration => record.call_duration = parse_duration_seconds(value),
            CallerField::CallStatus => record.call_status = value.to_string(),
        }
    }

    if record.id.is_empty() {
        record.id = Uuid::new_v4().to_string();
    }
    record
}

/// Builds a company draft from a sheet row. The draft is not validated;
/// rows lacking a code or name are rejected by [`CompanyDraft::validated`].
pub fn normalize_company_row(row: &RawRow) -> CompanyDraft {
    let lookup = RowLookup::new(row);
    let mut draft = CompanyDraft {
        identification_code: lookup
            .first_present(field_keys(CallerField::IdentificationCode))
            .unwrap_or_default()
            .to_string(),
        name: lookup
            .first_present(COMPANY_NAME_KEYS)
            .unwrap_or_default()
            .to_string(),
        ..Default::default()
    };

    for index in 0..MAX_CONTACT_PAIRS {
        let pair = ContactPair {
            person: lookup
                .first_present(field_keys(CallerField::ContactPerson(index)))
                .unwrap_or_default()
                .to_string(),
            phone: lookup
                .first_present(field_keys(CallerField::ContactPhone(index)))
                .unwrap_or_default()
                .to_string(),
        };
        if !pair.is_empty() {
            draft.contacts.push(pair);
        }
    }

    for (key, value) in row {
        let key = key.trim();
        let lower = key.to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if TENDER_KEY_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
        {
            draft.tender.insert(key.to_string(), value.to_string());
        }
    }

    draft
}

fn field_keys(field: CallerField) -> &'static [&'static str] {
    CALLER_ALIASES
        .iter()
        .find(|entry| entry.field == field)
        .map(|entry| entry.keys)
        .unwrap_or(&[])
}

struct RowLookup<'a> {
    values: HashMap<String, &'a str>,
}

impl<'a> RowLookup<'a> {
    fn new(row: &'a RawRow) -> Self {
        let mut values = HashMap::new();
        for (key, value) in row {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            values
                .entry(key.trim().to_ascii_lowercase())
                .or_insert(value);
        }
        Self { values }
    }

    fn first_present(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter()
            .find_map(|key| self.values.get(&key.to_ascii_lowercase()).copied())
    }
}

fn parse_count(value: &str) -> u32 {
    if let Ok(count) = value.parse::<u32>() {
        return count;
    }
    match value.parse::<f64>() {
        Ok(count) if count.is_finite() && count >= 0.0 && count.fract() == 0.0 => {
            if count > f64::from(u32::MAX) {
                0
            } else {
                count as u32
            }
        }
        _ => 0,
    }
}

/// Accepts plain seconds, `MM:SS` or `HH:MM:SS`.
fn parse_duration_seconds(value: &str) -> i64 {
    if value.contains(':') {
        let parts: Option<Vec<i64>> = value
            .split(':')
            .map(|part| part.trim().parse::<i64>().ok().filter(|n| *n >= 0))
            .collect();
        let total = match parts.as_deref() {
            Some([minutes, seconds]) => clock_seconds(0, *minutes, *seconds),
            Some([hours, minutes, seconds]) => clock_seconds(*hours, *minutes, *seconds),
            _ => None,
        };
        return total.unwrap_or(0);
    }
    if let Ok(seconds) = value.parse::<i64>() {
        return seconds.max(0);
    }
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 && seconds < i64::MAX as f64 => {
            seconds.round() as i64
        }
        _ => 0,
    }
}

fn clock_seconds(hours: i64, minutes: i64, seconds: i64) -> Option<i64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
