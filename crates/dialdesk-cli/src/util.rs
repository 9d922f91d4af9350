use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use dialdesk_core::domain::{CallWindow, CompanyId, ContactPair};
use dialdesk_core::time::{parse_local_timestamp, DayEdge};
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use dialdesk_core::time::{format_duration, format_timestamp_datetime, now_utc};

/// `--from`/`--to` pair. A bare date in `--to` covers the whole day.
pub fn parse_window(from: Option<&str>, to: Option<&str>) -> Result<CallWindow> {
    let from = from
        .map(|raw| parse_local_timestamp(raw, DayEdge::Start))
        .transpose()
        .with_context(|| "parse --from")?;
    let to = to
        .map(|raw| parse_local_timestamp(raw, DayEdge::End))
        .transpose()
        .with_context(|| "parse --to")?;
    Ok(CallWindow::new(from, to)?)
}

pub fn parse_company_id(raw: &str) -> Option<CompanyId> {
    CompanyId::from_str(raw.trim()).ok()
}

/// Parses `PERSON=PHONE`. Either side may be empty, not both.
pub fn parse_contact(raw: &str) -> Result<ContactPair> {
    let (person, phone) = raw
        .split_once('=')
        .ok_or_else(|| invalid_input(format!("invalid contact {raw:?}: expected PERSON=PHONE")))?;
    let pair = ContactPair {
        person: person.trim().to_string(),
        phone: phone.trim().to_string(),
    };
    if pair.is_empty() {
        return Err(invalid_input("contact cannot be empty"));
    }
    Ok(pair)
}

pub fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| invalid_input(format!("invalid entry {raw:?}: expected KEY=VALUE")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid_input(format!("invalid entry {raw:?}: empty key")));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn read_upload(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read rows file {}", path.display()))
}
