use crate::error::{Result, SyncError};
use crate::source::{CdrFilter, CdrQuery, CdrSource};
use dialdesk_core::domain::{CdrRow, Disposition};
use dialdesk_core::time::{format_source_calldate, parse_source_calldate};
use dialdesk_core::validation::is_plain_identifier;
use dialdesk_store::db;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use std::collections::HashSet;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "calldate",
    "clid",
    "src",
    "dst",
    "duration",
    "disposition",
    "uniqueid",
    "recordingfile",
];

/// The `cdr` table of an Asterisk SQLite CDR backend, opened read-only.
///
/// Asterisk writes `calldate` as local-time text, so filters are compared
/// as text in the same layout and parsed back to unix seconds per row.
pub struct AsteriskSqliteSource {
    conn: Connection,
    table: String,
    name: String,
}

impl AsteriskSqliteSource {
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        let conn = db::open_read_only(path)?;
        let mut source = Self::from_connection(conn, table)?;
        source.name = format!("asterisk:{}", path.display());
        Ok(source)
    }

    pub fn from_connection(conn: Connection, table: &str) -> Result<Self> {
        let table = table.trim();
        if !is_plain_identifier(table) {
            return Err(SyncError::InvalidOptions(format!(
                "invalid cdr table name: {table}"
            )));
        }
        Ok(Self {
            conn,
            table: table.to_string(),
            name: format!("asterisk:{table}"),
        })
    }
}

impl CdrSource for AsteriskSqliteSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn check_schema(&self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({});", self.table))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        let mut columns = HashSet::new();
        for row in rows {
            columns.insert(row?.to_ascii_lowercase());
        }

        if columns.is_empty() {
            return Err(SyncError::Schema(format!("table {} not found", self.table)));
        }
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::Schema(format!(
                "table {} is missing columns: {}",
                self.table,
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn fetch(&self, query: &CdrQuery) -> Result<Vec<CdrRow>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        match query.filter {
            CdrFilter::All => {}
            CdrFilter::Since(ts) => {
                clauses.push("calldate >= ?");
                params.push(Value::Text(format_source_calldate(ts)));
            }
            CdrFilter::After(ts) => {
                clauses.push("calldate > ?");
                params.push(Value::Text(format_source_calldate(ts)));
            }
            CdrFilter::Window(window) => {
                if let Some(from) = window.from {
                    clauses.push("calldate >= ?");
                    params.push(Value::Text(format_source_calldate(from)));
                }
                if let Some(to) = window.to {
                    clauses.push("calldate <= ?");
                    params.push(Value::Text(format_source_calldate(to)));
                }
            }
        }

        let mut sql = format!("SELECT {} FROM {}", REQUIRED_COLUMNS.join(", "), self.table);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY calldate DESC, uniqueid DESC");
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }
        sql.push(';');

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), read_raw_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_cdr_row()?);
        }
        Ok(records)
    }
}

/// Column values as Asterisk stored them. Asterisk versions differ in the
/// declared column types, so everything is read loosely.
struct RawCdr {
    calldate: String,
    clid: String,
    src: String,
    dst: String,
    duration: String,
    disposition: String,
    uniqueid: String,
    recordingfile: String,
}

impl RawCdr {
    fn into_cdr_row(self) -> Result<CdrRow> {
        let calldate = parse_source_calldate(&self.calldate).map_err(|err| {
            SyncError::Parse(format!(
                "calldate {:?} of uniqueid {}: {err}",
                self.calldate, self.uniqueid
            ))
        })?;
        let duration = parse_duration(&self.duration).ok_or_else(|| {
            SyncError::Parse(format!(
                "duration {:?} of uniqueid {}",
                self.duration, self.uniqueid
            ))
        })?;
        let recordingfile = self.recordingfile.trim();
        Ok(CdrRow {
            uniqueid: self.uniqueid.trim().to_string(),
            calldate,
            clid: self.clid,
            src: self.src,
            dst: self.dst,
            duration,
            disposition: Disposition::parse(&self.disposition),
            recordingfile: (!recordingfile.is_empty()).then(|| recordingfile.to_string()),
        })
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawCdr> {
    Ok(RawCdr {
        calldate: loose_text(row, 0)?,
        clid: loose_text(row, 1)?,
        src: loose_text(row, 2)?,
        dst: loose_text(row, 3)?,
        duration: loose_text(row, 4)?,
        disposition: loose_text(row, 5)?,
        uniqueid: loose_text(row, 6)?,
        recordingfile: loose_text(row, 7)?,
    })
}

fn loose_text(row: &Row<'_>, index: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(index)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    })
}

/// Empty means zero. Fractional seconds are rounded.
fn parse_duration(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    value.is_finite().then(|| value.round() as i64)
}
