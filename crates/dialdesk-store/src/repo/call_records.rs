use crate::error::Result;
use crate::query::{push_window, CallQuery};
use crate::temp_table::TempKeyTable;
use dialdesk_core::domain::{CallRecord, CallWindow, CdrRow, Disposition, PhoneMatchRule};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashSet;

const CALL_RECORD_COLUMNS: &str = "id, uniqueid, calldate, clid, src, dst, duration, disposition, recordingfile, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub inserted: usize,
    /// Rows skipped by the `uniqueid` constraint, e.g. because a concurrent
    /// import stored them after the pre-check.
    pub ignored: usize,
}

pub struct CallRecordsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CallRecordsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Latest `calldate` already stored.
    pub fn max_calldate(&self) -> Result<Option<i64>> {
        let value: Option<i64> =
            self.conn
                .query_row("SELECT MAX(calldate) FROM call_records;", [], |row| {
                    row.get(0)
                })?;
        Ok(value)
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM call_records;", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Returns the subset of `uniqueids` already stored.
    pub fn existing_uniqueids<I, S>(&self, uniqueids: I) -> Result<HashSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut uniqueids = uniqueids.into_iter().peekable();
        if uniqueids.peek().is_none() {
            return Ok(HashSet::new());
        }
        let keys = TempKeyTable::create(self.conn, "uniqueids", uniqueids)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT cr.uniqueid
             FROM call_records cr
             INNER JOIN {} ids ON ids.key = cr.uniqueid;",
            keys.name()
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut existing = HashSet::new();
        for row in rows {
            existing.insert(row?);
        }
        Ok(existing)
    }

    /// Inserts one chunk atomically. Every row is validated before anything
    /// is written; rows whose `uniqueid` is already stored are ignored.
    pub fn insert_chunk(
        &self,
        now_utc: i64,
        rows: &[CdrRow],
        rule: &PhoneMatchRule,
    ) -> Result<ChunkOutcome> {
        for row in rows {
            row.validate()?;
        }
        if rows.is_empty() {
            return Ok(ChunkOutcome::default());
        }

        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction()?;
            let outcome = insert_rows(&tx, now_utc, rows, rule)?;
            tx.commit()?;
            Ok(outcome)
        } else {
            insert_rows(self.conn, now_utc, rows, rule)
        }
    }

    pub fn get_by_uniqueid(&self, uniqueid: &str) -> Result<Option<CallRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {CALL_RECORD_COLUMNS} FROM call_records WHERE uniqueid = ?1;"),
                [uniqueid],
                map_call_record,
            )
            .optional()?;
        Ok(record)
    }

    pub fn list(&self, query: &CallQuery, rule: &PhoneMatchRule) -> Result<Vec<CallRecord>> {
        let sql = query.to_sql(
            &format!("SELECT {CALL_RECORD_COLUMNS} FROM call_records"),
            rule,
        );
        let mut stmt = self.conn.prepare(&sql.sql)?;
        let rows = stmt.query_map(params_from_iter(sql.params.iter()), map_call_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Records whose stored `src`/`dst` match key is one of `keys`, inside
    /// `window`, newest first. `keys` must already be reduced match keys.
    pub fn list_for_numbers(&self, keys: &[String], window: &CallWindow) -> Result<Vec<CallRecord>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let numbers = TempKeyTable::create(self.conn, "numbers", keys)?;
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        push_window(window, &mut clauses, &mut params);
        let window_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" AND {}", clauses.join(" AND "))
        };

        let sql = format!(
            "SELECT {CALL_RECORD_COLUMNS}
             FROM call_records
             WHERE (src_norm IN (SELECT key FROM {table})
                    OR dst_norm IN (SELECT key FROM {table})){window_sql}
             ORDER BY calldate DESC, uniqueid ASC;",
            table = numbers.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), map_call_record)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Recomputes stored match keys, e.g. after the country code changed.
    /// Returns how many rows changed.
    pub fn renormalize(&self, rule: &PhoneMatchRule) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut changed = 0;
        {
            let mut select =
                tx.prepare("SELECT id, src, dst, src_norm, dst_norm FROM call_records;")?;
            let mut update =
                tx.prepare("UPDATE call_records SET src_norm = ?2, dst_norm = ?3 WHERE id = ?1;")?;
            let mut rows = select.query([])?;
            while let Some(row) = rows.next()? {
                let id: i64 = row.get(0)?;
                let src: String = row.get(1)?;
                let dst: String = row.get(2)?;
                let old_src: Option<String> = row.get(3)?;
                let old_dst: Option<String> = row.get(4)?;
                let src_norm = rule.key(&src);
                let dst_norm = rule.key(&dst);
                if src_norm != old_src || dst_norm != old_dst {
                    update.execute(params![id, src_norm, dst_norm])?;
                    changed += 1;
                }
            }
        }
        tx.commit()?;
        Ok(changed)
    }
}

fn insert_rows(
    conn: &Connection,
    now_utc: i64,
    rows: &[CdrRow],
    rule: &PhoneMatchRule,
) -> Result<ChunkOutcome> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO call_records
         (uniqueid, calldate, clid, src, dst, src_norm, dst_norm, duration, disposition, recordingfile, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11);",
    )?;
    let mut outcome = ChunkOutcome::default();
    for row in rows {
        let inserted = stmt.execute(params![
            row.uniqueid,
            row.calldate,
            row.clid,
            row.src,
            row.dst,
            rule.key(&row.src),
            rule.key(&row.dst),
            row.duration,
            row.disposition.as_str(),
            row.recordingfile,
            now_utc,
        ])?;
        if inserted > 0 {
            outcome.inserted += 1;
        } else {
            outcome.ignored += 1;
        }
    }
    Ok(outcome)
}

fn map_call_record(row: &Row<'_>) -> rusqlite::Result<CallRecord> {
    let disposition: String = row.get(7)?;
    Ok(CallRecord {
        id: row.get(0)?,
        uniqueid: row.get(1)?,
        calldate: row.get(2)?,
        clid: row.get(3)?,
        src: row.get(4)?,
        dst: row.get(5)?,
        duration: row.get(6)?,
        disposition: Disposition::parse(&disposition),
        recordingfile: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
