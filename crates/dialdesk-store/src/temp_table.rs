use crate::error::Result;
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_TABLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A temp table of text keys, used to join against large key sets without
/// running into SQLite's bound-parameter limit. Dropped with the guard.
pub(crate) struct TempKeyTable<'a> {
    conn: &'a Connection,
    name: String,
}

impl<'a> TempKeyTable<'a> {
    pub(crate) fn create<I, S>(conn: &'a Connection, prefix: &str, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table_name = generate_temp_table_name(prefix);
        debug_assert!(table_name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        let full_name = format!("temp.{table_name}");

        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {full_name};
             CREATE TEMP TABLE {full_name} (key TEXT PRIMARY KEY);"
        ))?;

        let guard = Self {
            conn,
            name: full_name,
        };

        {
            let mut stmt = guard.conn.prepare(&format!(
                "INSERT OR IGNORE INTO {} (key) VALUES (?1);",
                guard.name
            ))?;
            for key in keys {
                stmt.execute([key.as_ref()])?;
            }
        }

        Ok(guard)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TempKeyTable<'_> {
    fn drop(&mut self) {
        let _ = self
            .conn
            .execute(&format!("DROP TABLE IF EXISTS {};", self.name), []);
    }
}

fn generate_temp_table_name(prefix: &str) -> String {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let counter = TEMP_TABLE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let prefix: String = prefix
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    format!("temp_{prefix}_{micros}_{counter}")
}
