use crate::error::invalid_input;
use anyhow::Result;
use dialdesk_config::AppConfig;
use dialdesk_store::Store;
use dialdesk_sync::asterisk::AsteriskSqliteSource;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

pub mod admin;
pub mod callers;
pub mod calls;
pub mod company;
pub mod export;
pub mod import;
pub mod matching;

pub const DEFAULT_CALL_LIMIT: usize = 50;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

impl Context<'_> {
    /// Opens the telephony CDR database; flags win over `[source]` config.
    pub fn open_cdr_source(
        &self,
        path: Option<&Path>,
        table: Option<&str>,
    ) -> Result<AsteriskSqliteSource> {
        let path = path
            .or(self.config.source.path.as_deref())
            .ok_or_else(|| invalid_input("no CDR source configured: pass --source or set source.path"))?;
        let table = table.unwrap_or(&self.config.source.table);
        Ok(AsteriskSqliteSource::open(path, table)?)
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
