use crate::commands::print_json;
use crate::util::{format_duration, read_upload};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use dialdesk_core::domain::ImportedCallerRecord;
use dialdesk_core::normalize::normalize_rows;
use dialdesk_sync::rows::parse_rows_json;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Subcommand)]
pub enum CallersCommand {
    /// Print caller rows from a JSON sheet export in canonical form
    Normalize(NormalizeArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    pub file: PathBuf,
}

pub fn normalize(json: bool, args: NormalizeArgs) -> Result<()> {
    let callers = load_callers(&args.file)?;
    if json {
        return print_json(&callers);
    }
    if callers.is_empty() {
        println!("No caller rows.");
        return Ok(());
    }
    for caller in &callers {
        println!(
            "{}  {}  {} -> {}  {}  {}  {}",
            caller.id,
            display(&caller.caller_name),
            display(&caller.caller_number),
            display(&caller.receiver_number),
            display(&caller.call_date),
            format_duration(caller.call_duration),
            display(&caller.call_status)
        );
    }
    Ok(())
}

/// Reads a sheet upload and maps every row to a caller record. Rows the
/// loader could not use are logged and left out.
pub fn load_callers(path: &Path) -> Result<Vec<ImportedCallerRecord>> {
    let data = read_upload(path)?;
    let parsed =
        parse_rows_json(&data).with_context(|| format!("parse rows file {}", path.display()))?;
    for warning in &parsed.warnings {
        warn!(file = %path.display(), "{warning}");
    }
    Ok(normalize_rows(&parsed.rows))
}

fn display(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
