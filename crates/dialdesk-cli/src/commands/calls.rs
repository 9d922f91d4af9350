use crate::commands::{print_json, Context, DEFAULT_CALL_LIMIT};
use crate::util::{format_duration, format_timestamp_datetime, parse_window};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialdesk_core::domain::{CallRecord, Disposition};
use dialdesk_store::query::CallQuery;
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum CallsCommand {
    /// List imported call records, newest first
    List(CallsListArgs),
    /// Recompute stored phone match keys after a country code change
    Renormalize,
}

#[derive(Debug, Args)]
pub struct CallsListArgs {
    /// Matches either side of the call
    #[arg(long)]
    pub number: Option<String>,
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
    #[arg(long)]
    pub disposition: Option<String>,
    #[arg(long, default_value_t = DEFAULT_CALL_LIMIT)]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
struct RenormalizeReport {
    changed: usize,
}

pub fn list_calls(ctx: &Context<'_>, args: CallsListArgs) -> Result<()> {
    let query = CallQuery {
        number: args.number,
        window: parse_window(args.from.as_deref(), args.to.as_deref())?,
        disposition: args.disposition.as_deref().map(Disposition::parse),
        limit: Some(args.limit),
    };
    let records = ctx
        .store
        .call_records()
        .list(&query, &ctx.config.matching.phone_rule())?;

    if ctx.json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No call records.");
        return Ok(());
    }
    for record in &records {
        println!("{}", format_call_line(record));
    }
    Ok(())
}

pub fn renormalize(ctx: &Context<'_>) -> Result<()> {
    let changed = ctx
        .store
        .call_records()
        .renormalize(&ctx.config.matching.phone_rule())?;
    if ctx.json {
        return print_json(&RenormalizeReport { changed });
    }
    println!("Recomputed match keys for {changed} call records");
    Ok(())
}

pub fn format_call_line(record: &CallRecord) -> String {
    format!(
        "{}  {} -> {}  {}  {}  {}",
        format_timestamp_datetime(record.calldate),
        display_number(&record.src),
        display_number(&record.dst),
        format_duration(record.duration),
        record.disposition,
        record.uniqueid
    )
}

fn display_number(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
