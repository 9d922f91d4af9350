use crate::commands::callers::load_callers;
use crate::commands::calls::format_call_line;
use crate::commands::{print_json, Context};
use crate::util::parse_window;
use anyhow::{Context as _, Result};
use clap::Args;
use dialdesk_sync::matching::{match_live, match_stored};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MatchArgs {
    /// JSON sheet export with caller rows
    pub file: PathBuf,
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
    /// Query the telephony database instead of imported records
    #[arg(long)]
    pub live: bool,
    #[arg(long, requires = "live")]
    pub source: Option<PathBuf>,
    #[arg(long, requires = "live")]
    pub table: Option<String>,
    /// Caps how many source rows a live match reads
    #[arg(long, requires = "live")]
    pub limit: Option<usize>,
}

pub fn match_callers(ctx: &Context<'_>, args: MatchArgs) -> Result<()> {
    let callers = load_callers(&args.file)?;
    let window = parse_window(args.from.as_deref(), args.to.as_deref())?;
    let rule = ctx.config.matching.phone_rule();

    let matches = if args.live {
        let source = ctx.open_cdr_source(args.source.as_deref(), args.table.as_deref())?;
        match_live(&source, &callers, &rule, &window, args.limit)
            .with_context(|| "match against cdr source")?
    } else {
        match_stored(ctx.store, &callers, &rule, &window)
            .with_context(|| "match against stored call records")?
    };

    if ctx.json {
        return print_json(&matches);
    }

    for (caller, entry) in callers.iter().zip(&matches.entries) {
        let number = if caller.caller_number.is_empty() {
            "-"
        } else {
            caller.caller_number.as_str()
        };
        println!("{} ({}): {} calls", entry.caller_id, number, entry.matches.len());
        for record in &entry.matches {
            println!("  {}", format_call_line(record));
        }
    }
    println!(
        "Matched {} of {} callers, {} calls",
        matches.matched_callers(),
        callers.len(),
        matches.total_matches()
    );
    Ok(())
}
