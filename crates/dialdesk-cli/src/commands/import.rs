use crate::commands::{print_json, Context};
use crate::util::{now_utc, read_upload};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use dialdesk_core::normalize::normalize_company_row;
use dialdesk_core::time::{parse_local_timestamp, DayEdge};
use dialdesk_store::error::StoreError;
use dialdesk_store::repo::UpsertOutcome;
use dialdesk_sync::importer::{import_cdrs, ImportOptions};
use dialdesk_sync::rows::parse_rows_json;
use dialdesk_sync::source::CdrSource;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Import new call detail records from the telephony database
    Cdr(ImportCdrArgs),
    /// Create or update companies from a JSON sheet export
    Companies(ImportCompaniesArgs),
}

#[derive(Debug, Args)]
pub struct ImportCdrArgs {
    /// Asterisk CDR SQLite database
    #[arg(long)]
    pub source: Option<PathBuf>,
    #[arg(long)]
    pub table: Option<String>,
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub days: Option<i64>,
    #[arg(long, value_name = "DATE")]
    pub since: Option<String>,
    #[arg(long, conflicts_with = "since")]
    pub all: bool,
    #[arg(long)]
    pub chunk_size: Option<usize>,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ImportCompaniesArgs {
    pub file: PathBuf,
}

#[derive(Debug, Default, Serialize)]
struct CompanyImportReport {
    created: usize,
    updated: usize,
    skipped: usize,
    warnings: Vec<String>,
}

pub fn import_cdr(ctx: &Context<'_>, args: ImportCdrArgs) -> Result<()> {
    let source = ctx.open_cdr_source(args.source.as_deref(), args.table.as_deref())?;
    let since = args
        .since
        .as_deref()
        .map(|raw| parse_local_timestamp(raw, DayEdge::Start))
        .transpose()
        .with_context(|| "parse --since")?;
    let options = ImportOptions {
        limit: args.limit.unwrap_or(ctx.config.import.limit),
        days: args.days.unwrap_or(ctx.config.import.days),
        since,
        import_all: args.all,
        chunk_size: args.chunk_size.unwrap_or(ctx.config.import.chunk_size),
        dry_run: args.dry_run,
    };
    let rule = ctx.config.matching.phone_rule();

    let report = import_cdrs(ctx.store, &source, &options, &rule, now_utc())
        .with_context(|| format!("import cdrs from {}", source.source_name()))?;

    if ctx.json {
        return print_json(&report);
    }

    if report.dry_run {
        println!(
            "Dry run: {} new of {} fetched CDRs from {} (already present {})",
            report.new_rows, report.fetched, report.source, report.already_present
        );
    } else {
        println!(
            "Imported {} CDRs from {} (fetched {}, already present {}, duplicates {}, chunks {})",
            report.imported,
            report.source,
            report.fetched,
            report.already_present,
            report.duplicates,
            report.chunks
        );
    }
    Ok(())
}

pub fn import_companies(ctx: &Context<'_>, args: ImportCompaniesArgs) -> Result<()> {
    let data = read_upload(&args.file)?;
    let parsed = parse_rows_json(&data)
        .with_context(|| format!("parse rows file {}", args.file.display()))?;
    let mut report = CompanyImportReport {
        skipped: parsed.skipped,
        warnings: parsed.warnings,
        ..Default::default()
    };
    let now = now_utc();

    for (index, row) in parsed.rows.iter().enumerate() {
        let draft = normalize_company_row(row);
        match ctx.store.companies().upsert_by_code(now, draft) {
            Ok((_, UpsertOutcome::Created)) => report.created += 1,
            Ok((_, UpsertOutcome::Updated)) => report.updated += 1,
            Err(err @ (StoreError::Core(_) | StoreError::DuplicateIdentificationCode(_))) => {
                report.skipped += 1;
                report
                    .warnings
                    .push(format!("row {}: skipping company: {err}", index + 1));
            }
            Err(err) => return Err(err.into()),
        }
    }

    if ctx.json {
        return print_json(&report);
    }

    println!(
        "Imported companies: created {}, updated {}, skipped {}",
        report.created, report.updated, report.skipped
    );
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in report.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}
