use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use dialdesk_sync::rows::export_companies_json;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Companies with contacts and tender metadata, as JSON
    Companies(ExportCompaniesArgs),
}

#[derive(Debug, Args)]
pub struct ExportCompaniesArgs {
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportReport {
    format: String,
    count: usize,
    output: Option<String>,
}

pub fn export_companies(ctx: &Context<'_>, args: ExportCompaniesArgs) -> Result<()> {
    let companies = ctx.store.companies().list(None)?;
    let data = export_companies_json(&companies)?;
    write_export(
        ctx,
        ExportReport {
            format: "json".to_string(),
            count: companies.len(),
            output: args.out.as_ref().map(|path| path.display().to_string()),
        },
        args.out.as_deref(),
        &data,
    )
}

fn write_export(
    ctx: &Context<'_>,
    report: ExportReport,
    out: Option<&Path>,
    data: &str,
) -> Result<()> {
    if ctx.json && out.is_none() {
        return Err(invalid_input("--json requires --out for export commands"));
    }

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create export directory {}", parent.display()))?;
                }
            }
            fs::write(path, data)
                .with_context(|| format!("write export file {}", path.display()))?;
            if ctx.json {
                print_json(&report)?;
            } else {
                println!("Exported {} companies to {}", report.count, path.display());
            }
            Ok(())
        }
        None => {
            print!("{}", data);
            Ok(())
        }
    }
}
