mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{admin, callers, calls, company, export, import, matching, Context};
use crate::error::{exit_code_for, report_error};
use dialdesk_config as config;
use dialdesk_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(name = "dialdesk", version, about = "dialdesk CLI")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pull CDRs from the telephony source or load company sheets
    #[command(subcommand)]
    Import(import::ImportCommand),
    #[command(subcommand)]
    Calls(calls::CallsCommand),
    #[command(subcommand)]
    Company(company::CompanyCommand),
    #[command(subcommand)]
    Callers(callers::CallersCommand),
    /// Match uploaded caller rows against call records
    Match(matching::MatchArgs),
    #[command(subcommand)]
    Export(export::ExportCommand),
    #[command(subcommand)]
    Admin(admin::AdminCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
            Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
            Err(err) => debug!(error = %err, "config unavailable"),
        }
    }

    // Normalizing a sheet never touches the database.
    if let Command::Callers(callers::CallersCommand::Normalize(args)) = command {
        return callers::normalize(json, args);
    }

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let store =
        Store::open(&db_path).with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let ctx = Context {
        store: &store,
        json,
        config: &app_config,
    };

    match command {
        Command::Import(cmd) => match cmd {
            import::ImportCommand::Cdr(args) => import::import_cdr(&ctx, args),
            import::ImportCommand::Companies(args) => import::import_companies(&ctx, args),
        },
        Command::Calls(cmd) => match cmd {
            calls::CallsCommand::List(args) => calls::list_calls(&ctx, args),
            calls::CallsCommand::Renormalize => calls::renormalize(&ctx),
        },
        Command::Company(cmd) => match cmd {
            company::CompanyCommand::Add(args) => company::add_company(&ctx, args),
            company::CompanyCommand::Edit(args) => company::edit_company(&ctx, args),
            company::CompanyCommand::Show(args) => company::show_company(&ctx, args),
            company::CompanyCommand::List(args) => company::list_companies(&ctx, args),
            company::CompanyCommand::Delete(args) => company::delete_company(&ctx, args),
        },
        Command::Callers(callers::CallersCommand::Normalize(args)) => {
            callers::normalize(ctx.json, args)
        }
        Command::Match(args) => matching::match_callers(&ctx, args),
        Command::Export(cmd) => match cmd {
            export::ExportCommand::Companies(args) => export::export_companies(&ctx, args),
        },
        Command::Admin(cmd) => match cmd {
            admin::AdminCommand::Add(args) => admin::add_admin(&ctx, args),
            admin::AdminCommand::List => admin::list_admins(&ctx),
            admin::AdminCommand::Delete(args) => admin::delete_admin(&ctx, args),
        },
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
