use crate::error::{Result, SyncError};
use crate::source::{CdrFilter, CdrQuery, CdrSource};
use dialdesk_core::domain::{
    CdrRow, PhoneMatchRule, DEFAULT_IMPORT_CHUNK_SIZE, DEFAULT_IMPORT_DAYS, DEFAULT_IMPORT_LIMIT,
};
use dialdesk_core::time::days_before;
use dialdesk_store::Store;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub limit: usize,
    pub days: i64,
    /// Lower bound on `calldate`, unix seconds. Overrides the high-water mark.
    pub since: Option<i64>,
    pub import_all: bool,
    pub chunk_size: usize,
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_IMPORT_LIMIT,
            days: DEFAULT_IMPORT_DAYS,
            since: None,
            import_all: false,
            chunk_size: DEFAULT_IMPORT_CHUNK_SIZE,
            dry_run: false,
        }
    }
}

impl ImportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(SyncError::InvalidOptions("limit must be positive".to_string()));
        }
        if self.days < 0 {
            return Err(SyncError::InvalidOptions(format!(
                "days must not be negative: {}",
                self.days
            )));
        }
        if self.chunk_size == 0 {
            return Err(SyncError::InvalidOptions(
                "chunk size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// The source filter an import run settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportFilter {
    All,
    Since { from: i64 },
    AfterHighWaterMark { after: i64 },
    LastDays { days: i64, from: i64 },
}

impl ImportFilter {
    pub fn resolve(options: &ImportOptions, high_water_mark: Option<i64>, now_utc: i64) -> Self {
        if options.import_all {
            return Self::All;
        }
        if let Some(from) = options.since {
            return Self::Since { from };
        }
        if let Some(after) = high_water_mark {
            return Self::AfterHighWaterMark { after };
        }
        Self::LastDays {
            days: options.days,
            from: days_before(now_utc, options.days),
        }
    }

    pub fn to_cdr_filter(self) -> CdrFilter {
        match self {
            Self::All => CdrFilter::All,
            Self::Since { from } | Self::LastDays { from, .. } => CdrFilter::Since(from),
            Self::AfterHighWaterMark { after } => CdrFilter::After(after),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub source: String,
    pub filter: ImportFilter,
    pub high_water_mark: Option<i64>,
    /// Rows returned by the source.
    pub fetched: usize,
    /// Fetched rows whose `uniqueid` was already stored.
    pub already_present: usize,
    /// Rows that passed the pre-check, whether or not they were written.
    pub new_rows: usize,
    pub imported: usize,
    /// Repeats within the fetched batch plus rows the store's `uniqueid`
    /// constraint ignored at insert time.
    pub duplicates: usize,
    pub chunks: usize,
    pub dry_run: bool,
}

/// Pulls new CDRs from `source` into the local store.
///
/// Rows are committed chunk by chunk, so a failure leaves earlier chunks in
/// place; the error reports how many rows they held. Running the same
/// import twice stores nothing the second time.
pub fn import_cdrs(
    store: &Store,
    source: &dyn CdrSource,
    options: &ImportOptions,
    rule: &PhoneMatchRule,
    now_utc: i64,
) -> Result<ImportReport> {
    options.validate()?;
    source.check_schema()?;

    let records = store.call_records();
    let high_water_mark = records.max_calldate()?;
    let filter = ImportFilter::resolve(options, high_water_mark, now_utc);
    debug!(
        source = source.source_name(),
        ?filter,
        limit = options.limit,
        "fetching cdr rows"
    );

    let fetched = source.fetch(&CdrQuery {
        filter: filter.to_cdr_filter(),
        limit: Some(options.limit),
    })?;

    let mut report = ImportReport {
        source: source.source_name().to_string(),
        filter,
        high_water_mark,
        fetched: fetched.len(),
        already_present: 0,
        new_rows: 0,
        imported: 0,
        duplicates: 0,
        chunks: 0,
        dry_run: options.dry_run,
    };

    let mut seen = HashSet::new();
    let mut candidates: Vec<CdrRow> = Vec::with_capacity(fetched.len());
    for row in fetched {
        if seen.insert(row.uniqueid.clone()) {
            candidates.push(row);
        } else {
            report.duplicates += 1;
        }
    }

    let existing = records.existing_uniqueids(candidates.iter().map(|row| row.uniqueid.as_str()))?;
    report.already_present = existing.len();
    let fresh: Vec<CdrRow> = candidates
        .into_iter()
        .filter(|row| !existing.contains(&row.uniqueid))
        .collect();
    report.new_rows = fresh.len();

    if options.dry_run {
        info!(
            source = %report.source,
            fetched = report.fetched,
            new_rows = report.new_rows,
            "dry run, nothing written"
        );
        return Ok(report);
    }

    for chunk in fresh.chunks(options.chunk_size) {
        match records.insert_chunk(now_utc, chunk, rule) {
            Ok(outcome) => {
                report.imported += outcome.inserted;
                report.duplicates += outcome.ignored;
                report.chunks += 1;
                debug!(
                    chunk = report.chunks,
                    inserted = outcome.inserted,
                    ignored = outcome.ignored,
                    "committed cdr chunk"
                );
            }
            Err(source) => {
                error!(
                    committed = report.imported,
                    error = %source,
                    "cdr chunk insert failed"
                );
                return Err(SyncError::Insert {
                    committed: report.imported,
                    source,
                });
            }
        }
    }

    info!(
        source = %report.source,
        fetched = report.fetched,
        already_present = report.already_present,
        imported = report.imported,
        chunks = report.chunks,
        "cdr import finished"
    );
    Ok(report)
}
