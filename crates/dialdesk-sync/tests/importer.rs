use dialdesk_core::domain::{CallWindow, CdrRow, Disposition, PhoneMatchRule};
use dialdesk_core::normalize::normalize_row;
use dialdesk_core::RawRow;
use dialdesk_store::Store;
use dialdesk_sync::importer::{import_cdrs, ImportFilter, ImportOptions};
use dialdesk_sync::matching::{match_live, match_stored};
use dialdesk_sync::source::{CdrFilter, CdrQuery, CdrSource};
use dialdesk_sync::{Result, SyncError};
use std::cell::Cell;

const NOW: i64 = 1_700_000_000;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;

struct FakeSource {
    rows: Vec<CdrRow>,
    schema_ok: bool,
    fetches: Cell<usize>,
}

impl FakeSource {
    fn new(rows: Vec<CdrRow>) -> Self {
        Self {
            rows,
            schema_ok: true,
            fetches: Cell::new(0),
        }
    }
}

impl CdrSource for FakeSource {
    fn source_name(&self) -> &str {
        "fake"
    }

    fn check_schema(&self) -> Result<()> {
        if self.schema_ok {
            Ok(())
        } else {
            Err(SyncError::Schema("table cdr not found".to_string()))
        }
    }

    fn fetch(&self, query: &CdrQuery) -> Result<Vec<CdrRow>> {
        self.fetches.set(self.fetches.get() + 1);
        let mut rows: Vec<CdrRow> = self
            .rows
            .iter()
            .filter(|row| match query.filter {
                CdrFilter::All => true,
                CdrFilter::Since(ts) => row.calldate >= ts,
                CdrFilter::After(ts) => row.calldate > ts,
                CdrFilter::Window(window) => window.contains(row.calldate),
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.calldate
                .cmp(&a.calldate)
                .then_with(|| b.uniqueid.cmp(&a.uniqueid))
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn cdr(uniqueid: &str, calldate: i64, src: &str) -> CdrRow {
    CdrRow {
        uniqueid: uniqueid.to_string(),
        calldate,
        clid: String::new(),
        src: src.to_string(),
        dst: "100".to_string(),
        duration: 30,
        disposition: Disposition::Answered,
        recordingfile: None,
    }
}

fn hourly_rows(count: i64) -> Vec<CdrRow> {
    (1..=count)
        .map(|index| cdr(&format!("{NOW}.{index}"), NOW - index * HOUR, "555123456"))
        .collect()
}

#[test]
fn imports_most_recent_rows_then_nothing_on_rerun() {
    let store = store();
    let source = FakeSource::new(hourly_rows(10));
    let options = ImportOptions {
        limit: 5,
        days: 30,
        ..Default::default()
    };
    let rule = PhoneMatchRule::default();

    let report = import_cdrs(&store, &source, &options, &rule, NOW).expect("import");
    assert_eq!(
        report.filter,
        ImportFilter::LastDays {
            days: 30,
            from: NOW - 30 * DAY
        }
    );
    assert_eq!(report.fetched, 5);
    assert_eq!(report.imported, 5);
    assert_eq!(report.chunks, 1);
    assert_eq!(store.call_records().count().expect("count"), 5);
    for index in 1..=5 {
        assert!(store
            .call_records()
            .get_by_uniqueid(&format!("{NOW}.{index}"))
            .expect("get")
            .is_some());
    }

    let rerun = import_cdrs(&store, &source, &options, &rule, NOW).expect("rerun");
    assert_eq!(rerun.high_water_mark, Some(NOW - HOUR));
    assert_eq!(rerun.filter, ImportFilter::AfterHighWaterMark { after: NOW - HOUR });
    assert_eq!(rerun.fetched, 0);
    assert_eq!(rerun.imported, 0);
    assert_eq!(store.call_records().count().expect("count"), 5);
}

#[test]
fn rows_outside_the_day_window_are_left_behind() {
    let store = store();
    let source = FakeSource::new(vec![
        cdr("recent", NOW - DAY, "1"),
        cdr("old", NOW - 40 * DAY, "1"),
    ]);
    let report = import_cdrs(
        &store,
        &source,
        &ImportOptions::default(),
        &PhoneMatchRule::default(),
        NOW,
    )
    .expect("import");
    assert_eq!(report.imported, 1);
    assert!(store
        .call_records()
        .get_by_uniqueid("old")
        .expect("get")
        .is_none());
}

#[test]
fn new_rows_arriving_after_the_mark_are_picked_up() {
    let store = store();
    let rule = PhoneMatchRule::default();
    let options = ImportOptions::default();
    let first = FakeSource::new(hourly_rows(3));
    import_cdrs(&store, &first, &options, &rule, NOW).expect("import");

    let mut rows = hourly_rows(3);
    rows.push(cdr("late", NOW - HOUR / 2, "1"));
    let second = FakeSource::new(rows);
    let report = import_cdrs(&store, &second, &options, &rule, NOW).expect("import again");
    assert_eq!(report.fetched, 1);
    assert_eq!(report.imported, 1);
    assert_eq!(store.call_records().count().expect("count"), 4);
}

#[test]
fn reimport_all_reports_already_present_rows() {
    let store = store();
    let source = FakeSource::new(hourly_rows(4));
    let options = ImportOptions {
        import_all: true,
        ..Default::default()
    };
    let rule = PhoneMatchRule::default();
    import_cdrs(&store, &source, &options, &rule, NOW).expect("import");

    let report = import_cdrs(&store, &source, &options, &rule, NOW).expect("reimport");
    assert_eq!(report.filter, ImportFilter::All);
    assert_eq!(report.fetched, 4);
    assert_eq!(report.already_present, 4);
    assert_eq!(report.imported, 0);
    assert_eq!(report.chunks, 0);
}

#[test]
fn since_overrides_high_water_mark() {
    let store = store();
    let source = FakeSource::new(hourly_rows(6));
    let rule = PhoneMatchRule::default();
    let options = ImportOptions {
        limit: 2,
        ..Default::default()
    };
    import_cdrs(&store, &source, &options, &rule, NOW).expect("import newest");

    let options = ImportOptions {
        since: Some(NOW - 6 * HOUR),
        ..Default::default()
    };
    let report = import_cdrs(&store, &source, &options, &rule, NOW).expect("backfill");
    assert_eq!(report.filter, ImportFilter::Since { from: NOW - 6 * HOUR });
    assert_eq!(report.already_present, 2);
    assert_eq!(report.imported, 4);
}

#[test]
fn batches_insert_in_chunks() {
    let store = store();
    let source = FakeSource::new(
        (0..250)
            .map(|index| cdr(&format!("u{index:03}"), NOW - index, "1"))
            .collect(),
    );
    let report = import_cdrs(
        &store,
        &source,
        &ImportOptions::default(),
        &PhoneMatchRule::default(),
        NOW,
    )
    .expect("import");
    assert_eq!(report.imported, 250);
    assert_eq!(report.chunks, 3);
}

#[test]
fn repeated_uniqueids_in_one_batch_are_counted_once() {
    let store = store();
    let source = FakeSource::new(vec![cdr("same", NOW - 10, "1"), cdr("same", NOW - 20, "2")]);
    let report = import_cdrs(
        &store,
        &source,
        &ImportOptions::default(),
        &PhoneMatchRule::default(),
        NOW,
    )
    .expect("import");
    assert_eq!(report.imported, 1);
    assert_eq!(report.duplicates, 1);
    let stored = store
        .call_records()
        .get_by_uniqueid("same")
        .expect("get")
        .expect("record");
    assert_eq!(stored.calldate, NOW - 10);
}

#[test]
fn missing_schema_touches_nothing() {
    let store = store();
    let mut source = FakeSource::new(hourly_rows(2));
    source.schema_ok = false;
    let err = import_cdrs(
        &store,
        &source,
        &ImportOptions::default(),
        &PhoneMatchRule::default(),
        NOW,
    )
    .expect_err("schema");
    assert!(matches!(err, SyncError::Schema(_)));
    assert_eq!(source.fetches.get(), 0);
    assert_eq!(store.call_records().count().expect("count"), 0);
}

#[test]
fn dry_run_writes_nothing() {
    let store = store();
    let source = FakeSource::new(hourly_rows(3));
    let options = ImportOptions {
        dry_run: true,
        ..Default::default()
    };
    let report = import_cdrs(&store, &source, &options, &PhoneMatchRule::default(), NOW)
        .expect("dry run");
    assert!(report.dry_run);
    assert_eq!(report.new_rows, 3);
    assert_eq!(report.imported, 0);
    assert_eq!(store.call_records().count().expect("count"), 0);
}

#[test]
fn failed_chunk_reports_rows_already_committed() {
    let store = store();
    let mut rows = hourly_rows(4);
    rows[3].duration = -1;
    let source = FakeSource::new(rows);
    let options = ImportOptions {
        chunk_size: 2,
        ..Default::default()
    };
    let err = import_cdrs(&store, &source, &options, &PhoneMatchRule::default(), NOW)
        .expect_err("bad chunk");
    match err {
        SyncError::Insert { committed, .. } => assert_eq!(committed, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.call_records().count().expect("count"), 2);
}

#[test]
fn invalid_options_are_rejected_before_fetching() {
    let store = store();
    let source = FakeSource::new(hourly_rows(1));
    let options = ImportOptions {
        limit: 0,
        ..Default::default()
    };
    let err = import_cdrs(&store, &source, &options, &PhoneMatchRule::default(), NOW)
        .expect_err("invalid");
    assert!(matches!(err, SyncError::InvalidOptions(_)));
    assert_eq!(source.fetches.get(), 0);
}

fn caller(id: &str, number: &str) -> dialdesk_core::domain::ImportedCallerRecord {
    let mut row = RawRow::new();
    row.insert("id".to_string(), id.to_string());
    row.insert("Caller Number".to_string(), number.to_string());
    normalize_row(&row)
}

#[test]
fn stored_matching_uses_the_same_phone_rule_as_import() {
    let store = store();
    let rule = PhoneMatchRule::with_country_code("995");
    let source = FakeSource::new(vec![
        cdr("a", NOW - 100, "555 12-34-56"),
        cdr("b", NOW - 50, "0555123456"),
        cdr("c", NOW - 10, "777000111"),
    ]);
    import_cdrs(&store, &source, &ImportOptions::default(), &rule, NOW).expect("import");

    let callers = vec![caller("r1", "+995 555 123 456"), caller("r2", "anonymous")];
    let matches = match_stored(&store, &callers, &rule, &CallWindow::default()).expect("match");
    let hits: Vec<&str> = matches
        .get("r1")
        .expect("r1")
        .iter()
        .map(|record| record.uniqueid.as_str())
        .collect();
    assert_eq!(hits, vec!["b", "a"]);
    assert_eq!(matches.get("r2").expect("r2").len(), 0);

    let window = CallWindow::new(Some(NOW - 60), None).expect("window");
    let recent = match_stored(&store, &callers, &rule, &window).expect("match window");
    assert_eq!(recent.get("r1").expect("r1").len(), 1);
}

#[test]
fn live_matching_reads_the_source_directly() {
    let store = store();
    let rule = PhoneMatchRule::default();
    let source = FakeSource::new(vec![cdr("a", NOW - 100, "555123456"), cdr("b", NOW - 50, "1")]);
    let callers = vec![caller("r1", "555-123-456")];
    let matches =
        match_live(&source, &callers, &rule, &CallWindow::default(), None).expect("match");
    assert_eq!(matches.total_matches(), 1);
    assert_eq!(store.call_records().count().expect("count"), 0);
}
