use dialdesk_core::domain::{CallWindow, CdrRow, Disposition, PhoneMatchRule};
use dialdesk_store::error::StoreError;
use dialdesk_store::query::CallQuery;
use dialdesk_store::Store;

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn cdr(uniqueid: &str, calldate: i64, src: &str, dst: &str) -> CdrRow {
    CdrRow {
        uniqueid: uniqueid.to_string(),
        calldate,
        clid: format!("\"Agent\" <{src}>"),
        src: src.to_string(),
        dst: dst.to_string(),
        duration: 42,
        disposition: Disposition::Answered,
        recordingfile: None,
    }
}

#[test]
fn insert_chunk_stamps_timestamps_and_reads_back() {
    let store = store();
    let now = 1_700_000_000;
    let rule = PhoneMatchRule::default();
    let outcome = store
        .call_records()
        .insert_chunk(now, &[cdr("1.1", 100, "555 123", "101")], &rule)
        .expect("insert");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.ignored, 0);

    let record = store
        .call_records()
        .get_by_uniqueid("1.1")
        .expect("get")
        .expect("record");
    assert_eq!(record.calldate, 100);
    assert_eq!(record.src, "555 123");
    assert_eq!(record.duration, 42);
    assert_eq!(record.disposition, Disposition::Answered);
    assert_eq!(record.created_at, now);
    assert_eq!(record.updated_at, now);
}

#[test]
fn uniqueid_constraint_ignores_duplicates() {
    let store = store();
    let rule = PhoneMatchRule::default();
    let repo = store.call_records();
    repo.insert_chunk(1, &[cdr("1.1", 100, "1", "2")], &rule)
        .expect("insert");
    let outcome = repo
        .insert_chunk(2, &[cdr("1.1", 100, "1", "2"), cdr("1.2", 200, "1", "2")], &rule)
        .expect("insert again");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.ignored, 1);
    assert_eq!(repo.count().expect("count"), 2);
}

#[test]
fn invalid_row_rejects_whole_chunk() {
    let store = store();
    let mut bad = cdr("1.2", 200, "1", "2");
    bad.uniqueid = " ".to_string();
    let err = store
        .call_records()
        .insert_chunk(1, &[cdr("1.1", 100, "1", "2"), bad], &PhoneMatchRule::default())
        .expect_err("reject");
    assert!(matches!(err, StoreError::Core(_)));
    assert_eq!(store.call_records().count().expect("count"), 0);
}

#[test]
fn max_calldate_tracks_latest_record() {
    let store = store();
    let repo = store.call_records();
    assert_eq!(repo.max_calldate().expect("max"), None);
    repo.insert_chunk(
        1,
        &[cdr("a", 300, "1", "2"), cdr("b", 100, "1", "2")],
        &PhoneMatchRule::default(),
    )
    .expect("insert");
    assert_eq!(repo.max_calldate().expect("max"), Some(300));
}

#[test]
fn existing_uniqueids_returns_stored_subset() {
    let store = store();
    let repo = store.call_records();
    repo.insert_chunk(
        1,
        &[cdr("a", 1, "1", "2"), cdr("b", 2, "1", "2")],
        &PhoneMatchRule::default(),
    )
    .expect("insert");

    let existing = repo
        .existing_uniqueids(["a", "c", "b", "d"])
        .expect("existing");
    assert_eq!(existing.len(), 2);
    assert!(existing.contains("a"));
    assert!(existing.contains("b"));
    assert!(repo
        .existing_uniqueids(Vec::<String>::new())
        .expect("empty")
        .is_empty());
}

#[test]
fn list_filters_by_normalized_number_and_window() {
    let store = store();
    let rule = PhoneMatchRule::default();
    let repo = store.call_records();
    repo.insert_chunk(
        1,
        &[
            cdr("a", 100, "555-123", "101"),
            cdr("b", 200, "101", "(555) 123"),
            cdr("c", 300, "777", "101"),
        ],
        &rule,
    )
    .expect("insert");

    let by_number = repo
        .list(
            &CallQuery {
                number: Some("+555123".to_string()),
                ..Default::default()
            },
            &rule,
        )
        .expect("list");
    let ids: Vec<&str> = by_number.iter().map(|r| r.uniqueid.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    let windowed = repo
        .list(
            &CallQuery {
                window: CallWindow::new(Some(150), None).expect("window"),
                limit: Some(1),
                ..Default::default()
            },
            &rule,
        )
        .expect("list");
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].uniqueid, "c");
}

#[test]
fn list_for_numbers_matches_src_or_dst() {
    let store = store();
    let rule = PhoneMatchRule::default();
    let repo = store.call_records();
    repo.insert_chunk(
        1,
        &[
            cdr("a", 100, "555123", "101"),
            cdr("b", 200, "101", "555123"),
            cdr("c", 300, "777", "888"),
        ],
        &rule,
    )
    .expect("insert");

    let records = repo
        .list_for_numbers(&["555123".to_string()], &CallWindow::default())
        .expect("list");
    let ids: Vec<&str> = records.iter().map(|r| r.uniqueid.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    let windowed = repo
        .list_for_numbers(
            &["555123".to_string(), "888".to_string()],
            &CallWindow::new(None, Some(150)).expect("window"),
        )
        .expect("list");
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].uniqueid, "a");
}

#[test]
fn renormalize_applies_new_country_code() {
    let store = store();
    let repo = store.call_records();
    repo.insert_chunk(
        1,
        &[cdr("a", 100, "+995555123456", "101")],
        &PhoneMatchRule::default(),
    )
    .expect("insert");

    let rule = PhoneMatchRule::with_country_code("995");
    assert_eq!(repo.renormalize(&rule).expect("renormalize"), 1);
    assert_eq!(repo.renormalize(&rule).expect("renormalize again"), 0);

    let records = repo
        .list_for_numbers(&["555123456".to_string()], &CallWindow::default())
        .expect("list");
    assert_eq!(records.len(), 1);
}
