use merchant_analytics_core::{
    error::AnalyticsError,
    ingest::{normalize_row, BulkLoader},
    store::ActivityStore,
};
use std::fs;
use std::path::Path;

// ── Helpers ──────────────────────────────────────────────────────────────────

const HEADER: &str =
    "event_id,merchant_id,event_timestamp,product,event_type,amount,status,channel,region,merchant_tier";

fn make_store() -> ActivityStore {
    let store = ActivityStore::in_memory().unwrap();
    store.ensure_schema().unwrap();
    store
}

fn write_file(dir: &Path, name: &str, rows: &[&str]) {
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(dir.join(name), body).unwrap();
}

fn fields(row: &str) -> csv::StringRecord {
    csv::StringRecord::from(row.split(',').collect::<Vec<_>>())
}

// ── Normalizer ───────────────────────────────────────────────────────────────

/// Exactly ten columns normalize into a record; everything but the amount
/// passes through as the raw string.
#[test]
fn normalize_passes_ten_column_rows_through() {
    let rec =
        normalize_row(&fields("evt-1,M001,2025-01-10 09:15:00,POS,PURCHASE,120.50,SUCCESS,WEB,Lagos,TIER1"))
            .expect("ten-column row must normalize");

    assert_eq!(rec.event_id, "evt-1");
    assert_eq!(rec.merchant_id, "M001");
    assert_eq!(rec.amount, 120.50);
    assert_eq!(rec.status, "SUCCESS");
    assert_eq!(rec.merchant_tier, "TIER1");
}

/// A wrong column count is invalid: no error, just no record.
#[test]
fn normalize_rejects_wrong_column_counts() {
    // 9 columns
    assert!(normalize_row(&fields("evt-1,M001,2025-01-10,POS,PURCHASE,120.50,SUCCESS,WEB,Lagos")).is_none());
    // 11 columns
    assert!(normalize_row(&fields(
        "evt-1,M001,2025-01-10,POS,PURCHASE,120.50,SUCCESS,WEB,Lagos,TIER1,extra"
    ))
    .is_none());
}

/// A malformed amount is zeroed, not fatal to the record. The status and
/// product fields get no enum check; whatever string arrives is kept.
#[test]
fn normalize_zeroes_unparseable_amounts() {
    let rec = normalize_row(&fields(
        "evt-1,M001,2025-01-10 09:15:00,POS,PURCHASE,not-a-number,WHATEVER,WEB,Lagos,TIER1",
    ))
    .expect("record with a bad amount must still normalize");

    assert_eq!(rec.amount, 0.0, "unparseable amount must become zero");
    assert_eq!(rec.status, "WHATEVER", "status passes through unvalidated");
}

// ── Bulk loader ──────────────────────────────────────────────────────────────

/// Every data row is either loaded or skipped; nothing disappears.
#[test]
fn loaded_plus_skipped_accounts_for_every_row() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "activities_2025_01.csv",
        &[
            "evt-1,M001,2025-01-10 09:15:00,POS,PURCHASE,120.50,SUCCESS,WEB,Lagos,TIER1",
            "evt-2,M002,2025-01-10 10:00:00,POS,PURCHASE,80.00,FAILED,WEB,Lagos", // 9 columns
            "evt-3,M003,2025-01-11 11:30:00,KYC,DOCUMENT_SUBMITTED,0,SUCCESS,APP,Abuja,TIER2",
        ],
    );

    let store = make_store();
    let report = BulkLoader::new(store.clone())
        .load_directory(dir.path())
        .unwrap();

    assert_eq!(report.per_file.len(), 1);
    assert_eq!(report.per_file[0].loaded, 2);
    assert_eq!(report.per_file[0].skipped, 1);
    assert_eq!(
        report.total_loaded + report.total_skipped,
        3,
        "every data row must be counted exactly once"
    );
    assert_eq!(store.activity_count().unwrap(), 2, "skipped rows never reach storage");
}

/// A row with a bad amount is loaded (amount zeroed), not skipped.
#[test]
fn bad_amount_rows_are_loaded_with_zero() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "activities_bad_amount.csv",
        &["evt-1,M001,2025-01-10 09:15:00,POS,PURCHASE,abc,SUCCESS,WEB,Lagos,TIER1"],
    );

    let store = make_store();
    let report = BulkLoader::new(store.clone())
        .load_directory(dir.path())
        .unwrap();

    assert_eq!(report.total_loaded, 1);
    assert_eq!(report.total_skipped, 0);

    let top = store.top_merchant().unwrap();
    assert_eq!(top.merchant_id.as_deref(), Some("M001"));
    assert_eq!(top.total_volume, 0.0, "the malformed amount must be stored as zero");
}

/// Files are processed in lexicographic filename order regardless of
/// directory enumeration order.
#[test]
fn files_are_processed_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "activities_b.csv",
        &["evt-b,M002,2025-02-01 09:00:00,POS,PURCHASE,10.00,SUCCESS,WEB,Lagos,TIER1"],
    );
    write_file(
        dir.path(),
        "activities_a.csv",
        &["evt-a,M001,2025-01-01 09:00:00,POS,PURCHASE,10.00,SUCCESS,WEB,Lagos,TIER1"],
    );

    let store = make_store();
    let report = BulkLoader::new(store).load_directory(dir.path()).unwrap();

    let names: Vec<&str> = report.per_file.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["activities_a.csv", "activities_b.csv"]);
}

/// Non-matching filenames are invisible to discovery.
#[test]
fn only_matching_filenames_are_discovered() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "activities_ok.csv",
        &["evt-1,M001,2025-01-10 09:00:00,POS,PURCHASE,5.00,SUCCESS,WEB,Lagos,TIER1"],
    );
    write_file(
        dir.path(),
        "other_2025.csv",
        &["evt-x,M009,2025-01-10 09:00:00,POS,PURCHASE,5.00,SUCCESS,WEB,Lagos,TIER1"],
    );
    fs::write(dir.path().join("activities_notes.txt"), "not a csv").unwrap();

    let store = make_store();
    let report = BulkLoader::new(store).load_directory(dir.path()).unwrap();

    assert_eq!(report.per_file.len(), 1);
    assert_eq!(report.per_file[0].filename, "activities_ok.csv");
}

/// A directory with no matching files is a reportable terminal
/// condition, not a crash.
#[test]
fn empty_directory_reports_nothing_to_do() {
    let dir = tempfile::tempdir().unwrap();
    let store = make_store();

    let err = BulkLoader::new(store)
        .load_directory(dir.path())
        .expect_err("no input files must be reported");

    assert!(
        matches!(err, AnalyticsError::NoInputFiles { .. }),
        "expected NoInputFiles, got: {err}"
    );
}

/// An unreadable "file" is abandoned and logged; the remaining files are
/// still ingested. Its report entry carries zero counts.
#[test]
fn unreadable_file_does_not_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    // A directory whose name matches the pattern: opening succeeds but the
    // first read fails, which is exactly a file-level I/O failure.
    fs::create_dir(dir.path().join("activities_aaa.csv")).unwrap();
    write_file(
        dir.path(),
        "activities_bbb.csv",
        &["evt-1,M001,2025-01-10 09:00:00,POS,PURCHASE,5.00,SUCCESS,WEB,Lagos,TIER1"],
    );

    let store = make_store();
    let report = BulkLoader::new(store.clone())
        .load_directory(dir.path())
        .unwrap();

    assert_eq!(report.per_file.len(), 2, "the broken entry still appears in the report");
    assert_eq!(report.per_file[0].filename, "activities_aaa.csv");
    assert_eq!(report.per_file[0].loaded, 0);
    assert_eq!(report.per_file[1].loaded, 1, "the healthy file must still load");
    assert_eq!(store.activity_count().unwrap(), 1);
}

/// No uniqueness constraint: re-ingesting the same directory doubles the
/// row count and never errors.
#[test]
fn reingesting_doubles_row_count() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "activities_dup.csv",
        &[
            "evt-1,M001,2025-01-10 09:00:00,POS,PURCHASE,5.00,SUCCESS,WEB,Lagos,TIER1",
            "evt-2,M002,2025-01-10 10:00:00,POS,PURCHASE,7.00,SUCCESS,WEB,Lagos,TIER1",
        ],
    );

    let store = make_store();
    let loader = BulkLoader::new(store.clone());
    loader.load_directory(dir.path()).unwrap();
    loader.load_directory(dir.path()).unwrap();

    assert_eq!(store.activity_count().unwrap(), 4);
}

/// A header-only file contributes nothing but is still reported.
#[test]
fn header_only_file_loads_zero_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "activities_empty.csv", &[]);

    let store = make_store();
    let report = BulkLoader::new(store).load_directory(dir.path()).unwrap();

    assert_eq!(report.per_file.len(), 1);
    assert_eq!(report.total_loaded, 0);
    assert_eq!(report.total_skipped, 0);
}
