//! CSV bulk-ingest pipeline.
//!
//! Isolation granularity (fixed: row-by-row inserts, not the bulk-copy
//! fast path):
//!   - record level: a malformed or unstorable row is counted as skipped
//!     and the file continues
//!   - file level: an unreadable file is logged and abandoned, the run
//!     continues with the remaining files
//!
//! Every skip increments a counter reported at the end of the run;
//! nothing is dropped silently.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    store::ActivityStore,
    types::{ActivityRecord, ACTIVITY_COLUMNS},
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Fixed filename prefix for input discovery; the suffix is a date or
/// shard id.
pub const FILE_PREFIX: &str = "activities_";
/// Input file extension.
pub const FILE_EXTENSION: &str = ".csv";

/// Column position of the amount field within a raw row.
const AMOUNT_INDEX: usize = 5;

/// Coerce an ordered row of raw fields into a storable record.
///
/// Returns `None` when the row does not carry exactly ten columns. An
/// unparseable amount becomes 0.0: malformed amounts are zeroed, never
/// fatal to the record. Every other field passes through untouched; the
/// store keeps whatever string arrives.
pub fn normalize_row(fields: &csv::StringRecord) -> Option<ActivityRecord> {
    if fields.len() != ACTIVITY_COLUMNS {
        return None;
    }
    Some(ActivityRecord {
        event_id: fields[0].to_string(),
        merchant_id: fields[1].to_string(),
        event_timestamp: fields[2].to_string(),
        product: fields[3].to_string(),
        event_type: fields[4].to_string(),
        amount: fields[AMOUNT_INDEX].trim().parse::<f64>().unwrap_or(0.0),
        status: fields[6].to_string(),
        channel: fields[7].to_string(),
        region: fields[8].to_string(),
        merchant_tier: fields[9].to_string(),
    })
}

/// Outcome of one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub loaded: u64,
    pub skipped: u64,
}

/// Outcome of a whole ingest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub per_file: Vec<FileReport>,
    pub total_loaded: u64,
    pub total_skipped: u64,
}

/// Streams activities_*.csv files into the store, one insert per record.
pub struct BulkLoader {
    store: ActivityStore,
}

impl BulkLoader {
    pub fn new(store: ActivityStore) -> Self {
        Self { store }
    }

    /// Ingest every matching file under `dir`, in lexicographic filename
    /// order so repeated runs process files identically.
    ///
    /// Fails up-front with `NoInputFiles` when there is nothing to load,
    /// or `Io` when the directory itself cannot be read. Individual file
    /// and record failures are counted, logged and survived.
    pub fn load_directory(&self, dir: &Path) -> AnalyticsResult<LoadReport> {
        let files = discover_files(dir)?;
        if files.is_empty() {
            return Err(AnalyticsError::NoInputFiles {
                dir: dir.display().to_string(),
                pattern: format!("{FILE_PREFIX}*{FILE_EXTENSION}"),
            });
        }

        log::info!("found {} input file(s) in {}", files.len(), dir.display());

        let mut report = LoadReport::default();
        for path in files {
            let filename = display_name(&path);
            match self.load_file(&path, &filename) {
                Ok(file_report) => {
                    log::info!(
                        "{}: {} loaded, {} skipped",
                        filename,
                        file_report.loaded,
                        file_report.skipped
                    );
                    report.total_loaded += file_report.loaded;
                    report.total_skipped += file_report.skipped;
                    report.per_file.push(file_report);
                }
                Err(err) => {
                    log::warn!("could not read {filename}: {err}");
                    report.per_file.push(FileReport {
                        filename,
                        loaded: 0,
                        skipped: 0,
                    });
                }
            }
        }
        Ok(report)
    }

    /// One file: discard the header, normalize and insert each record.
    /// Inserts are autocommit; rows loaded before a failure stay loaded.
    fn load_file(&self, path: &Path, filename: &str) -> AnalyticsResult<FileReport> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut loaded = 0u64;
        let mut skipped = 0u64;
        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                // An I/O failure mid-file means the rest of the file is
                // unreachable; abandon it. Anything else is one bad
                // record.
                Err(err) => {
                    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                        return Err(err.into());
                    }
                    log::debug!("{filename}: unreadable record: {err}");
                    skipped += 1;
                    continue;
                }
            };
            let normalized = match normalize_row(&record) {
                Some(normalized) => normalized,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            match self.store.insert_activity(&normalized) {
                Ok(()) => loaded += 1,
                Err(err) => {
                    log::debug!("{filename}: insert failed: {err}");
                    skipped += 1;
                }
            }
        }

        Ok(FileReport {
            filename: filename.to_string(),
            loaded,
            skipped,
        })
    }
}

/// Matching files under `dir`, lexicographically sorted.
fn discover_files(dir: &Path) -> AnalyticsResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION) {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
