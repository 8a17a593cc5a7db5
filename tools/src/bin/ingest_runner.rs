//! ingest-runner: batch CSV ingest into the analytics store.
//!
//! Usage:
//!   ingest-runner [--data-dir ./data] [--db analytics.db]
//!
//! Run-to-completion: discovers activities_*.csv drops, streams every row
//! through the normalizer and prints the per-file and total counts.

use anyhow::Result;
use merchant_analytics_core::{
    config::AppConfig, error::AnalyticsError, ingest::BulkLoader, store::ActivityStore,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let mut config = AppConfig::from_env();
    let args: Vec<String> = env::args().collect();
    if let Some(dir) = flag_value(&args, "--data-dir") {
        config.data_dir = dir;
    }
    if let Some(db) = flag_value(&args, "--db") {
        config.db_path = db;
    }

    println!("merchant analytics — ingest-runner");
    println!("  db:        {}", config.db_path);
    println!("  data_dir:  {}", config.data_dir);
    println!();

    let store = ActivityStore::open(&config.db_path, config.pool_size)?;
    // DDL failure is fatal: nothing below can run without the table.
    store.ensure_schema()?;

    let loader = BulkLoader::new(store.clone());
    let report = match loader.load_directory(Path::new(&config.data_dir)) {
        Ok(report) => report,
        Err(AnalyticsError::NoInputFiles { dir, pattern }) => {
            println!("No {pattern} files found in {dir} — nothing to do.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    for file in &report.per_file {
        println!(
            "  {}: {} loaded, {} skipped",
            file.filename, file.loaded, file.skipped
        );
    }
    println!();
    println!(
        "Done. Total rows loaded: {} | Total skipped: {} | Rows in table: {}",
        report.total_loaded,
        report.total_skipped,
        store.activity_count()?
    );

    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}
