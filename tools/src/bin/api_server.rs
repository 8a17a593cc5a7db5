//! api-server: serves the precomputed analytics aggregates over HTTP.
//!
//! Usage:
//!   api-server [--bind 127.0.0.1:8000] [--db analytics.db]
//!
//! The query service and its result cache live for the whole process;
//! aggregates reflect the table as of each one's first request.

use anyhow::Result;
use merchant_analytics_core::{config::AppConfig, http, service::QueryService, store::ActivityStore};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = AppConfig::from_env();
    let args: Vec<String> = env::args().collect();
    if let Some(bind) = flag_value(&args, "--bind") {
        config.bind = bind;
    }
    if let Some(db) = flag_value(&args, "--db") {
        config.db_path = db;
    }

    let store = ActivityStore::open(&config.db_path, config.pool_size)?;
    // DDL failure is fatal: serving without the table is pointless.
    store.ensure_schema()?;

    let service = Arc::new(QueryService::new(store));
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    log::info!("serving analytics on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}
