//! HTTP surface — a thin dispatcher from URL paths to query-service
//! calls.
//!
//! Five GETs under /analytics plus a liveness root. Any internal failure
//! maps to 500 with the underlying message as detail; no other status
//! codes are defined for this surface.

use crate::{error::AnalyticsError, service::QueryService};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Build the router. One service handle is shared by every request.
pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/analytics/top-merchant", get(top_merchant))
        .route(
            "/analytics/monthly-active-merchants",
            get(monthly_active_merchants),
        )
        .route("/analytics/product-adoption", get(product_adoption))
        .route("/analytics/kyc-funnel", get(kyc_funnel))
        .route("/analytics/failure-rates", get(failure_rates))
        .with_state(service)
}

/// Liveness probe.
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Merchant Analytics API is running.",
    }))
}

async fn top_merchant(State(service): State<Arc<QueryService>>) -> Response {
    respond(service, QueryService::top_merchant).await
}

async fn monthly_active_merchants(State(service): State<Arc<QueryService>>) -> Response {
    respond(service, QueryService::monthly_active_merchants).await
}

async fn product_adoption(State(service): State<Arc<QueryService>>) -> Response {
    respond(service, QueryService::product_adoption).await
}

async fn kyc_funnel(State(service): State<Arc<QueryService>>) -> Response {
    respond(service, QueryService::kyc_funnel).await
}

async fn failure_rates(State(service): State<Arc<QueryService>>) -> Response {
    respond(service, QueryService::failure_rates).await
}

/// Run one blocking service call on the blocking pool and serialize the
/// result.
async fn respond<T, F>(service: Arc<QueryService>, call: F) -> Response
where
    T: serde::Serialize + Send + 'static,
    F: FnOnce(&QueryService) -> Result<T, AnalyticsError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(Ok(value)) => Json(value).into_response(),
        Ok(Err(err)) => internal_error(err.to_string()),
        Err(join_err) => internal_error(join_err.to_string()),
    }
}

fn internal_error(detail: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": detail })),
    )
        .into_response()
}
