use crate::infra::{build_portfolio_report, AppState, PortfolioReport};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDate};
use givemetry::error::AppError;
use givemetry::import::DonorDataset;
use givemetry::intelligence::sources::Campaign;
use givemetry::intelligence::{scoring_router, CampaignCalendar, DonorIntelligence};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

/// Raw exports posted inline, in the same CSV layout the `score` command reads from disk.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PortfolioRequest {
    pub(crate) constituents_csv: String,
    #[serde(default)]
    pub(crate) gifts_csv: String,
    #[serde(default)]
    pub(crate) contacts_csv: String,
    #[serde(default)]
    pub(crate) campaigns: Vec<Campaign>,
    #[serde(default)]
    pub(crate) reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) fn with_service_routes(intelligence: Arc<DonorIntelligence>) -> Router {
    scoring_router(intelligence.clone())
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/organizations/portfolio",
            post(portfolio_endpoint).layer(Extension(intelligence)),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn portfolio_endpoint(
    Extension(intelligence): Extension<Arc<DonorIntelligence>>,
    Json(payload): Json<PortfolioRequest>,
) -> Result<Json<PortfolioReport>, AppError> {
    let PortfolioRequest {
        constituents_csv,
        gifts_csv,
        contacts_csv,
        campaigns,
        reference_date,
        limit,
    } = payload;

    let dataset = DonorDataset::from_readers(
        Cursor::new(constituents_csv.into_bytes()),
        Cursor::new(gifts_csv.into_bytes()),
        Cursor::new(contacts_csv.into_bytes()),
    )?;
    let calendar = CampaignCalendar::new(*intelligence.fiscal_calendar(), campaigns);
    let reference = reference_date.unwrap_or_else(|| Local::now().date_naive());

    build_portfolio_report(&intelligence, &dataset, &calendar, reference, limit).map(Json)
}
