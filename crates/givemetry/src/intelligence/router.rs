use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{DonorHistory, GiftRecord};
use super::health::{HealthSnapshot, OrgAggregate};
use super::priority::{PriorityInput, TimingInput};
use super::query::QueryIntent;
use super::DonorIntelligence;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapseRiskRequest {
    #[serde(flatten)]
    pub history: DonorHistory,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRequest {
    #[serde(flatten)]
    pub input: PriorityInput,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    #[serde(flatten)]
    pub history: DonorHistory,
    #[serde(default)]
    pub capacity_estimate: Option<f64>,
    /// Explicit timing signals. When absent they are derived from the fiscal calendar.
    #[serde(default)]
    pub timing: Option<TimingInput>,
    #[serde(default)]
    pub active_campaign: Option<bool>,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRequest {
    #[serde(default)]
    pub gifts: Vec<GiftRecord>,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataHealthRequest {
    pub aggregate: OrgAggregate,
    #[serde(default)]
    pub previous: Option<HealthSnapshot>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub organization_id: String,
    #[serde(flatten)]
    pub intent: QueryIntent,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

/// HTTP endpoints over the scoring models.
pub fn scoring_router(intelligence: Arc<DonorIntelligence>) -> Router {
    Router::new()
        .route("/api/v1/constituents/lapse-risk", post(lapse_risk_handler))
        .route("/api/v1/constituents/priority", post(priority_handler))
        .route("/api/v1/constituents/assessment", post(assessment_handler))
        .route("/api/v1/constituents/segment", post(segment_handler))
        .route(
            "/api/v1/organizations/data-health",
            post(data_health_handler),
        )
        .route("/api/v1/query/translate", post(translate_handler))
        .with_state(intelligence)
}

fn reference_or_today(reference: Option<NaiveDate>) -> NaiveDate {
    reference.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) async fn lapse_risk_handler(
    State(intelligence): State<Arc<DonorIntelligence>>,
    axum::Json(request): axum::Json<LapseRiskRequest>,
) -> Response {
    let reference = reference_or_today(request.reference_date);
    let result = intelligence.lapse_risk(&request.history, reference);
    (StatusCode::OK, axum::Json(result)).into_response()
}

pub(crate) async fn priority_handler(
    State(intelligence): State<Arc<DonorIntelligence>>,
    axum::Json(request): axum::Json<PriorityRequest>,
) -> Response {
    let reference = reference_or_today(request.reference_date);
    let result = intelligence.priority(&request.input, reference);
    (StatusCode::OK, axum::Json(result)).into_response()
}

pub(crate) async fn assessment_handler(
    State(intelligence): State<Arc<DonorIntelligence>>,
    axum::Json(request): axum::Json<AssessmentRequest>,
) -> Response {
    let reference = reference_or_today(request.reference_date);
    let timing = request.timing.unwrap_or_else(|| {
        TimingInput::from_calendar(
            intelligence.fiscal_calendar(),
            reference,
            request.active_campaign,
        )
    });
    let assessment = intelligence.assess(
        &request.history,
        request.capacity_estimate,
        timing,
        reference,
    );
    (StatusCode::OK, axum::Json(assessment)).into_response()
}

pub(crate) async fn segment_handler(
    State(intelligence): State<Arc<DonorIntelligence>>,
    axum::Json(request): axum::Json<SegmentRequest>,
) -> Response {
    let reference = reference_or_today(request.reference_date);
    let summary = intelligence.segment(&request.gifts, reference);
    (StatusCode::OK, axum::Json(summary)).into_response()
}

pub(crate) async fn data_health_handler(
    State(intelligence): State<Arc<DonorIntelligence>>,
    axum::Json(request): axum::Json<DataHealthRequest>,
) -> Response {
    let report = intelligence.data_health(&request.aggregate, request.previous.as_ref());
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn translate_handler(
    State(intelligence): State<Arc<DonorIntelligence>>,
    axum::Json(request): axum::Json<TranslateRequest>,
) -> Response {
    let reference = reference_or_today(request.reference_date);
    match intelligence.translate(&request.intent, &request.organization_id, reference) {
        Ok(plan) => (StatusCode::OK, axum::Json(plan)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}
