use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::intelligence::router::{lapse_risk_handler, LapseRiskRequest};
use crate::intelligence::{scoring_router, DonorHistory, DonorIntelligence};

fn router() -> axum::Router {
    scoring_router(Arc::new(DonorIntelligence::default()))
}

#[tokio::test]
async fn lapse_risk_handler_scores_empty_history() {
    let response = lapse_risk_handler(
        State(Arc::new(DonorIntelligence::default())),
        axum::Json(LapseRiskRequest {
            history: DonorHistory::default(),
            reference_date: Some(reference()),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["riskLevel"], "high");
    assert_eq!(payload["predictedLapseWindow"], "1-3 months");
    assert_eq!(payload["factors"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn lapse_risk_route_accepts_wire_records() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/constituents/lapse-risk",
            &json!({
                "gifts": [
                    { "amount": 1000.0, "date": "2025-12-01" },
                    { "amount": 1000.0, "date": "2024-12-01" },
                    { "amount": 1000.0, "date": "2023-12-01" }
                ],
                "contacts": [
                    { "date": "2025-11-01", "type": "meeting", "outcome": "positive" }
                ],
                "referenceDate": "2026-01-15"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["riskLevel"], "low");
    assert_eq!(payload["factors"][0]["name"], "recency");
}

#[tokio::test]
async fn assessment_route_derives_timing_from_fiscal_calendar() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/constituents/assessment",
            &json!({
                "gifts": [{ "amount": 250.0, "date": "2025-11-15" }],
                "capacityEstimate": 30000,
                "activeCampaign": true,
                "referenceDate": "2026-06-20"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload["lapse"]["score"].is_number());
    assert_eq!(payload["priority"]["factors"][2]["name"], "timing");
    assert_eq!(
        payload["priority"]["factors"][2]["value"],
        "10 days to fiscal year-end; active campaign"
    );
    assert_eq!(payload["segment"]["segment"], "new_donor");
}

#[tokio::test]
async fn data_health_route_reports_trend() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/organizations/data-health",
            &json!({
                "aggregate": {
                    "constituents": { "total": 10, "withName": 10, "withEmail": 8 },
                    "gifts": {
                        "total": 20,
                        "withAmount": 20,
                        "withDate": 20,
                        "withConstituent": 20
                    },
                    "lastGiftDate": "2026-01-01",
                    "referenceDate": "2026-01-15"
                },
                "previous": {
                    "overallScore": 0.1,
                    "categories": {
                        "completeness": 0.1,
                        "freshness": 0.1,
                        "consistency": 0.1,
                        "coverage": 0.1
                    }
                }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["trend"], "up");
    assert!(payload["overallScore"].as_f64().is_some_and(|score| score > 0.1));
}

#[tokio::test]
async fn data_health_route_accepts_saturated_counts() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/organizations/data-health",
            &json!({
                "aggregate": {
                    "gifts": {
                        "total": u64::MAX,
                        "withAmount": u64::MAX,
                        "withDate": u64::MAX,
                        "withConstituent": u64::MAX
                    },
                    "contacts": { "total": u64::MAX },
                    "referenceDate": "2026-01-15"
                }
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload["overallScore"]
        .as_f64()
        .is_some_and(|score| (0.0..=1.0).contains(&score)));
}

#[tokio::test]
async fn translate_route_returns_plan() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/query/translate",
            &json!({
                "organizationId": "org-1",
                "filters": [
                    { "field": "lapse_risk", "operator": "eq", "value": "high" },
                    { "field": "last_gift_date", "operator": "lt", "value": "1_year_ago" }
                ],
                "sort": { "field": "capacity" },
                "referenceDate": "2026-01-26"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["directFilters"]["organizationId"], "org-1");
    assert_eq!(payload["directFilters"]["lapseRiskScore"], json!({ "gt": 0.7 }));
    assert_eq!(payload["aggregationHints"][0]["value"], "2025-01-26");
    assert_eq!(payload["sort"]["field"], "estimatedCapacity");
    assert_eq!(payload["sort"]["direction"], "desc");
}

#[tokio::test]
async fn translate_route_rejects_bad_date_tokens() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/query/translate",
            &json!({
                "organizationId": "org-1",
                "filters": [
                    { "field": "last_gift_date", "operator": "gt", "value": "sometime" }
                ]
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("sometime")));
}
