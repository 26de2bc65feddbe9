use serde_json::json;

use super::common::*;
use crate::intelligence::query::{
    translate_query, FilterValue, QueryError, QueryFilter, QueryIntent, QueryOperator,
    QueryTranslator, SortDirection, SortRequest,
};
use crate::intelligence::temporal::{FiscalCalendar, TemporalError};

fn plan_json(filters: &[QueryFilter]) -> serde_json::Value {
    let plan = translate_query(filters, "org-1", date(2026, 1, 26)).expect("translates");
    serde_json::to_value(plan).expect("serializes")
}

#[test]
fn unknown_fields_leave_only_tenant_scope() {
    let plan = plan_json(&[QueryFilter::new("bogus", QueryOperator::Eq, "x")]);
    assert_eq!(
        plan,
        json!({
            "directFilters": { "isActive": true, "organizationId": "org-1" },
            "aggregationHints": []
        })
    );
}

#[test]
fn empty_filter_list_still_scopes_tenant() {
    let plan = plan_json(&[]);
    assert_eq!(plan["directFilters"]["organizationId"], "org-1");
    assert_eq!(plan["directFilters"]["isActive"], true);
}

#[test]
fn operators_map_to_condition_shapes() {
    let plan = plan_json(&[
        QueryFilter::new("capacity", QueryOperator::Gte, 100_000_i64),
        QueryFilter::new("capacity", QueryOperator::Lt, 1_000_000_i64),
        QueryFilter::new(
            "class_year",
            QueryOperator::Between,
            FilterValue::List(vec![1990_i64.into(), 1999_i64.into()]),
        ),
        QueryFilter::new("constituent_type", QueryOperator::In, "alumni"),
        QueryFilter::new("school_college", QueryOperator::Contains, "Engineering"),
        QueryFilter::new("assigned_officer", QueryOperator::Eq, "officer-7"),
    ]);
    let direct = &plan["directFilters"];

    assert_eq!(direct["estimatedCapacity"], json!({ "gte": 100000, "lt": 1000000 }));
    assert_eq!(direct["classYear"], json!({ "gte": 1990, "lte": 1999 }));
    assert_eq!(direct["constituentType"], json!({ "in": ["alumni"] }));
    assert_eq!(
        direct["schoolCollege"],
        json!({ "contains": "Engineering", "mode": "insensitive" })
    );
    assert_eq!(direct["assignedOfficerId"], "officer-7");
}

#[test]
fn tier_labels_become_band_ranges() {
    let plan = plan_json(&[
        QueryFilter::new("lapse_risk", QueryOperator::Eq, "high"),
        QueryFilter::new("priority_score", QueryOperator::Eq, "Medium"),
    ]);
    let direct = &plan["directFilters"];

    assert_eq!(direct["lapseRiskScore"], json!({ "gt": 0.7 }));
    assert_eq!(direct["priorityScore"], json!({ "gte": 0.4, "lte": 0.7 }));
}

#[test]
fn relative_dates_resolve_into_aggregation_hints() {
    let plan = plan_json(&[
        QueryFilter::new("last_gift_date", QueryOperator::Lt, "6_months_ago"),
        QueryFilter::new("Total_Giving", QueryOperator::Gt, 5_000_i64),
    ]);

    assert_eq!(
        plan["aggregationHints"],
        json!([
            { "field": "last_gift_date", "operator": "lt", "value": "2025-07-26" },
            { "field": "total_giving", "operator": "gt", "value": 5000 }
        ])
    );
    assert!(plan["directFilters"].get("last_gift_date").is_none());
}

#[test]
fn absolute_dates_pass_through_unchanged() {
    for raw in ["2025-03-01", "2025-03-01T12:30:00Z"] {
        let plan = plan_json(&[QueryFilter::new(
            "last_contact_date",
            QueryOperator::Gte,
            raw,
        )]);
        assert_eq!(plan["aggregationHints"][0]["value"], raw);
    }
}

#[test]
fn last_fiscal_year_uses_configured_calendar() {
    let plan = plan_json(&[QueryFilter::new(
        "last_gift_date",
        QueryOperator::Gte,
        "last_fiscal_year",
    )]);
    assert_eq!(plan["aggregationHints"][0]["value"], "2024-07-01");

    let january_years = QueryTranslator::new(FiscalCalendar::new(1));
    let intent = QueryIntent {
        filters: vec![QueryFilter::new(
            "last_gift_date",
            QueryOperator::Gte,
            "last_fiscal_year",
        )],
        sort: None,
    };
    let plan = january_years
        .translate(&intent, "org-1", date(2026, 1, 26))
        .expect("translates");
    assert_eq!(
        plan.aggregation_hints[0].value,
        FilterValue::Text("2025-01-01".to_string())
    );
}

#[test]
fn unrecognized_date_token_fails_the_translation() {
    let error = translate_query(
        &[
            QueryFilter::new("capacity", QueryOperator::Gt, 10_i64),
            QueryFilter::new("last_gift_date", QueryOperator::Gt, "a_while_back"),
        ],
        "org-1",
        reference(),
    )
    .expect_err("invalid token");

    assert_eq!(
        error,
        QueryError::InvalidDate {
            field: "last_gift_date".to_string(),
            source: TemporalError::UnrecognizedToken("a_while_back".to_string()),
        }
    );
}

#[test]
fn malformed_clauses_are_dropped() {
    let plan = plan_json(&[
        QueryFilter::new(
            "capacity",
            QueryOperator::Between,
            FilterValue::List(vec![1_i64.into()]),
        ),
        QueryFilter::new("school_college", QueryOperator::Contains, 42_i64),
        QueryFilter::new(
            "last_gift_date",
            QueryOperator::Gt,
            FilterValue::List(vec!["not_a_date".into()]),
        ),
    ]);

    assert_eq!(plan["directFilters"].as_object().map(|map| map.len()), Some(2));
    assert_eq!(plan["aggregationHints"], json!([]));
}

#[test]
fn missing_tenant_is_rejected() {
    let error = translate_query(&[], "   ", reference()).expect_err("no tenant");
    assert_eq!(error, QueryError::MissingTenant);
}

#[test]
fn sort_maps_known_fields_and_drops_unknown() {
    let translator = QueryTranslator::default();
    let mut intent = QueryIntent {
        filters: Vec::new(),
        sort: Some(SortRequest {
            field: "total_giving".to_string(),
            direction: SortDirection::Desc,
        }),
    };
    let plan = translator
        .translate(&intent, "org-1", reference())
        .expect("translates");
    let json = serde_json::to_value(&plan).expect("serializes");
    assert_eq!(
        json["sort"],
        json!({ "field": "total_giving", "direction": "desc", "aggregated": true })
    );

    intent.sort = Some(SortRequest {
        field: "priority_score".to_string(),
        direction: SortDirection::Asc,
    });
    let plan = translator
        .translate(&intent, "org-1", reference())
        .expect("translates");
    let sort = plan.sort.expect("sorted");
    assert_eq!(sort.field, "priorityScore");
    assert!(!sort.aggregated);

    intent.sort = Some(SortRequest {
        field: "favorite_color".to_string(),
        direction: SortDirection::Asc,
    });
    let plan = translator
        .translate(&intent, "org-1", reference())
        .expect("translates");
    assert!(plan.sort.is_none());
}
