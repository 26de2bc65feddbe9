mod registry;
mod translate;

pub use registry::{fields, lookup, FieldKind, FieldTarget, SemanticField};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::temporal::{FiscalCalendar, TemporalError};

/// Operand of a parsed filter clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    Contains,
}

impl QueryOperator {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::In => "in",
            Self::Contains => "contains",
        }
    }
}

/// One clause of a structured search, as produced by the natural-language parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub field: String,
    pub operator: QueryOperator,
    pub value: FilterValue,
}

impl QueryFilter {
    pub fn new(
        field: impl Into<String>,
        operator: QueryOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<FilterValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<FilterValue>,
}

impl RangeCondition {
    /// Overlays the bounds of `other`; bounds set in both take `other`'s value.
    pub fn merge(&mut self, other: RangeCondition) {
        if other.gt.is_some() {
            self.gt = other.gt;
        }
        if other.gte.is_some() {
            self.gte = other.gte;
        }
        if other.lt.is_some() {
            self.lt = other.lt;
        }
        if other.lte.is_some() {
            self.lte = other.lte;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Insensitive,
}

/// Row-level predicate on a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Condition {
    Equals(FilterValue),
    Range(RangeCondition),
    In {
        #[serde(rename = "in")]
        values: Vec<FilterValue>,
    },
    Contains {
        contains: String,
        mode: MatchMode,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySort {
    pub field: String,
    pub direction: SortDirection,
    pub aggregated: bool,
}

/// Parsed search intent: filter clauses plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
    #[serde(default)]
    pub sort: Option<SortRequest>,
}

/// Storage-facing plan. `direct_filters` apply per row; `aggregation_hints` apply after
/// summarizing related gift and contact rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    pub direct_filters: BTreeMap<String, Condition>,
    pub aggregation_hints: Vec<QueryFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<QuerySort>,
}

pub const TENANT_COLUMN: &str = "organizationId";
pub const ACTIVE_COLUMN: &str = "isActive";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid date value for `{field}`: {source}")]
    InvalidDate {
        field: String,
        #[source]
        source: TemporalError,
    },
    #[error("a tenant scope is required to translate a query")]
    MissingTenant,
}

/// Turns parsed filter clauses into a tenant-scoped [`QueryPlan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryTranslator {
    calendar: FiscalCalendar,
}

impl QueryTranslator {
    pub fn new(calendar: FiscalCalendar) -> Self {
        Self { calendar }
    }

    pub fn translate(
        &self,
        intent: &QueryIntent,
        tenant: &str,
        reference: NaiveDate,
    ) -> Result<QueryPlan, QueryError> {
        let tenant = tenant.trim();
        if tenant.is_empty() {
            return Err(QueryError::MissingTenant);
        }

        let mut direct_filters = BTreeMap::new();
        let mut aggregation_hints = Vec::new();

        for filter in &intent.filters {
            let Some(field) = registry::lookup(&filter.field) else {
                warn!(field = %filter.field, "dropping filter on unknown field");
                continue;
            };
            let Some(clause) = translate::clause(filter, field, reference, &self.calendar)? else {
                warn!(
                    field = field.name,
                    operator = filter.operator.label(),
                    "dropping malformed filter"
                );
                continue;
            };
            match clause {
                translate::Clause::Direct(column, condition) => {
                    translate::insert_condition(&mut direct_filters, column, condition);
                }
                translate::Clause::Hint(hint) => aggregation_hints.push(hint),
            }
        }

        direct_filters.insert(
            TENANT_COLUMN.to_string(),
            Condition::Equals(FilterValue::Text(tenant.to_string())),
        );
        direct_filters.insert(
            ACTIVE_COLUMN.to_string(),
            Condition::Equals(FilterValue::Bool(true)),
        );

        let sort = intent.sort.as_ref().and_then(|request| {
            let Some(field) = registry::lookup(&request.field) else {
                warn!(field = %request.field, "dropping sort on unknown field");
                return None;
            };
            Some(QuerySort {
                field: field.column().to_string(),
                direction: request.direction,
                aggregated: field.is_aggregated(),
            })
        });

        debug!(
            tenant,
            direct_filters = direct_filters.len(),
            aggregation_hints = aggregation_hints.len(),
            "query translated"
        );

        Ok(QueryPlan {
            direct_filters,
            aggregation_hints,
            sort,
        })
    }
}

/// Filter-only translation with the default fiscal calendar.
pub fn translate_query(
    filters: &[QueryFilter],
    tenant: &str,
    reference: NaiveDate,
) -> Result<QueryPlan, QueryError> {
    let intent = QueryIntent {
        filters: filters.to_vec(),
        sort: None,
    };
    QueryTranslator::default().translate(&intent, tenant, reference)
}
