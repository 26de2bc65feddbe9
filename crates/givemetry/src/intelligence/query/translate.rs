use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::registry::{FieldKind, SemanticField};
use super::{
    Condition, FilterValue, MatchMode, QueryError, QueryFilter, QueryOperator, RangeCondition,
};
use crate::intelligence::domain::{HIGH_BAND_THRESHOLD, MEDIUM_BAND_THRESHOLD};
use crate::intelligence::temporal::{resolve_date_value, FiscalCalendar, TemporalError};

pub(crate) enum Clause {
    Direct(&'static str, Condition),
    Hint(QueryFilter),
}

/// Translates one clause. `Ok(None)` marks a malformed shape that should be dropped.
pub(crate) fn clause(
    filter: &QueryFilter,
    field: &SemanticField,
    reference: NaiveDate,
    calendar: &FiscalCalendar,
) -> Result<Option<Clause>, QueryError> {
    if !shape_is_valid(filter.operator, &filter.value) {
        return Ok(None);
    }

    let value = if field.kind == FieldKind::Date && filter.operator != QueryOperator::Contains {
        resolve_dates(&filter.value, reference, calendar).map_err(|source| {
            QueryError::InvalidDate {
                field: field.name.to_string(),
                source,
            }
        })?
    } else {
        filter.value.clone()
    };

    if field.is_aggregated() {
        return Ok(Some(Clause::Hint(QueryFilter {
            field: field.name.to_string(),
            operator: filter.operator,
            value,
        })));
    }

    Ok(condition(field, filter.operator, value)
        .map(|condition| Clause::Direct(field.column(), condition)))
}

/// Range filters on one column merge; any other condition replaces what was there.
pub(crate) fn insert_condition(
    filters: &mut BTreeMap<String, Condition>,
    column: &str,
    condition: Condition,
) {
    match filters.entry(column.to_string()) {
        Entry::Occupied(mut existing) => match (existing.get_mut(), condition) {
            (Condition::Range(current), Condition::Range(incoming)) => current.merge(incoming),
            (slot, incoming) => *slot = incoming,
        },
        Entry::Vacant(slot) => {
            slot.insert(condition);
        }
    }
}

fn shape_is_valid(operator: QueryOperator, value: &FilterValue) -> bool {
    match operator {
        QueryOperator::Eq | QueryOperator::In => true,
        QueryOperator::Gt | QueryOperator::Gte | QueryOperator::Lt | QueryOperator::Lte => {
            !matches!(value, FilterValue::List(_))
        }
        QueryOperator::Between => match value {
            FilterValue::List(bounds) => {
                bounds.len() == 2
                    && bounds
                        .iter()
                        .all(|bound| !matches!(bound, FilterValue::List(_)))
            }
            _ => false,
        },
        QueryOperator::Contains => matches!(value, FilterValue::Text(_)),
    }
}

fn resolve_dates(
    value: &FilterValue,
    reference: NaiveDate,
    calendar: &FiscalCalendar,
) -> Result<FilterValue, TemporalError> {
    match value {
        FilterValue::Text(raw) => Ok(FilterValue::Text(resolve_date_value(
            raw, reference, calendar,
        )?)),
        FilterValue::List(items) => items
            .iter()
            .map(|item| resolve_dates(item, reference, calendar))
            .collect::<Result<Vec<_>, _>>()
            .map(FilterValue::List),
        other => Ok(other.clone()),
    }
}

fn tier_range(label: &str) -> Option<RangeCondition> {
    let high = FilterValue::Number(HIGH_BAND_THRESHOLD);
    let medium = FilterValue::Number(MEDIUM_BAND_THRESHOLD);
    match label.trim().to_ascii_lowercase().as_str() {
        "high" => Some(RangeCondition {
            gt: Some(high),
            ..RangeCondition::default()
        }),
        "medium" => Some(RangeCondition {
            gte: Some(medium),
            lte: Some(high),
            ..RangeCondition::default()
        }),
        "low" => Some(RangeCondition {
            lt: Some(medium),
            ..RangeCondition::default()
        }),
        _ => None,
    }
}

fn condition(
    field: &SemanticField,
    operator: QueryOperator,
    value: FilterValue,
) -> Option<Condition> {
    let bound = |value| Some(Condition::Range(value));
    match operator {
        QueryOperator::Eq => {
            if field.kind == FieldKind::Score {
                if let Some(range) = value.as_text().and_then(tier_range) {
                    return Some(Condition::Range(range));
                }
            }
            Some(Condition::Equals(value))
        }
        QueryOperator::Gt => bound(RangeCondition {
            gt: Some(value),
            ..RangeCondition::default()
        }),
        QueryOperator::Gte => bound(RangeCondition {
            gte: Some(value),
            ..RangeCondition::default()
        }),
        QueryOperator::Lt => bound(RangeCondition {
            lt: Some(value),
            ..RangeCondition::default()
        }),
        QueryOperator::Lte => bound(RangeCondition {
            lte: Some(value),
            ..RangeCondition::default()
        }),
        QueryOperator::Between => match value {
            FilterValue::List(bounds) => {
                let mut bounds = bounds.into_iter();
                let lower = bounds.next()?;
                let upper = bounds.next()?;
                bound(RangeCondition {
                    gte: Some(lower),
                    lte: Some(upper),
                    ..RangeCondition::default()
                })
            }
            _ => None,
        },
        QueryOperator::In => match value {
            FilterValue::List(values) => Some(Condition::In { values }),
            scalar => Some(Condition::In {
                values: vec![scalar],
            }),
        },
        QueryOperator::Contains => match value {
            FilterValue::Text(contains) => Some(Condition::Contains {
                contains,
                mode: MatchMode::Insensitive,
            }),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::query::registry::lookup;

    #[test]
    fn between_requires_two_scalar_bounds() {
        assert!(shape_is_valid(
            QueryOperator::Between,
            &FilterValue::List(vec![1_i64.into(), 5_i64.into()])
        ));
        assert!(!shape_is_valid(
            QueryOperator::Between,
            &FilterValue::List(vec![1_i64.into()])
        ));
        assert!(!shape_is_valid(QueryOperator::Between, &FilterValue::Integer(3)));
        assert!(!shape_is_valid(
            QueryOperator::Gt,
            &FilterValue::List(vec![1_i64.into()])
        ));
        assert!(!shape_is_valid(QueryOperator::Contains, &FilterValue::Integer(3)));
    }

    #[test]
    fn tier_labels_only_apply_to_scores() {
        let capacity = lookup("capacity").expect("registered");
        assert_eq!(
            condition(capacity, QueryOperator::Eq, "high".into()),
            Some(Condition::Equals("high".into()))
        );
        let risk = lookup("lapse_risk").expect("registered");
        assert!(matches!(
            condition(risk, QueryOperator::Eq, "High".into()),
            Some(Condition::Range(RangeCondition { gt: Some(_), .. }))
        ));
    }

    #[test]
    fn ranges_merge_and_equality_replaces() {
        let mut filters = BTreeMap::new();
        insert_condition(
            &mut filters,
            "estimatedCapacity",
            Condition::Range(RangeCondition {
                gte: Some(10_000_i64.into()),
                ..RangeCondition::default()
            }),
        );
        insert_condition(
            &mut filters,
            "estimatedCapacity",
            Condition::Range(RangeCondition {
                lt: Some(50_000_i64.into()),
                ..RangeCondition::default()
            }),
        );
        assert_eq!(
            filters.get("estimatedCapacity"),
            Some(&Condition::Range(RangeCondition {
                gte: Some(10_000_i64.into()),
                lt: Some(50_000_i64.into()),
                ..RangeCondition::default()
            }))
        );

        insert_condition(
            &mut filters,
            "estimatedCapacity",
            Condition::Equals(25_000_i64.into()),
        );
        assert_eq!(
            filters.get("estimatedCapacity"),
            Some(&Condition::Equals(25_000_i64.into()))
        );
    }
}
