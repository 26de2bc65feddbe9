use super::config::{ConsistencyPolicy, CoveragePolicy, FreshnessPolicy};
use super::OrgAggregate;
use crate::intelligence::domain::percent;
use crate::intelligence::temporal::elapsed_months;

pub(crate) struct CategoryScore {
    pub value: f64,
    pub description: String,
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part.min(whole) as f64 / whole as f64).clamp(0.0, 1.0)
    }
}

fn field_ratio(populated: &[u64], total: u64) -> Option<f64> {
    if total == 0 || populated.is_empty() {
        return None;
    }
    let filled: f64 = populated
        .iter()
        .map(|count| (*count).min(total) as f64 / total as f64)
        .sum();
    Some((filled / populated.len() as f64).clamp(0.0, 1.0))
}

pub(crate) fn completeness(aggregate: &OrgAggregate) -> CategoryScore {
    let constituents = &aggregate.constituents;
    let gifts = &aggregate.gifts;
    let contacts = &aggregate.contacts;
    let ratios: Vec<f64> = [
        field_ratio(
            &[constituents.with_name, constituents.with_email],
            constituents.total,
        ),
        field_ratio(
            &[gifts.with_amount, gifts.with_date, gifts.with_constituent],
            gifts.total,
        ),
        field_ratio(
            &[contacts.with_date, contacts.with_type, contacts.with_constituent],
            contacts.total,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if ratios.is_empty() {
        return CategoryScore {
            value: 0.0,
            description: "no records to evaluate".to_string(),
        };
    }

    let value = ratios.iter().sum::<f64>() / ratios.len() as f64;
    CategoryScore {
        value,
        description: format!(
            "{} of required fields populated across {} record type(s)",
            percent(value),
            ratios.len()
        ),
    }
}

fn linear_decay(months: Option<f64>, horizon: f64) -> f64 {
    match months {
        Some(months) if horizon > 0.0 => (1.0 - months / horizon).max(0.0),
        _ => 0.0,
    }
}

pub(crate) fn freshness(aggregate: &OrgAggregate, policy: &FreshnessPolicy) -> CategoryScore {
    let reference = aggregate.reference_date;
    let gift_months = aggregate
        .last_gift_date
        .map(|date| elapsed_months(date, reference));
    let contact_months = aggregate
        .last_contact_date
        .map(|date| elapsed_months(date, reference));

    let gift_weight = policy.gift_weight.max(0.0);
    let contact_weight = policy.contact_weight.max(0.0);
    let weight_sum = gift_weight + contact_weight;
    let value = if weight_sum > 0.0 {
        (gift_weight * linear_decay(gift_months, policy.gift_horizon_months)
            + contact_weight * linear_decay(contact_months, policy.contact_horizon_months))
            / weight_sum
    } else {
        0.0
    };

    let describe = |months: Option<f64>, noun: &str| match months {
        Some(months) => format!("last {noun} {months:.0} months ago"),
        None => format!("no {noun} on record"),
    };
    CategoryScore {
        value: value.clamp(0.0, 1.0),
        description: format!(
            "{}; {}",
            describe(gift_months, "gift"),
            describe(contact_months, "contact")
        ),
    }
}

fn check(errors: u64, population: u64, tolerance: f64) -> Option<f64> {
    if population == 0 {
        return None;
    }
    let rate = ratio(errors, population);
    if tolerance <= 0.0 {
        return Some(if errors == 0 { 1.0 } else { 0.0 });
    }
    Some((1.0 - rate / tolerance).max(0.0))
}

pub(crate) fn consistency(aggregate: &OrgAggregate, policy: &ConsistencyPolicy) -> CategoryScore {
    let quality = &aggregate.quality;
    let dated_records = aggregate.gifts.total.saturating_add(aggregate.contacts.total);
    let checks: Vec<f64> = [
        check(
            quality.invalid_emails,
            aggregate.constituents.with_email.min(aggregate.constituents.total),
            policy.invalid_email_tolerance,
        ),
        check(
            quality.duplicate_constituents,
            aggregate.constituents.total,
            policy.duplicate_tolerance,
        ),
        check(
            quality.invalid_gift_amounts,
            aggregate.gifts.total,
            policy.invalid_amount_tolerance,
        ),
        check(
            quality.future_dated_records,
            dated_records,
            policy.future_date_tolerance,
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    if checks.is_empty() {
        return CategoryScore {
            value: 0.0,
            description: "no records to check".to_string(),
        };
    }

    let value = checks.iter().sum::<f64>() / checks.len() as f64;
    let issues = [
        quality.duplicate_constituents,
        quality.invalid_gift_amounts,
        quality.future_dated_records,
    ]
    .into_iter()
    .fold(quality.invalid_emails, u64::saturating_add);
    CategoryScore {
        value,
        description: format!(
            "{issues} format or duplicate issue(s) across {} check(s)",
            checks.len()
        ),
    }
}

pub(crate) fn coverage(aggregate: &OrgAggregate, policy: &CoveragePolicy) -> CategoryScore {
    let present = [
        aggregate.constituents.total,
        aggregate.gifts.total,
        aggregate.contacts.total,
    ]
    .iter()
    .filter(|total| **total > 0)
    .count();
    let breadth = present as f64 / 3.0;

    let constituents = aggregate.constituents.total;
    let with_gifts = ratio(aggregate.coverage.constituents_with_gifts, constituents);
    let with_contacts = ratio(aggregate.coverage.constituents_with_contacts, constituents);
    let linkage = (with_gifts + with_contacts) / 2.0;

    let breadth_weight = policy.breadth_weight.max(0.0);
    let linkage_weight = policy.linkage_weight.max(0.0);
    let weight_sum = breadth_weight + linkage_weight;
    let value = if weight_sum > 0.0 {
        (breadth_weight * breadth + linkage_weight * linkage) / weight_sum
    } else {
        0.0
    };

    CategoryScore {
        value: value.clamp(0.0, 1.0),
        description: format!(
            "{present} of 3 record types present; {} of constituents with gifts, {} with contacts",
            percent(with_gifts),
            percent(with_contacts)
        ),
    }
}
