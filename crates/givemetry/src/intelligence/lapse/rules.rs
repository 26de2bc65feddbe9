use super::config::LapseRiskConfig;
use super::history::HistorySummary;
use crate::intelligence::domain::{format_amount, percent, unit_interval, FactorKind};
use crate::intelligence::temporal::{describe_months, AVERAGE_DAYS_PER_MONTH};

/// A sub-score in [0, 1] (1 = maximum risk) with its plain-language explanation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SubScore {
    pub value: f64,
    pub description: String,
}

impl SubScore {
    fn new(value: f64, description: impl Into<String>) -> Self {
        Self {
            value: unit_interval(value, 1.0),
            description: description.into(),
        }
    }
}

pub(crate) type SubScoreFn = fn(&HistorySummary, &LapseRiskConfig) -> SubScore;

/// Row of the lapse rule table.
#[derive(Clone, Copy)]
pub(crate) struct LapseRule {
    pub kind: FactorKind,
    pub weight: f64,
    pub score: SubScoreFn,
}

pub(crate) fn rule_table(config: &LapseRiskConfig) -> [LapseRule; 4] {
    let weights = &config.weights;
    [
        LapseRule {
            kind: FactorKind::Recency,
            weight: weights.recency,
            score: recency_score,
        },
        LapseRule {
            kind: FactorKind::Frequency,
            weight: weights.frequency,
            score: frequency_score,
        },
        LapseRule {
            kind: FactorKind::Monetary,
            weight: weights.monetary,
            score: monetary_score,
        },
        LapseRule {
            kind: FactorKind::Contact,
            weight: weights.contact,
            score: contact_score,
        },
    ]
}

fn recency_score(summary: &HistorySummary, config: &LapseRiskConfig) -> SubScore {
    match summary.months_since_last_gift() {
        Some(months) => SubScore::new(
            config.recency_curve.risk_at(months),
            describe_months(months, "since last gift"),
        ),
        None => SubScore::new(1.0, "no gift on record"),
    }
}

fn frequency_score(summary: &HistorySummary, config: &LapseRiskConfig) -> SubScore {
    let Some(months_since) = summary.months_since_last_gift() else {
        return SubScore::new(1.0, "no giving cadence established");
    };

    let policy = &config.frequency;
    let (cadence_months, cadence_label) = match summary.mean_interval_days {
        Some(days) => {
            let cadence = days.max(policy.minimum_cadence_days) / AVERAGE_DAYS_PER_MONTH;
            (cadence, "typical")
        }
        None => (policy.single_gift_cadence_months, "expected"),
    };

    let ratio = if cadence_months > 0.0 {
        months_since / cadence_months
    } else {
        0.0
    };
    let span = (policy.saturation_ratio - policy.tolerance_ratio).max(f64::EPSILON);
    let value = ((ratio - policy.tolerance_ratio) / span).clamp(0.0, 1.0);

    SubScore::new(
        value,
        format!(
            "{} vs {cadence_label} {:.0}-month giving cadence",
            describe_months(months_since, "since last gift"),
            cadence_months.max(1.0)
        ),
    )
}

fn monetary_score(summary: &HistorySummary, config: &LapseRiskConfig) -> SubScore {
    let policy = &config.monetary;
    let Some(trend) = summary.trend else {
        return match summary.last_gift_amount {
            Some(amount) => SubScore::new(
                policy.single_gift_score,
                format!("single gift of {} on record", format_amount(amount)),
            ),
            None => SubScore::new(1.0, "no giving amounts on record"),
        };
    };

    if trend.prior_mean <= 0.0 || trend.latest >= trend.prior_mean {
        return SubScore::new(
            0.0,
            format!(
                "latest gift of {} at or above prior average of {}",
                format_amount(trend.latest),
                format_amount(trend.prior_mean)
            ),
        );
    }

    let drop = ((trend.prior_mean - trend.latest) / trend.prior_mean).clamp(0.0, 1.0);
    let persistence = trend.declining_steps as f64 / trend.steps as f64;
    let isolated = policy.isolated_decline_weight.clamp(0.0, 1.0);
    let value = drop * (isolated + (1.0 - isolated) * persistence);

    SubScore::new(
        value,
        format!(
            "latest gift {} below prior average ({} of {} gift-to-gift steps declined)",
            percent(drop),
            trend.declining_steps,
            trend.steps
        ),
    )
}

fn contact_score(summary: &HistorySummary, config: &LapseRiskConfig) -> SubScore {
    let policy = &config.contact;
    let Some(latest) = summary.latest_contact else {
        return SubScore::new(policy.missing_contact_score, "no contact on record");
    };

    let months = summary.months_since_last_contact().unwrap_or(0.0);
    let mut value = if policy.saturation_months > 0.0 {
        (months / policy.saturation_months).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let mut description = format!(
        "{} ({})",
        describe_months(months, "since last contact"),
        latest.contact_type.label()
    );
    if let Some(outcome) = latest.outcome {
        if outcome.is_unfavorable() {
            value += policy.unfavorable_outcome_penalty;
        }
        description = format!("{description}, outcome {}", outcome.label());
    }

    SubScore::new(value, description)
}
