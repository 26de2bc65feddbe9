use chrono::NaiveDate;

use super::config::{CapacityPolicy, PriorityConfig, TimingPolicy};
use super::{PriorityInput, TimingInput};
use crate::intelligence::domain::{format_amount, percent, unit_interval, FactorKind};
use crate::intelligence::temporal::{describe_months, elapsed_months};

/// A sub-score in [0, 1] (1 = strongest reason to reach out now).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Signal {
    pub kind: FactorKind,
    pub value: f64,
    pub description: String,
    /// False when the value is a neutral default standing in for missing input.
    pub observed: bool,
}

pub(crate) fn signals(
    input: &PriorityInput,
    reference: NaiveDate,
    config: &PriorityConfig,
) -> [(Signal, f64); 4] {
    let weights = &config.weights;
    [
        (
            capacity_signal(input.capacity_estimate, &config.capacity),
            weights.capacity,
        ),
        (likelihood_signal(input.lapse_risk, config), weights.likelihood),
        (timing_signal(&input.timing, &config.timing), weights.timing),
        (recency_signal(input, reference, config), weights.recency),
    ]
}

pub(crate) fn capacity_signal(estimate: Option<f64>, policy: &CapacityPolicy) -> Signal {
    let Some(amount) = estimate.filter(|amount| amount.is_finite()) else {
        return Signal {
            kind: FactorKind::Capacity,
            value: unit_interval(policy.unknown_score, 0.5),
            description: "capacity not yet rated".to_string(),
            observed: false,
        };
    };

    let mut bands = policy.bands.clone();
    bands.sort_by(|a, b| b.min_amount.total_cmp(&a.min_amount));
    let value = bands
        .iter()
        .find(|band| amount >= band.min_amount)
        .map(|band| band.score)
        .unwrap_or(policy.below_bands_score);

    Signal {
        kind: FactorKind::Capacity,
        value: unit_interval(value, 0.5),
        description: format!("{} estimated capacity", format_amount(amount)),
        observed: true,
    }
}

fn likelihood_signal(lapse_risk: Option<f64>, config: &PriorityConfig) -> Signal {
    let observed = lapse_risk.filter(|risk| risk.is_finite());
    let risk = match observed {
        Some(risk) => risk.clamp(0.0, 1.0),
        None => unit_interval(config.unknown_lapse_risk, 0.5),
    };
    let value = 1.0 - risk;
    Signal {
        kind: FactorKind::Likelihood,
        value,
        description: format!("{} likelihood of continued giving", percent(value)),
        observed: observed.is_some(),
    }
}

pub(crate) fn timing_signal(timing: &TimingInput, policy: &TimingPolicy) -> Signal {
    let mut parts = Vec::new();
    let mut weighted = 0.0;
    let mut weight_sum = 0.0;

    if let Some(days) = timing.days_to_fiscal_year_end {
        let days = days.max(0);
        let proximity = if days <= policy.near_year_end_days {
            1.0
        } else if days >= policy.far_year_end_days {
            policy.far_year_end_score
        } else {
            let span = (policy.far_year_end_days - policy.near_year_end_days).max(1) as f64;
            let progress = (days - policy.near_year_end_days) as f64 / span;
            1.0 - progress * (1.0 - policy.far_year_end_score)
        };
        weighted += policy.proximity_weight * proximity;
        weight_sum += policy.proximity_weight;
        parts.push(format!("{days} days to fiscal year-end"));
    }

    if let Some(active) = timing.active_campaign {
        let score = if active {
            policy.active_campaign_score
        } else {
            policy.inactive_campaign_score
        };
        weighted += policy.campaign_weight * score;
        weight_sum += policy.campaign_weight;
        parts.push(if active {
            "active campaign".to_string()
        } else {
            "no active campaign".to_string()
        });
    }

    if weight_sum <= 0.0 {
        return Signal {
            kind: FactorKind::Timing,
            value: unit_interval(policy.unknown_score, 0.5),
            description: "no timing signal available".to_string(),
            observed: false,
        };
    }

    Signal {
        kind: FactorKind::Timing,
        value: unit_interval(weighted / weight_sum, 0.5),
        description: parts.join("; "),
        observed: true,
    }
}

fn recency_signal(input: &PriorityInput, reference: NaiveDate, config: &PriorityConfig) -> Signal {
    match input.last_engagement.most_recent() {
        Some(date) => {
            let months = elapsed_months(date, reference);
            Signal {
                kind: FactorKind::Engagement,
                value: 1.0 - config.engagement_curve.risk_at(months),
                description: describe_months(months, "since last engagement"),
                observed: true,
            }
        }
        None => Signal {
            kind: FactorKind::Engagement,
            value: 0.0,
            description: "no recorded engagement".to_string(),
            observed: false,
        },
    }
}
