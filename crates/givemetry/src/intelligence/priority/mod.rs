mod config;
mod rules;

pub use config::{CapacityBand, CapacityPolicy, PriorityConfig, PriorityWeights, TimingPolicy};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    FactorImpact, FactorKind, LastEngagement, PriorityResult, PriorityTier, ScoreFactor,
};
use super::temporal::FiscalCalendar;

const BASE_CONFIDENCE: f64 = 0.4;
const SIGNAL_CONFIDENCE_STEP: f64 = 0.2;

/// Institutional timing signals; any field may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingInput {
    #[serde(default)]
    pub days_to_fiscal_year_end: Option<i64>,
    #[serde(default)]
    pub active_campaign: Option<bool>,
}

impl TimingInput {
    pub fn from_calendar(
        calendar: &FiscalCalendar,
        reference: NaiveDate,
        active_campaign: Option<bool>,
    ) -> Self {
        Self {
            days_to_fiscal_year_end: Some(calendar.days_until_fiscal_year_end(reference)),
            active_campaign,
        }
    }
}

/// Inputs to the priority formula. `lapse_risk` must come from a fresh lapse assessment;
/// a missing or non-finite risk falls back to the configured neutral risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityInput {
    #[serde(default)]
    pub capacity_estimate: Option<f64>,
    #[serde(default)]
    pub lapse_risk: Option<f64>,
    #[serde(default)]
    pub timing: TimingInput,
    #[serde(default)]
    pub last_engagement: LastEngagement,
}

#[derive(Debug, Clone, Default)]
pub struct PriorityEngine {
    config: PriorityConfig,
}

impl PriorityEngine {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PriorityConfig {
        &self.config
    }

    pub fn score(&self, input: &PriorityInput, reference: NaiveDate) -> PriorityResult {
        let signals = rules::signals(input, reference, &self.config);

        let mut weighted_total = 0.0;
        let mut weight_sum = 0.0;
        let mut factors = Vec::with_capacity(signals.len());
        for (signal, weight) in &signals {
            let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            weighted_total += weight * signal.value;
            weight_sum += weight;
            factors.push(ScoreFactor::new(
                signal.kind,
                signal.description.clone(),
                FactorImpact::for_signal(signal.value),
            ));
        }

        let score = if weight_sum > 0.0 {
            (weighted_total / weight_sum).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let known = signals
            .iter()
            .filter(|(signal, _)| signal.kind != FactorKind::Likelihood && signal.observed)
            .count();
        let confidence = (BASE_CONFIDENCE + SIGNAL_CONFIDENCE_STEP * known as f64).min(1.0);
        let tier = PriorityTier::from_score(score);

        debug!(score, confidence, tier = tier.label(), "priority computed");

        PriorityResult {
            score,
            tier,
            confidence,
            factors,
        }
    }
}

/// Priority with the default configuration.
pub fn compute_priority(
    capacity_estimate: Option<f64>,
    lapse_risk: f64,
    timing: TimingInput,
    last_engagement: LastEngagement,
    reference: NaiveDate,
) -> PriorityResult {
    let input = PriorityInput {
        capacity_estimate,
        lapse_risk: Some(lapse_risk),
        timing,
        last_engagement,
    };
    PriorityEngine::default().score(&input, reference)
}
