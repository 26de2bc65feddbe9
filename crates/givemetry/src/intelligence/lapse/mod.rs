mod config;
mod history;
mod policy;
mod rules;

pub use config::{
    ConfidencePolicy, ContactPolicy, CurvePoint, FrequencyPolicy, LapseRiskConfig, LapseWeights,
    LapseWindowBand, MonetaryPolicy, RecencyCurve,
};

use chrono::NaiveDate;
use tracing::debug;

use super::domain::{ContactRecord, FactorImpact, GiftRecord, RiskLevel, RiskResult, ScoreFactor};
use history::HistorySummary;

/// Stateless evaluator applying a lapse configuration to giving and contact history.
#[derive(Debug, Clone, Default)]
pub struct LapseRiskEngine {
    config: LapseRiskConfig,
}

impl LapseRiskEngine {
    pub fn new(config: LapseRiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LapseRiskConfig {
        &self.config
    }

    pub fn score(
        &self,
        gifts: &[GiftRecord],
        contacts: &[ContactRecord],
        reference: NaiveDate,
    ) -> RiskResult {
        let summary = HistorySummary::from_history(gifts, contacts, reference);
        let table = rules::rule_table(&self.config);

        let mut weighted_total = 0.0;
        let mut weight_sum = 0.0;
        let mut factors = Vec::with_capacity(table.len());
        for rule in &table {
            let sub_score = (rule.score)(&summary, &self.config);
            let weight = if rule.weight.is_finite() {
                rule.weight.max(0.0)
            } else {
                0.0
            };
            weighted_total += weight * sub_score.value;
            weight_sum += weight;
            factors.push(ScoreFactor::new(
                rule.kind,
                sub_score.description,
                FactorImpact::for_signal(sub_score.value),
            ));
        }

        let composite = if weight_sum > 0.0 {
            weighted_total / weight_sum
        } else {
            1.0
        };
        let score = policy::apply_floors(composite, &summary, &self.config);
        let risk_level = RiskLevel::from_score(score);
        let confidence = policy::confidence(&summary, &self.config.confidence);
        let predicted_lapse_window = policy::predicted_window(score, &self.config);

        debug!(
            score,
            confidence,
            risk_level = risk_level.label(),
            gifts = summary.contribution_count,
            contacts = summary.contact_count,
            "lapse risk computed"
        );

        RiskResult {
            score,
            risk_level,
            confidence,
            predicted_lapse_window,
            factors,
        }
    }
}

/// Lapse risk with the default configuration.
pub fn compute_lapse_risk(
    gifts: &[GiftRecord],
    contacts: &[ContactRecord],
    reference: NaiveDate,
) -> RiskResult {
    LapseRiskEngine::default().score(gifts, contacts, reference)
}
