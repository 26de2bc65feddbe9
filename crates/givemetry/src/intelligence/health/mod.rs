mod config;
mod rules;

pub use config::{ConsistencyPolicy, CoveragePolicy, FreshnessPolicy, HealthConfig, HealthWeights};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{FactorImpact, FactorKind, ScoreFactor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstituentCounts {
    pub total: u64,
    pub with_name: u64,
    pub with_email: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GiftCounts {
    pub total: u64,
    pub with_amount: u64,
    pub with_date: u64,
    pub with_constituent: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactCounts {
    pub total: u64,
    pub with_date: u64,
    pub with_type: u64,
    pub with_constituent: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QualityCounts {
    pub invalid_emails: u64,
    pub duplicate_constituents: u64,
    pub invalid_gift_amounts: u64,
    pub future_dated_records: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoverageCounts {
    pub constituents_with_gifts: u64,
    pub constituents_with_contacts: u64,
}

/// Organization-wide record counts supplied by the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgAggregate {
    #[serde(default)]
    pub constituents: ConstituentCounts,
    #[serde(default)]
    pub gifts: GiftCounts,
    #[serde(default)]
    pub contacts: ContactCounts,
    #[serde(default)]
    pub quality: QualityCounts,
    #[serde(default)]
    pub coverage: CoverageCounts,
    #[serde(default)]
    pub last_gift_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_contact_date: Option<NaiveDate>,
    pub reference_date: NaiveDate,
}

impl OrgAggregate {
    /// An organization with no records, observed on `reference_date`.
    pub fn empty(reference_date: NaiveDate) -> Self {
        Self {
            constituents: ConstituentCounts::default(),
            gifts: GiftCounts::default(),
            contacts: ContactCounts::default(),
            quality: QualityCounts::default(),
            coverage: CoverageCounts::default(),
            last_gift_date: None,
            last_contact_date: None,
            reference_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthCategories {
    pub completeness: f64,
    pub freshness: f64,
    pub consistency: f64,
    pub coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTrend {
    Up,
    Down,
    Stable,
}

impl HealthTrend {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

/// The persisted part of a report, compared against on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub overall_score: f64,
    pub categories: HealthCategories,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub overall_score: f64,
    pub categories: HealthCategories,
    pub trend: HealthTrend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    pub factors: Vec<ScoreFactor>,
}

impl HealthReport {
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            overall_score: self.overall_score,
            categories: self.categories,
        }
    }
}

fn category_impact(value: f64) -> FactorImpact {
    if value < 0.5 {
        FactorImpact::High
    } else if value < 0.8 {
        FactorImpact::Medium
    } else {
        FactorImpact::Low
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthEngine {
    config: HealthConfig,
}

impl HealthEngine {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn score(
        &self,
        aggregate: &OrgAggregate,
        previous: Option<&HealthSnapshot>,
    ) -> HealthReport {
        let weights = &self.config.weights;
        let scored = [
            (
                FactorKind::Completeness,
                rules::completeness(aggregate),
                weights.completeness,
            ),
            (
                FactorKind::Freshness,
                rules::freshness(aggregate, &self.config.freshness),
                weights.freshness,
            ),
            (
                FactorKind::Consistency,
                rules::consistency(aggregate, &self.config.consistency),
                weights.consistency,
            ),
            (
                FactorKind::Coverage,
                rules::coverage(aggregate, &self.config.coverage),
                weights.coverage,
            ),
        ];

        let mut weighted_total = 0.0;
        let mut weight_sum = 0.0;
        let mut factors = Vec::with_capacity(scored.len());
        for (kind, category, weight) in &scored {
            let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            weighted_total += weight * category.value;
            weight_sum += weight;
            factors.push(ScoreFactor::new(
                *kind,
                category.description.clone(),
                category_impact(category.value),
            ));
        }

        let overall_score = if weight_sum > 0.0 {
            (weighted_total / weight_sum).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let [completeness, freshness, consistency, coverage] =
            scored.map(|(_, category, _)| category.value);
        let categories = HealthCategories {
            completeness,
            freshness,
            consistency,
            coverage,
        };

        let change = previous.map(|snapshot| overall_score - snapshot.overall_score);
        let tolerance = self.config.trend_tolerance.abs();
        let trend = match change {
            Some(delta) if delta > tolerance => HealthTrend::Up,
            Some(delta) if delta < -tolerance => HealthTrend::Down,
            _ => HealthTrend::Stable,
        };

        debug!(overall_score, trend = trend.label(), "data health computed");

        HealthReport {
            overall_score,
            categories,
            trend,
            change,
            factors,
        }
    }
}

/// Data health with the default configuration.
pub fn compute_health_scores(
    aggregate: &OrgAggregate,
    previous: Option<&HealthSnapshot>,
) -> HealthReport {
    HealthEngine::default().score(aggregate, previous)
}
