use serde::{Deserialize, Serialize};

use crate::intelligence::lapse::RecencyCurve;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub capacity: f64,
    pub likelihood: f64,
    pub timing: f64,
    pub recency: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            capacity: 0.30,
            likelihood: 0.25,
            timing: 0.25,
            recency: 0.20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityBand {
    pub min_amount: f64,
    pub score: f64,
}

fn default_capacity_bands() -> Vec<CapacityBand> {
    [
        (1_000_000.0, 1.0),
        (500_000.0, 0.9),
        (250_000.0, 0.8),
        (100_000.0, 0.7),
        (50_000.0, 0.6),
        (25_000.0, 0.5),
        (10_000.0, 0.4),
    ]
    .into_iter()
    .map(|(min_amount, score)| CapacityBand { min_amount, score })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityPolicy {
    pub bands: Vec<CapacityBand>,
    pub below_bands_score: f64,
    pub unknown_score: f64,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            bands: default_capacity_bands(),
            below_bands_score: 0.3,
            unknown_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    pub near_year_end_days: i64,
    pub far_year_end_days: i64,
    pub far_year_end_score: f64,
    pub proximity_weight: f64,
    pub campaign_weight: f64,
    pub active_campaign_score: f64,
    pub inactive_campaign_score: f64,
    pub unknown_score: f64,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            near_year_end_days: 30,
            far_year_end_days: 180,
            far_year_end_score: 0.2,
            proximity_weight: 0.6,
            campaign_weight: 0.4,
            active_campaign_score: 1.0,
            inactive_campaign_score: 0.3,
            unknown_score: 0.5,
        }
    }
}

/// Per-organization tuning surface for outreach priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    pub weights: PriorityWeights,
    pub capacity: CapacityPolicy,
    pub timing: TimingPolicy,
    /// Inverted to score engagement recency.
    pub engagement_curve: RecencyCurve,
    /// Risk assumed when the supplied lapse risk is not a number.
    pub unknown_lapse_risk: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            weights: PriorityWeights::default(),
            capacity: CapacityPolicy::default(),
            timing: TimingPolicy::default(),
            engagement_curve: RecencyCurve::default(),
            unknown_lapse_risk: 0.5,
        }
    }
}
