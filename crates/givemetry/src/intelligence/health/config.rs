use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthWeights {
    pub completeness: f64,
    pub freshness: f64,
    pub consistency: f64,
    pub coverage: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            completeness: 0.30,
            freshness: 0.25,
            consistency: 0.25,
            coverage: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessPolicy {
    pub gift_horizon_months: f64,
    pub contact_horizon_months: f64,
    pub gift_weight: f64,
    pub contact_weight: f64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            gift_horizon_months: 24.0,
            contact_horizon_months: 12.0,
            gift_weight: 0.6,
            contact_weight: 0.4,
        }
    }
}

/// Error rate at which each consistency check bottoms out at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyPolicy {
    pub invalid_email_tolerance: f64,
    pub duplicate_tolerance: f64,
    pub invalid_amount_tolerance: f64,
    pub future_date_tolerance: f64,
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self {
            invalid_email_tolerance: 0.10,
            duplicate_tolerance: 0.05,
            invalid_amount_tolerance: 0.05,
            future_date_tolerance: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoveragePolicy {
    pub breadth_weight: f64,
    pub linkage_weight: f64,
}

impl Default for CoveragePolicy {
    fn default() -> Self {
        Self {
            breadth_weight: 0.4,
            linkage_weight: 0.6,
        }
    }
}

/// Per-organization tuning surface for data health scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub weights: HealthWeights,
    pub freshness: FreshnessPolicy,
    pub consistency: ConsistencyPolicy,
    pub coverage: CoveragePolicy,
    /// Overall change smaller than this is reported as a stable trend.
    pub trend_tolerance: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            weights: HealthWeights::default(),
            freshness: FreshnessPolicy::default(),
            consistency: ConsistencyPolicy::default(),
            coverage: CoveragePolicy::default(),
            trend_tolerance: 0.02,
        }
    }
}
