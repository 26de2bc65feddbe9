use serde::{Deserialize, Serialize};

/// Breakpoint on a piecewise-linear recency curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub months: f64,
    pub risk: f64,
}

/// Monotonic saturation curve mapping months of silence to risk in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecencyCurve {
    pub points: Vec<CurvePoint>,
}

impl Default for RecencyCurve {
    fn default() -> Self {
        Self {
            points: vec![
                CurvePoint {
                    months: 0.0,
                    risk: 0.0,
                },
                CurvePoint {
                    months: 12.0,
                    risk: 0.40,
                },
                CurvePoint {
                    months: 24.0,
                    risk: 0.75,
                },
                CurvePoint {
                    months: 36.0,
                    risk: 1.0,
                },
            ],
        }
    }
}

impl RecencyCurve {
    /// Risk for a month gap. Values beyond the last breakpoint stay at its risk.
    pub fn risk_at(&self, months: f64) -> f64 {
        let mut points: Vec<CurvePoint> = self
            .points
            .iter()
            .copied()
            .filter(|point| point.months.is_finite() && point.risk.is_finite())
            .collect();
        if points.is_empty() {
            return Self::default().risk_at(months);
        }
        points.sort_by(|a, b| a.months.total_cmp(&b.months));

        let months = if months.is_nan() { 0.0 } else { months.max(0.0) };
        let mut risk = points[0].risk.clamp(0.0, 1.0);
        let mut previous = points[0];
        for point in points.iter().skip(1) {
            if months <= point.months {
                let span = point.months - previous.months;
                let interpolated = if span > 0.0 {
                    let progress = (months - previous.months) / span;
                    previous.risk + (point.risk - previous.risk) * progress
                } else {
                    point.risk
                };
                // Rounding must not overshoot the segment's endpoints.
                let bounded = interpolated
                    .clamp(previous.risk.min(point.risk), previous.risk.max(point.risk));
                return bounded.max(risk).clamp(0.0, 1.0);
            }
            risk = risk.max(point.risk.clamp(0.0, 1.0));
            previous = *point;
        }
        risk
    }
}

/// Raw factor weights; the engine divides by their sum before averaging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapseWeights {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
    pub contact: f64,
}

impl Default for LapseWeights {
    fn default() -> Self {
        Self {
            recency: 0.30,
            frequency: 0.25,
            monetary: 0.20,
            contact: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyPolicy {
    pub minimum_cadence_days: f64,
    pub single_gift_cadence_months: f64,
    /// Gap-to-cadence ratio at which frequency risk starts rising.
    pub tolerance_ratio: f64,
    /// Gap-to-cadence ratio at which frequency risk saturates.
    pub saturation_ratio: f64,
}

impl Default for FrequencyPolicy {
    fn default() -> Self {
        Self {
            minimum_cadence_days: 30.0,
            single_gift_cadence_months: 12.0,
            tolerance_ratio: 1.0,
            saturation_ratio: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonetaryPolicy {
    pub single_gift_score: f64,
    /// Share of the amount drop that counts even when only the latest step declined.
    pub isolated_decline_weight: f64,
}

impl Default for MonetaryPolicy {
    fn default() -> Self {
        Self {
            single_gift_score: 0.3,
            isolated_decline_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPolicy {
    pub saturation_months: f64,
    pub missing_contact_score: f64,
    pub unfavorable_outcome_penalty: f64,
}

impl Default for ContactPolicy {
    fn default() -> Self {
        Self {
            saturation_months: 15.0,
            missing_contact_score: 0.6,
            unfavorable_outcome_penalty: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub base: f64,
    pub volume_weight: f64,
    pub freshness_weight: f64,
    pub ceiling: f64,
    pub full_volume_records: f64,
    pub fresh_months: f64,
    pub stale_months: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            base: 0.20,
            volume_weight: 0.45,
            freshness_weight: 0.30,
            ceiling: 0.95,
            full_volume_records: 12.0,
            fresh_months: 12.0,
            stale_months: 36.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapseWindowBand {
    pub min_score: f64,
    pub label: String,
}

fn default_windows() -> Vec<LapseWindowBand> {
    [
        (0.85, "1-3 months"),
        (0.70, "3-6 months"),
        (0.55, "6-12 months"),
        (0.40, "12-18 months"),
        (0.0, "18+ months"),
    ]
    .into_iter()
    .map(|(min_score, label)| LapseWindowBand {
        min_score,
        label: label.to_string(),
    })
    .collect()
}

/// Per-organization tuning surface for the lapse risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapseRiskConfig {
    pub weights: LapseWeights,
    pub recency_curve: RecencyCurve,
    pub frequency: FrequencyPolicy,
    pub monetary: MonetaryPolicy,
    pub contact: ContactPolicy,
    pub confidence: ConfidencePolicy,
    /// Minimum score when no contribution is on record.
    pub no_gift_floor: f64,
    /// Minimum score when neither gifts nor contacts are on record.
    pub no_history_floor: f64,
    pub windows: Vec<LapseWindowBand>,
}

impl Default for LapseRiskConfig {
    fn default() -> Self {
        Self {
            weights: LapseWeights::default(),
            recency_curve: RecencyCurve::default(),
            frequency: FrequencyPolicy::default(),
            monetary: MonetaryPolicy::default(),
            contact: ContactPolicy::default(),
            confidence: ConfidencePolicy::default(),
            no_gift_floor: 0.75,
            no_history_floor: 0.90,
            windows: default_windows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_curve_saturates_at_three_years() {
        let curve = RecencyCurve::default();
        assert_eq!(curve.risk_at(0.0), 0.0);
        assert!((curve.risk_at(6.0) - 0.2).abs() < 1e-9);
        assert!((curve.risk_at(18.0) - 0.575).abs() < 1e-9);
        assert_eq!(curve.risk_at(36.0), 1.0);
        assert_eq!(curve.risk_at(120.0), 1.0);
    }

    fn point(months: f64, risk: f64) -> CurvePoint {
        CurvePoint { months, risk }
    }

    #[test]
    fn curve_is_monotonic_even_when_configured_out_of_order() {
        let curve = RecencyCurve {
            points: vec![point(24.0, 0.9), point(0.0, 0.1), point(12.0, 0.5)],
        };
        let mut last = 0.0;
        for month in 0..48 {
            let risk = curve.risk_at(f64::from(month));
            assert!(risk >= last, "curve dipped at month {month}");
            last = risk;
        }
    }

    #[test]
    fn last_breakpoint_matches_the_plateau_exactly() {
        let curve = RecencyCurve {
            points: vec![point(0.0, 0.1), point(12.0, 0.5), point(24.0, 0.9)],
        };
        let at_breakpoint = curve.risk_at(24.0);
        assert_eq!(at_breakpoint.to_bits(), curve.risk_at(24.5).to_bits());
        assert_eq!(at_breakpoint, 0.9);
        assert!(curve.risk_at(23.999) <= at_breakpoint);
    }

    #[test]
    fn config_deserializes_partial_overrides() {
        let config: LapseRiskConfig =
            serde_json::from_str(r#"{"weights": {"recency": 0.5}}"#).expect("parses");
        assert_eq!(config.weights.recency, 0.5);
        assert_eq!(config.weights.frequency, 0.25);
        assert_eq!(config.windows.len(), 5);
    }
}
