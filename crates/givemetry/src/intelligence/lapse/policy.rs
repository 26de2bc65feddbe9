use super::config::{ConfidencePolicy, LapseRiskConfig};
use super::history::HistorySummary;

const FALLBACK_WINDOW: &str = "18+ months";

/// Raises the composite to the configured floors when giving history is absent.
pub(crate) fn apply_floors(score: f64, summary: &HistorySummary, config: &LapseRiskConfig) -> f64 {
    let mut score = score;
    if !summary.has_contributions() {
        score = score.max(config.no_gift_floor);
        if summary.contact_count == 0 {
            score = score.max(config.no_history_floor);
        }
    }
    score.clamp(0.0, 1.0)
}

/// Confidence grows with observation volume and with how recent the newest record is.
pub(crate) fn confidence(summary: &HistorySummary, policy: &ConfidencePolicy) -> f64 {
    let volume = if policy.full_volume_records > 0.0 {
        (summary.record_count as f64 / policy.full_volume_records).min(1.0)
    } else {
        1.0
    };

    let freshness = match summary.months_since_latest_observation() {
        Some(months) if months <= policy.fresh_months => 1.0,
        Some(months) if months >= policy.stale_months => 0.0,
        Some(months) => {
            let span = (policy.stale_months - policy.fresh_months).max(f64::EPSILON);
            1.0 - (months - policy.fresh_months) / span
        }
        None => 0.0,
    };

    let raw = policy.base + policy.volume_weight * volume + policy.freshness_weight * freshness;
    raw.clamp(0.0, policy.ceiling.clamp(0.0, 1.0))
}

/// Highest configured window whose threshold the score reaches.
pub(crate) fn predicted_window(score: f64, config: &LapseRiskConfig) -> String {
    let mut bands: Vec<_> = config.windows.iter().collect();
    bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
    bands
        .into_iter()
        .find(|band| score >= band.min_score)
        .map(|band| band.label.clone())
        .unwrap_or_else(|| FALLBACK_WINDOW.to_string())
}
