use serde::{Deserialize, Serialize};

use super::health::HealthConfig;
use super::lapse::LapseRiskConfig;
use super::priority::PriorityConfig;
use super::segment::SegmentConfig;
use super::temporal::FiscalCalendar;

/// Every per-organization tuning knob, loadable from a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelligenceConfig {
    pub fiscal: FiscalCalendar,
    pub lapse: LapseRiskConfig,
    pub priority: PriorityConfig,
    pub health: HealthConfig,
    pub segments: SegmentConfig,
}

impl IntelligenceConfig {
    /// Parses a partial document; missing sections and keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.fiscal = FiscalCalendar::new(config.fiscal.start_month);
        Ok(config)
    }
}
