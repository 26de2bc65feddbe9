//! Donor intelligence scoring: lapse risk, outreach priority, organization data health,
//! segmentation and structured-search translation.
//!
//! Every model is a pure function of its inputs plus a caller-supplied reference date.
//! [`DonorIntelligence`] bundles the per-organization configuration and couples the
//! models the way the service layer consumes them.

pub mod config;
pub mod domain;
pub mod health;
pub mod lapse;
pub mod priority;
pub mod query;
pub mod router;
pub mod segment;
pub mod sources;
pub mod temporal;

#[cfg(test)]
mod tests;

pub use config::IntelligenceConfig;
pub use domain::{
    ConstituentId, ContactOutcome, ContactRecord, ContactType, DonorHistory, FactorImpact,
    FactorKind, GiftRecord, LastEngagement, PriorityResult, PriorityTier, RiskLevel, RiskResult,
    ScoreFactor,
};
pub use health::{compute_health_scores, HealthEngine, HealthReport, HealthSnapshot, OrgAggregate};
pub use lapse::{compute_lapse_risk, LapseRiskConfig, LapseRiskEngine};
pub use priority::{compute_priority, PriorityConfig, PriorityEngine, PriorityInput, TimingInput};
pub use query::{translate_query, QueryError, QueryFilter, QueryIntent, QueryPlan, QueryTranslator};
pub use router::scoring_router;
pub use segment::{classify_segment, DonorSegment, SegmentConfig, SegmentSummary};
pub use sources::{CampaignCalendar, DirectoryError, DonorDirectory, TimingSignalSource};
pub use temporal::FiscalCalendar;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Lapse, priority and segment for one constituent, computed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorAssessment {
    pub lapse: RiskResult,
    pub priority: PriorityResult,
    pub segment: SegmentSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDonor {
    pub rank: usize,
    pub constituent_id: ConstituentId,
    #[serde(flatten)]
    pub assessment: DonorAssessment,
}

/// Per-organization entry point over every model.
#[derive(Debug, Clone, Default)]
pub struct DonorIntelligence {
    fiscal: FiscalCalendar,
    segments: SegmentConfig,
    lapse: LapseRiskEngine,
    priority: PriorityEngine,
    health: HealthEngine,
    translator: QueryTranslator,
}

impl DonorIntelligence {
    pub fn new(config: IntelligenceConfig) -> Self {
        let IntelligenceConfig {
            fiscal,
            lapse,
            priority,
            health,
            segments,
        } = config;
        Self {
            fiscal,
            segments,
            lapse: LapseRiskEngine::new(lapse),
            priority: PriorityEngine::new(priority),
            health: HealthEngine::new(health),
            translator: QueryTranslator::new(fiscal),
        }
    }

    pub fn fiscal_calendar(&self) -> &FiscalCalendar {
        &self.fiscal
    }

    pub fn lapse_risk(&self, history: &DonorHistory, reference: NaiveDate) -> RiskResult {
        self.lapse.score(&history.gifts, &history.contacts, reference)
    }

    pub fn priority(&self, input: &PriorityInput, reference: NaiveDate) -> PriorityResult {
        self.priority.score(input, reference)
    }

    pub fn segment(&self, gifts: &[GiftRecord], reference: NaiveDate) -> SegmentSummary {
        classify_segment(gifts, reference, &self.fiscal, &self.segments)
    }

    /// Scores lapse risk and feeds it straight into priority; nothing is cached between calls.
    pub fn assess(
        &self,
        history: &DonorHistory,
        capacity_estimate: Option<f64>,
        timing: TimingInput,
        reference: NaiveDate,
    ) -> DonorAssessment {
        let lapse = self.lapse_risk(history, reference);
        let input = PriorityInput {
            capacity_estimate,
            lapse_risk: Some(lapse.score),
            timing,
            last_engagement: history.last_engagement(),
        };
        let priority = self.priority(&input, reference);
        let segment = self.segment(&history.gifts, reference);
        DonorAssessment {
            lapse,
            priority,
            segment,
        }
    }

    /// Assesses every constituent in `directory`, ordered by priority (desc), then lapse
    /// risk (desc), then constituent id.
    pub fn assess_portfolio<D, T>(
        &self,
        directory: &D,
        timing: &T,
        reference: NaiveDate,
    ) -> Result<Vec<RankedDonor>, DirectoryError>
    where
        D: DonorDirectory + ?Sized,
        T: TimingSignalSource + ?Sized,
    {
        let signals = timing.timing(reference);
        let mut assessed = Vec::new();
        for id in directory.constituent_ids()? {
            let history = directory.history(&id)?;
            let capacity = directory.capacity_estimate(&id)?;
            let assessment = self.assess(&history, capacity, signals, reference);
            assessed.push((id, assessment));
        }

        assessed.sort_by(|(left_id, left), (right_id, right)| {
            right
                .priority
                .score
                .total_cmp(&left.priority.score)
                .then_with(|| right.lapse.score.total_cmp(&left.lapse.score))
                .then_with(|| left_id.cmp(right_id))
        });

        info!(constituents = assessed.len(), %reference, "portfolio assessed");

        Ok(assessed
            .into_iter()
            .enumerate()
            .map(|(index, (constituent_id, assessment))| RankedDonor {
                rank: index + 1,
                constituent_id,
                assessment,
            })
            .collect())
    }

    pub fn data_health(
        &self,
        aggregate: &OrgAggregate,
        previous: Option<&HealthSnapshot>,
    ) -> HealthReport {
        self.health.score(aggregate, previous)
    }

    pub fn translate(
        &self,
        intent: &QueryIntent,
        tenant: &str,
        reference: NaiveDate,
    ) -> Result<QueryPlan, QueryError> {
        self.translator.translate(intent, tenant, reference)
    }
}
