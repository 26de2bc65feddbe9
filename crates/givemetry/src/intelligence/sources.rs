use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ConstituentId, DonorHistory};
use super::priority::TimingInput;
use super::temporal::FiscalCalendar;

/// Read path over the organization's donor records.
pub trait DonorDirectory: Send + Sync {
    fn constituent_ids(&self) -> Result<Vec<ConstituentId>, DirectoryError>;
    fn history(&self, id: &ConstituentId) -> Result<DonorHistory, DirectoryError>;
    /// `Ok(None)` when the constituent exists but has not been rated.
    fn capacity_estimate(&self, id: &ConstituentId) -> Result<Option<f64>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("constituent {0} not found")]
    NotFound(ConstituentId),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Institutional timing signals for priority scoring.
pub trait TimingSignalSource: Send + Sync {
    fn timing(&self, reference: NaiveDate) -> TimingInput;
}

impl TimingSignalSource for FiscalCalendar {
    fn timing(&self, reference: NaiveDate) -> TimingInput {
        TimingInput::from_calendar(self, reference, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

impl Campaign {
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }
}

/// Fiscal calendar plus the organization's scheduled campaigns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCalendar {
    #[serde(default)]
    pub fiscal: FiscalCalendar,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
}

impl CampaignCalendar {
    pub fn new(fiscal: FiscalCalendar, campaigns: Vec<Campaign>) -> Self {
        Self { fiscal, campaigns }
    }

    pub fn active_campaign(&self, date: NaiveDate) -> Option<&Campaign> {
        self.campaigns.iter().find(|campaign| campaign.is_active(date))
    }
}

impl TimingSignalSource for CampaignCalendar {
    fn timing(&self, reference: NaiveDate) -> TimingInput {
        TimingInput::from_calendar(
            &self.fiscal,
            reference,
            Some(self.active_campaign(reference).is_some()),
        )
    }
}
