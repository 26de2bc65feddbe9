use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::GiftRecord;
use super::temporal::{elapsed_months, FiscalCalendar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonorSegment {
    Prospect,
    NewDonor,
    OneTime,
    /// Gave last fiscal year but unfortunately not this one.
    Lybunt,
    /// Gave some year but unfortunately not this one or last.
    Sybunt,
    Upgrading,
    Downgrading,
    Consistent,
    Reactivated,
}

impl DonorSegment {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Prospect => "prospect",
            Self::NewDonor => "new_donor",
            Self::OneTime => "one_time",
            Self::Lybunt => "lybunt",
            Self::Sybunt => "sybunt",
            Self::Upgrading => "upgrading",
            Self::Downgrading => "downgrading",
            Self::Consistent => "consistent",
            Self::Reactivated => "reactivated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub new_donor_months: f64,
    /// Last year's total over the year before at or above this ratio is upgrading.
    pub upgrade_ratio: f64,
    pub downgrade_ratio: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            new_donor_months: 24.0,
            upgrade_ratio: 1.2,
            downgrade_ratio: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSummary {
    pub segment: DonorSegment,
    pub fiscal_year: i32,
    pub current_year_total: f64,
    pub last_year_total: f64,
    pub prior_year_total: f64,
}

pub fn classify_segment(
    gifts: &[GiftRecord],
    reference: NaiveDate,
    calendar: &FiscalCalendar,
    config: &SegmentConfig,
) -> SegmentSummary {
    let current_start = calendar.fiscal_year_start(reference);
    let last_start = calendar.previous_fiscal_year_start(reference);
    let prior_start = calendar.previous_fiscal_year_start(last_start);

    let mut current_year_total = 0.0;
    let mut last_year_total = 0.0;
    let mut prior_year_total = 0.0;
    let mut count = 0usize;
    let mut first_gift: Option<NaiveDate> = None;

    for gift in gifts
        .iter()
        .filter(|gift| gift.is_contribution() && gift.date <= reference)
    {
        count += 1;
        first_gift = Some(first_gift.map_or(gift.date, |first| first.min(gift.date)));
        if gift.date >= current_start {
            current_year_total += gift.amount;
        } else if gift.date >= last_start {
            last_year_total += gift.amount;
        } else if gift.date >= prior_start {
            prior_year_total += gift.amount;
        }
    }

    let gave_this_year = current_year_total > 0.0;
    let gave_last_year = last_year_total > 0.0;

    let segment = match first_gift {
        None => DonorSegment::Prospect,
        Some(first) if elapsed_months(first, reference) <= config.new_donor_months => {
            DonorSegment::NewDonor
        }
        Some(_) if count == 1 => DonorSegment::OneTime,
        Some(_) if gave_last_year && !gave_this_year => DonorSegment::Lybunt,
        Some(_) if !gave_last_year && !gave_this_year => DonorSegment::Sybunt,
        Some(_) if !gave_last_year => DonorSegment::Reactivated,
        Some(_) if prior_year_total > 0.0 => {
            let ratio = last_year_total / prior_year_total;
            if ratio >= config.upgrade_ratio {
                DonorSegment::Upgrading
            } else if ratio <= config.downgrade_ratio {
                DonorSegment::Downgrading
            } else {
                DonorSegment::Consistent
            }
        }
        Some(_) => DonorSegment::Consistent,
    };

    debug!(segment = segment.label(), gifts = count, "segment classified");

    SegmentSummary {
        segment,
        fiscal_year: calendar.fiscal_year(reference),
        current_year_total,
        last_year_total,
        prior_year_total,
    }
}
