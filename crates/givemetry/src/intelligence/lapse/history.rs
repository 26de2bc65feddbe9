use chrono::NaiveDate;

use crate::intelligence::domain::{ContactOutcome, ContactRecord, ContactType, GiftRecord};
use crate::intelligence::temporal::{days_between, elapsed_months};

/// Direction of the amount sequence, oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AmountTrend {
    pub prior_mean: f64,
    pub latest: f64,
    pub declining_steps: usize,
    pub steps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LatestContact {
    pub date: NaiveDate,
    pub contact_type: ContactType,
    pub outcome: Option<ContactOutcome>,
}

/// Aggregates computed once per history and shared by every sub-score.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistorySummary {
    pub reference: NaiveDate,
    pub contribution_count: usize,
    pub record_count: usize,
    pub first_gift: Option<NaiveDate>,
    pub last_gift: Option<NaiveDate>,
    pub last_gift_amount: Option<f64>,
    pub mean_interval_days: Option<f64>,
    pub trend: Option<AmountTrend>,
    pub contact_count: usize,
    pub latest_contact: Option<LatestContact>,
    pub latest_observation: Option<NaiveDate>,
}

impl HistorySummary {
    pub fn from_history(
        gifts: &[GiftRecord],
        contacts: &[ContactRecord],
        reference: NaiveDate,
    ) -> Self {
        let mut contributions: Vec<&GiftRecord> =
            gifts.iter().filter(|gift| gift.is_contribution()).collect();
        contributions.sort_by_key(|gift| gift.date);

        let mut interval_days_total: i64 = 0;
        let mut declining_steps = 0;
        let mut prior_total = 0.0;
        let mut previous: Option<&GiftRecord> = None;
        for gift in contributions.iter().copied() {
            if let Some(prev) = previous {
                interval_days_total += days_between(prev.date, gift.date);
                if gift.amount < prev.amount {
                    declining_steps += 1;
                }
                prior_total += prev.amount;
            }
            previous = Some(gift);
        }

        let contribution_count = contributions.len();
        let steps = contribution_count.saturating_sub(1);
        let mean_interval_days =
            (steps > 0).then(|| interval_days_total as f64 / steps as f64);
        let trend = match contributions.last() {
            Some(latest) if steps > 0 => Some(AmountTrend {
                prior_mean: prior_total / steps as f64,
                latest: latest.amount,
                declining_steps,
                steps,
            }),
            _ => None,
        };

        let mut latest_contact: Option<LatestContact> = None;
        for contact in contacts {
            let newer = latest_contact
                .map(|current| contact.date >= current.date)
                .unwrap_or(true);
            if newer {
                latest_contact = Some(LatestContact {
                    date: contact.date,
                    contact_type: contact.contact_type,
                    outcome: contact.outcome,
                });
            }
        }

        let latest_observation = gifts
            .iter()
            .map(|gift| gift.date)
            .chain(contacts.iter().map(|contact| contact.date))
            .max();

        Self {
            reference,
            contribution_count,
            record_count: gifts.len() + contacts.len(),
            first_gift: contributions.first().map(|gift| gift.date),
            last_gift: contributions.last().map(|gift| gift.date),
            last_gift_amount: contributions.last().map(|gift| gift.amount),
            mean_interval_days,
            trend,
            contact_count: contacts.len(),
            latest_contact,
            latest_observation,
        }
    }

    pub fn has_contributions(&self) -> bool {
        self.contribution_count > 0
    }

    pub fn months_since_last_gift(&self) -> Option<f64> {
        self.last_gift
            .map(|date| elapsed_months(date, self.reference))
    }

    pub fn months_since_last_contact(&self) -> Option<f64> {
        self.latest_contact
            .map(|contact| elapsed_months(contact.date, self.reference))
    }

    pub fn months_since_latest_observation(&self) -> Option<f64> {
        self.latest_observation
            .map(|date| elapsed_months(date, self.reference))
    }
}
