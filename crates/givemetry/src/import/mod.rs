//! Reader for the advancement office's constituent, gift and contact CSV exports.

mod parser;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::intelligence::domain::{
    ConstituentId, ContactOutcome, ContactRecord, ContactType, DonorHistory, GiftRecord,
};
use crate::intelligence::health::{
    ConstituentCounts, ContactCounts, CoverageCounts, GiftCounts, OrgAggregate, QualityCounts,
};
use crate::intelligence::sources::{DirectoryError, DonorDirectory};

use parser::{
    is_plausible_email, parse_amount, parse_date, parse_rows, ConstituentRow, ContactRow, GiftRow,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open export {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {export} CSV data: {source}")]
    Csv {
        export: &'static str,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstituentProfile {
    pub id: ConstituentId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub estimated_capacity: Option<f64>,
    pub constituent_type: Option<String>,
    pub class_year: Option<i32>,
    pub school_college: Option<String>,
    pub assigned_officer_id: Option<String>,
}

impl ConstituentProfile {
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.to_string()),
            (None, None) => None,
        }
    }
}

/// A gift row as exported; any cell may be missing or unparseable.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftEntry {
    pub constituent_id: Option<ConstituentId>,
    pub amount: Option<f64>,
    /// The amount cell was present but not a number.
    pub amount_unreadable: bool,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactEntry {
    pub constituent_id: Option<ConstituentId>,
    pub date: Option<NaiveDate>,
    pub contact_type: Option<ContactType>,
    pub outcome: Option<ContactOutcome>,
}

/// One organization's exports, indexed per constituent.
#[derive(Debug, Clone, Default)]
pub struct DonorDataset {
    constituents: Vec<ConstituentProfile>,
    gifts: Vec<GiftEntry>,
    contacts: Vec<ContactEntry>,
    profiles: BTreeMap<ConstituentId, usize>,
    histories: HashMap<ConstituentId, DonorHistory>,
}

impl DonorDataset {
    pub fn from_paths(
        constituents: &Path,
        gifts: &Path,
        contacts: &Path,
    ) -> Result<Self, ImportError> {
        Self::from_readers(open(constituents)?, open(gifts)?, open(contacts)?)
    }

    pub fn from_readers<C, G, T>(
        constituents: C,
        gifts: G,
        contacts: T,
    ) -> Result<Self, ImportError>
    where
        C: Read,
        G: Read,
        T: Read,
    {
        let constituent_rows: Vec<ConstituentRow> =
            parse_rows(constituents).map_err(|source| ImportError::Csv {
                export: "constituent",
                source,
            })?;
        let gift_rows: Vec<GiftRow> = parse_rows(gifts).map_err(|source| ImportError::Csv {
            export: "gift",
            source,
        })?;
        let contact_rows: Vec<ContactRow> =
            parse_rows(contacts).map_err(|source| ImportError::Csv {
                export: "contact",
                source,
            })?;

        let constituents = constituent_rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let profile = profile_from_row(row);
                if profile.is_none() {
                    warn!(row = index + 2, "skipping constituent without an id");
                }
                profile
            })
            .collect();
        let gifts = gift_rows.into_iter().map(gift_from_row).collect();
        let contacts = contact_rows.into_iter().map(contact_from_row).collect();

        let dataset = Self::from_records(constituents, gifts, contacts);
        info!(
            constituents = dataset.constituents.len(),
            gifts = dataset.gifts.len(),
            contacts = dataset.contacts.len(),
            "donor exports loaded"
        );
        Ok(dataset)
    }

    pub fn from_records(
        constituents: Vec<ConstituentProfile>,
        gifts: Vec<GiftEntry>,
        contacts: Vec<ContactEntry>,
    ) -> Self {
        let mut profiles = BTreeMap::new();
        for (index, profile) in constituents.iter().enumerate() {
            profiles.entry(profile.id.clone()).or_insert(index);
        }

        let mut histories: HashMap<ConstituentId, DonorHistory> = profiles
            .keys()
            .map(|id| (id.clone(), DonorHistory::default()))
            .collect();
        for gift in &gifts {
            let (Some(id), Some(amount), Some(date)) =
                (&gift.constituent_id, gift.amount, gift.date)
            else {
                continue;
            };
            if let Some(history) = histories.get_mut(id) {
                history.gifts.push(GiftRecord::new(amount, date));
            }
        }
        for contact in &contacts {
            let (Some(id), Some(date)) = (&contact.constituent_id, contact.date) else {
                continue;
            };
            if let Some(history) = histories.get_mut(id) {
                history.contacts.push(ContactRecord::new(
                    date,
                    contact.contact_type.unwrap_or(ContactType::Other),
                    contact.outcome,
                ));
            }
        }

        Self {
            constituents,
            gifts,
            contacts,
            profiles,
            histories,
        }
    }

    pub fn constituents(&self) -> &[ConstituentProfile] {
        &self.constituents
    }

    pub fn gifts(&self) -> &[GiftEntry] {
        &self.gifts
    }

    pub fn contacts(&self) -> &[ContactEntry] {
        &self.contacts
    }

    pub fn profile(&self, id: &ConstituentId) -> Option<&ConstituentProfile> {
        self.profiles
            .get(id)
            .and_then(|index| self.constituents.get(*index))
    }

    /// Organization-wide counts for data health scoring as of `reference`.
    pub fn to_aggregate(&self, reference: NaiveDate) -> OrgAggregate {
        let known = |id: &Option<ConstituentId>| {
            id.as_ref().is_some_and(|id| self.profiles.contains_key(id))
        };

        let constituents = ConstituentCounts {
            total: self.constituents.len() as u64,
            with_name: count(&self.constituents, |profile| profile.display_name().is_some()),
            with_email: count(&self.constituents, |profile| profile.email.is_some()),
        };
        let gifts = GiftCounts {
            total: self.gifts.len() as u64,
            with_amount: count(&self.gifts, |gift| gift.amount.is_some()),
            with_date: count(&self.gifts, |gift| gift.date.is_some()),
            with_constituent: count(&self.gifts, |gift| known(&gift.constituent_id)),
        };
        let contacts = ContactCounts {
            total: self.contacts.len() as u64,
            with_date: count(&self.contacts, |contact| contact.date.is_some()),
            with_type: count(&self.contacts, |contact| contact.contact_type.is_some()),
            with_constituent: count(&self.contacts, |contact| known(&contact.constituent_id)),
        };

        let mut seen = HashSet::new();
        let duplicate_constituents = count(&self.constituents, |profile| !seen.insert(&profile.id));
        let future = |date: Option<NaiveDate>| date.is_some_and(|date| date > reference);
        let quality = QualityCounts {
            invalid_emails: count(&self.constituents, |profile| {
                profile
                    .email
                    .as_deref()
                    .is_some_and(|email| !is_plausible_email(email))
            }),
            duplicate_constituents,
            invalid_gift_amounts: count(&self.gifts, |gift| {
                gift.amount_unreadable || gift.amount.is_some_and(|amount| amount <= 0.0)
            }),
            future_dated_records: count(&self.gifts, |gift| future(gift.date))
                + count(&self.contacts, |contact| future(contact.date)),
        };

        let coverage = CoverageCounts {
            constituents_with_gifts: count(self.histories.values(), |history| {
                history.gifts.iter().any(GiftRecord::is_contribution)
            }),
            constituents_with_contacts: count(self.histories.values(), |history| {
                !history.contacts.is_empty()
            }),
        };

        let last_gift_date = self
            .gifts
            .iter()
            .filter(|gift| gift.amount.is_some_and(|amount| amount > 0.0))
            .filter_map(|gift| gift.date)
            .filter(|date| *date <= reference)
            .max();
        let last_contact_date = self
            .contacts
            .iter()
            .filter_map(|contact| contact.date)
            .filter(|date| *date <= reference)
            .max();

        OrgAggregate {
            constituents,
            gifts,
            contacts,
            quality,
            coverage,
            last_gift_date,
            last_contact_date,
            reference_date: reference,
        }
    }
}

impl DonorDirectory for DonorDataset {
    fn constituent_ids(&self) -> Result<Vec<ConstituentId>, DirectoryError> {
        Ok(self.profiles.keys().cloned().collect())
    }

    fn history(&self, id: &ConstituentId) -> Result<DonorHistory, DirectoryError> {
        self.histories
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }

    fn capacity_estimate(&self, id: &ConstituentId) -> Result<Option<f64>, DirectoryError> {
        self.profile(id)
            .map(|profile| profile.estimated_capacity)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn count<I, F>(items: I, mut predicate: F) -> u64
where
    I: IntoIterator,
    F: FnMut(I::Item) -> bool,
{
    let mut total = 0;
    for item in items {
        if predicate(item) {
            total += 1;
        }
    }
    total
}

fn constituent_id(raw: Option<String>) -> Option<ConstituentId> {
    raw.map(|id| ConstituentId(id.trim().to_string()))
}

fn profile_from_row(row: ConstituentRow) -> Option<ConstituentProfile> {
    let id = row.constituent_id.trim();
    if id.is_empty() {
        return None;
    }
    Some(ConstituentProfile {
        id: ConstituentId(id.to_string()),
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        estimated_capacity: row
            .estimated_capacity
            .as_deref()
            .and_then(parse_amount)
            .filter(|amount| *amount >= 0.0),
        constituent_type: row.constituent_type,
        class_year: row.class_year.and_then(|year| year.trim().parse().ok()),
        school_college: row.school_college,
        assigned_officer_id: row.assigned_officer_id,
    })
}

fn gift_from_row(row: GiftRow) -> GiftEntry {
    let amount = row.amount.as_deref().and_then(parse_amount);
    GiftEntry {
        constituent_id: constituent_id(row.constituent_id),
        amount_unreadable: row.amount.is_some() && amount.is_none(),
        amount,
        date: row.gift_date.as_deref().and_then(parse_date),
    }
}

fn contact_from_row(row: ContactRow) -> ContactEntry {
    ContactEntry {
        constituent_id: constituent_id(row.constituent_id),
        date: row.contact_date.as_deref().and_then(parse_date),
        contact_type: row.contact_type.as_deref().map(ContactType::from_label),
        outcome: row.outcome.as_deref().and_then(ContactOutcome::from_label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONSTITUENTS: &str = "\
constituent_id,first_name,last_name,email,estimated_capacity,constituent_type,class_year
C-1,Ada,Lovelace,ada@example.org,$250000,alumni,1998
C-2,Charles,Babbage,charles-at-example,,friend,
C-3,,,,,parent,
C-1,Ada,Lovelace,ada@example.org,250000,alumni,1998
";

    const GIFTS: &str = "\
gift_id,constituent_id,amount,gift_date,fund_name
G-1,C-1,500.00,2025-09-01,Annual Fund
G-2,C-1,750.00,2024-09-01,Annual Fund
G-3,C-2,0,2025-02-01,Annual Fund
G-4,C-9,100,2025-03-01,Annual Fund
G-5,C-2,abc,,Annual Fund
";

    const CONTACTS: &str = "\
contact_id,constituent_id,contact_date,contact_type,outcome
K-1,C-1,2025-10-15,phonathon,positive
K-2,C-3,2026-03-01,visit,
";

    fn dataset() -> DonorDataset {
        DonorDataset::from_readers(CONSTITUENTS.as_bytes(), GIFTS.as_bytes(), CONTACTS.as_bytes())
            .expect("exports parse")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn directory_exposes_histories_and_capacity() {
        let dataset = dataset();
        let ids = dataset.constituent_ids().expect("ids");
        assert_eq!(
            ids,
            vec![
                ConstituentId("C-1".to_string()),
                ConstituentId("C-2".to_string()),
                ConstituentId("C-3".to_string())
            ]
        );

        let ada = ConstituentId("C-1".to_string());
        let history = dataset.history(&ada).expect("history");
        assert_eq!(history.gifts.len(), 2);
        assert_eq!(history.contacts[0].contact_type, ContactType::Call);
        assert_eq!(history.contacts[0].outcome, Some(ContactOutcome::Positive));
        assert_eq!(dataset.capacity_estimate(&ada).expect("capacity"), Some(250_000.0));

        let charles = ConstituentId("C-2".to_string());
        assert_eq!(dataset.capacity_estimate(&charles).expect("capacity"), None);
        assert!(matches!(
            dataset.history(&ConstituentId("C-9".to_string())),
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[test]
    fn aggregate_counts_quality_issues() {
        let aggregate = dataset().to_aggregate(date(2026, 1, 15));

        assert_eq!(aggregate.constituents.total, 4);
        assert_eq!(aggregate.constituents.with_name, 3);
        assert_eq!(aggregate.constituents.with_email, 3);
        assert_eq!(aggregate.gifts.total, 5);
        assert_eq!(aggregate.gifts.with_amount, 4);
        assert_eq!(aggregate.gifts.with_date, 4);
        assert_eq!(aggregate.gifts.with_constituent, 4);
        assert_eq!(aggregate.contacts.with_type, 2);

        assert_eq!(aggregate.quality.invalid_emails, 1);
        assert_eq!(aggregate.quality.duplicate_constituents, 1);
        assert_eq!(aggregate.quality.invalid_gift_amounts, 2);
        assert_eq!(aggregate.quality.future_dated_records, 1);

        assert_eq!(aggregate.coverage.constituents_with_gifts, 1);
        assert_eq!(aggregate.coverage.constituents_with_contacts, 2);
        assert_eq!(aggregate.last_gift_date, Some(date(2025, 9, 1)));
        assert_eq!(aggregate.last_contact_date, Some(date(2025, 10, 15)));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = DonorDataset::from_paths(
            Path::new("/nonexistent/constituents.csv"),
            Path::new("/nonexistent/gifts.csv"),
            Path::new("/nonexistent/contacts.csv"),
        )
        .expect_err("missing file");
        assert!(error.to_string().contains("/nonexistent/constituents.csv"));
    }
}
