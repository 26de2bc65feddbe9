use std::collections::BTreeMap;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::intelligence::domain::{
    ConstituentId, ContactOutcome, ContactRecord, ContactType, DonorHistory, GiftRecord,
};
use crate::intelligence::sources::{DirectoryError, DonorDirectory};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn reference() -> NaiveDate {
    date(2026, 1, 15)
}

pub(super) fn gift(amount: f64, year: i32, month: u32, day: u32) -> GiftRecord {
    GiftRecord::new(amount, date(year, month, day))
}

pub(super) fn contact(
    year: i32,
    month: u32,
    day: u32,
    contact_type: ContactType,
    outcome: Option<ContactOutcome>,
) -> ContactRecord {
    ContactRecord::new(date(year, month, day), contact_type, outcome)
}

/// Three annual $1,000 gifts and a recent positive meeting.
pub(super) fn loyal_annual_donor() -> DonorHistory {
    DonorHistory::new(
        vec![
            gift(1000.0, 2025, 12, 1),
            gift(1000.0, 2024, 12, 1),
            gift(1000.0, 2023, 12, 1),
        ],
        vec![contact(
            2025,
            11,
            1,
            ContactType::Meeting,
            Some(ContactOutcome::Positive),
        )],
    )
}

/// Gave generously years ago and has gone quiet.
pub(super) fn lapsing_donor() -> DonorHistory {
    DonorHistory::new(
        vec![
            gift(5000.0, 2020, 6, 1),
            gift(2500.0, 2021, 6, 1),
            gift(500.0, 2022, 6, 1),
        ],
        vec![contact(
            2022,
            9,
            1,
            ContactType::Call,
            Some(ContactOutcome::NoResponse),
        )],
    )
}

#[derive(Debug, Default)]
pub(super) struct MemoryDirectory {
    pub donors: BTreeMap<ConstituentId, (DonorHistory, Option<f64>)>,
}

impl MemoryDirectory {
    pub(super) fn with(mut self, id: &str, history: DonorHistory, capacity: Option<f64>) -> Self {
        self.donors
            .insert(ConstituentId(id.to_string()), (history, capacity));
        self
    }
}

impl DonorDirectory for MemoryDirectory {
    fn constituent_ids(&self) -> Result<Vec<ConstituentId>, DirectoryError> {
        Ok(self.donors.keys().cloned().collect())
    }

    fn history(&self, id: &ConstituentId) -> Result<DonorHistory, DirectoryError> {
        self.donors
            .get(id)
            .map(|(history, _)| history.clone())
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }

    fn capacity_estimate(&self, id: &ConstituentId) -> Result<Option<f64>, DirectoryError> {
        self.donors
            .get(id)
            .map(|(_, capacity)| *capacity)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }
}

pub(super) struct UnavailableDirectory;

impl DonorDirectory for UnavailableDirectory {
    fn constituent_ids(&self) -> Result<Vec<ConstituentId>, DirectoryError> {
        Err(DirectoryError::Unavailable("crm offline".to_string()))
    }

    fn history(&self, _id: &ConstituentId) -> Result<DonorHistory, DirectoryError> {
        Err(DirectoryError::Unavailable("crm offline".to_string()))
    }

    fn capacity_estimate(&self, _id: &ConstituentId) -> Result<Option<f64>, DirectoryError> {
        Err(DirectoryError::Unavailable("crm offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn post_json(uri: &str, payload: &Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("request builds")
}
