use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scores strictly above this value fall in the high band.
pub const HIGH_BAND_THRESHOLD: f64 = 0.7;
/// Scores at or above this value (and not high) fall in the medium band.
pub const MEDIUM_BAND_THRESHOLD: f64 = 0.4;

/// Identifier wrapper for constituents in the source CRM.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstituentId(pub String);

impl fmt::Display for ConstituentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single gift. Non-positive amounts are refunds or adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GiftRecord {
    pub amount: f64,
    pub date: NaiveDate,
}

impl GiftRecord {
    pub fn new(amount: f64, date: NaiveDate) -> Self {
        Self { amount, date }
    }

    /// Whether the gift counts as a contribution for recency, frequency and monetary scoring.
    pub fn is_contribution(&self) -> bool {
        self.amount.is_finite() && self.amount > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    Call,
    Meeting,
    Email,
    Event,
    Visit,
    Other,
}

impl ContactType {
    /// Maps CRM contact labels onto the model's fixed set; unknown labels become `Other`.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "call" | "phone" | "phonathon" => Self::Call,
            "meeting" => Self::Meeting,
            "email" => Self::Email,
            "event" => Self::Event,
            "visit" => Self::Visit,
            _ => Self::Other,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Email => "email",
            Self::Event => "event",
            Self::Visit => "visit",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactOutcome {
    Positive,
    Neutral,
    Negative,
    NoResponse,
}

impl ContactOutcome {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            "no_response" | "no response" => Some(Self::NoResponse),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::NoResponse => "no response",
        }
    }

    pub const fn is_unfavorable(self) -> bool {
        matches!(self, Self::Negative | Self::NoResponse)
    }
}

/// A logged touchpoint between the organization and a constituent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ContactOutcome>,
}

impl ContactRecord {
    pub fn new(
        date: NaiveDate,
        contact_type: ContactType,
        outcome: Option<ContactOutcome>,
    ) -> Self {
        Self {
            date,
            contact_type,
            outcome,
        }
    }
}

/// Giving and contact history for one constituent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonorHistory {
    #[serde(default)]
    pub gifts: Vec<GiftRecord>,
    #[serde(default)]
    pub contacts: Vec<ContactRecord>,
}

impl DonorHistory {
    pub fn new(gifts: Vec<GiftRecord>, contacts: Vec<ContactRecord>) -> Self {
        Self { gifts, contacts }
    }

    pub fn last_engagement(&self) -> LastEngagement {
        LastEngagement {
            last_gift_date: self
                .gifts
                .iter()
                .filter(|gift| gift.is_contribution())
                .map(|gift| gift.date)
                .max(),
            last_contact_date: self.contacts.iter().map(|contact| contact.date).max(),
        }
    }
}

/// Most recent gift and contact dates, as consumed by the priority model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastEngagement {
    #[serde(default)]
    pub last_gift_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_contact_date: Option<NaiveDate>,
}

impl LastEngagement {
    pub fn most_recent(&self) -> Option<NaiveDate> {
        match (self.last_gift_date, self.last_contact_date) {
            (Some(gift), Some(contact)) => Some(gift.max(contact)),
            (gift, contact) => gift.or(contact),
        }
    }
}

/// The signal a factor explains. Serialized as the factor `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Recency,
    Frequency,
    Monetary,
    Contact,
    Capacity,
    Likelihood,
    Timing,
    Engagement,
    Completeness,
    Freshness,
    Consistency,
    Coverage,
}

impl FactorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Frequency => "frequency",
            Self::Monetary => "monetary",
            Self::Contact => "contact",
            Self::Capacity => "capacity",
            Self::Likelihood => "likelihood",
            Self::Timing => "timing",
            Self::Engagement => "engagement",
            Self::Completeness => "completeness",
            Self::Freshness => "freshness",
            Self::Consistency => "consistency",
            Self::Coverage => "coverage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorImpact {
    High,
    Medium,
    Low,
}

impl FactorImpact {
    /// Tier for a sub-score where larger values push the composite harder.
    pub fn for_signal(value: f64) -> Self {
        if value >= HIGH_BAND_THRESHOLD {
            Self::High
        } else if value >= MEDIUM_BAND_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Human-readable explanation attached to every model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFactor {
    #[serde(rename = "name")]
    pub kind: FactorKind,
    pub value: String,
    pub impact: FactorImpact,
}

impl ScoreFactor {
    pub fn new(kind: FactorKind, value: impl Into<String>, impact: FactorImpact) -> Self {
        Self {
            kind,
            value: value.into(),
            impact,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.label()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_BAND_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_BAND_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_BAND_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_BAND_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Output of the lapse risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub predicted_lapse_window: String,
    pub factors: Vec<ScoreFactor>,
}

/// Output of the outreach priority model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityResult {
    pub score: f64,
    pub tier: PriorityTier,
    pub confidence: f64,
    pub factors: Vec<ScoreFactor>,
}

/// Clamp to [0, 1], mapping NaN to `fallback`.
pub(crate) fn unit_interval(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$1,250,000`.
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0.0 && rounded > 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub(crate) fn percent(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_have_no_gaps_or_overlap() {
        assert_eq!(RiskLevel::from_score(0.71), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.3999), RiskLevel::Low);
        assert_eq!(PriorityTier::from_score(0.9), PriorityTier::High);
        assert_eq!(PriorityTier::from_score(0.55), PriorityTier::Medium);
        assert_eq!(PriorityTier::from_score(0.1), PriorityTier::Low);
    }

    #[test]
    fn score_factor_serializes_kind_as_name() {
        let factor = ScoreFactor::new(
            FactorKind::Recency,
            "18 months since last gift",
            FactorImpact::Medium,
        );
        let json = serde_json::to_value(&factor).expect("serializes");
        assert_eq!(json["name"], "recency");
        assert_eq!(json["impact"], "medium");
        assert_eq!(json["value"], "18 months since last gift");
    }

    #[test]
    fn contact_labels_map_to_fixed_set() {
        assert_eq!(ContactType::from_label("Phonathon"), ContactType::Call);
        assert_eq!(ContactType::from_label(" visit "), ContactType::Visit);
        assert_eq!(ContactType::from_label("zoom"), ContactType::Other);
        assert_eq!(ContactOutcome::from_label("no_response"), Some(ContactOutcome::NoResponse));
        assert_eq!(ContactOutcome::from_label(""), None);
    }

    #[test]
    fn amounts_render_with_separators() {
        assert_eq!(format_amount(1_250_000.0), "$1,250,000");
        assert_eq!(format_amount(999.4), "$999");
        assert_eq!(format_amount(-50.0), "-$50");
        assert_eq!(format_amount(0.0), "$0");
    }

    #[test]
    fn last_engagement_ignores_refunds() {
        let date = |m| NaiveDate::from_ymd_opt(2025, m, 1).expect("valid date");
        let history = DonorHistory::new(
            vec![GiftRecord::new(100.0, date(2)), GiftRecord::new(-100.0, date(6))],
            vec![ContactRecord::new(date(4), ContactType::Email, None)],
        );
        let engagement = history.last_engagement();
        assert_eq!(engagement.last_gift_date, Some(date(2)));
        assert_eq!(engagement.most_recent(), Some(date(4)));
    }
}
