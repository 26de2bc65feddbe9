use std::io::Read;

use chrono::{DateTime, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

/// Row of the constituent export. Columns beyond these are ignored.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConstituentRow {
    pub(crate) constituent_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) first_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) last_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) estimated_capacity: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) constituent_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) class_year: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) school_college: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) assigned_officer_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GiftRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) constituent_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) amount: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) gift_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContactRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) constituent_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) contact_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) contact_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) outcome: Option<String>,
}

pub(crate) fn parse_rows<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        rows.push(record?);
    }
    Ok(rows)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Accepts ISO dates, RFC 3339 timestamps and US-style `MM/DD/YYYY`.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").ok()
}

/// Parses a currency cell such as `1250.00`, `$1,250` or `-50`.
pub(crate) fn parse_amount(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits: String = unsigned
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .collect();
    let amount: f64 = digits.parse().ok()?;
    if !amount.is_finite() {
        return None;
    }
    Some(if negative { -amount } else { amount })
}

/// Loose shape check: one `@`, a non-empty local part and a dotted domain.
pub(crate) fn is_plausible_email(value: &str) -> bool {
    let trimmed = value.trim();
    let mut parts = trimmed.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !trimmed.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_rows_ignoring_extra_columns() {
        let csv = "constituent_id,prefix,first_name,last_name,email,estimated_capacity\n\
                   C-1, Dr., Ada ,Lovelace,ada@example.org,250000\n\
                   C-2,,,Babbage,, \n";
        let rows: Vec<ConstituentRow> = parse_rows(csv.as_bytes()).expect("parses");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].first_name.as_deref(), Some("Ada"));
        assert_eq!(rows[0].estimated_capacity.as_deref(), Some("250000"));
        assert_eq!(rows[1].first_name, None);
        assert_eq!(rows[1].email, None);
        assert_eq!(rows[1].estimated_capacity, None);
    }

    #[test]
    fn dates_and_amounts_accept_common_export_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9);
        assert_eq!(parse_date("2025-03-09"), expected);
        assert_eq!(parse_date("03/09/2025"), expected);
        assert_eq!(parse_date("2025-03-09T10:00:00Z"), expected);
        assert_eq!(parse_date("next tuesday"), None);

        assert_eq!(parse_amount("$1,250.50"), Some(1250.5));
        assert_eq!(parse_amount("-50"), Some(-50.0));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn email_shape_check() {
        assert!(is_plausible_email("ada@example.org"));
        assert!(!is_plausible_email("ada.example.org"));
        assert!(!is_plausible_email("ada@example"));
        assert!(!is_plausible_email("a b@example.org"));
        assert!(!is_plausible_email("@example.org"));
    }
}
