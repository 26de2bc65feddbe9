//! Date arithmetic shared by every scorer and the query translator.
//!
//! Nothing here reads a clock: every function takes the reference date it should
//! measure against.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Mean Gregorian month length, used to turn day gaps into fractional months.
pub const AVERAGE_DAYS_PER_MONTH: f64 = 30.436875;

const DEFAULT_FISCAL_START_MONTH: u32 = 7;

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn months_between(from: NaiveDate, to: NaiveDate) -> f64 {
    days_between(from, to) as f64 / AVERAGE_DAYS_PER_MONTH
}

/// Months elapsed from `from` to `reference`, treating future-dated records as brand new.
pub fn elapsed_months(from: NaiveDate, reference: NaiveDate) -> f64 {
    months_between(from, reference).max(0.0)
}

/// Human phrasing for a month gap, e.g. "18 months since last gift".
pub fn describe_months(months: f64, suffix: &str) -> String {
    let whole = months.round() as i64;
    match whole {
        i64::MIN..=0 => format!("less than 1 month {suffix}"),
        1 => format!("1 month {suffix}"),
        n => format!("{n} months {suffix}"),
    }
}

/// Institutional fiscal calendar. Fiscal years are named by the calendar year they end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalCalendar {
    pub start_month: u32,
}

impl Default for FiscalCalendar {
    fn default() -> Self {
        Self {
            start_month: DEFAULT_FISCAL_START_MONTH,
        }
    }
}

impl FiscalCalendar {
    pub fn new(start_month: u32) -> Self {
        let start_month = if (1..=12).contains(&start_month) {
            start_month
        } else {
            DEFAULT_FISCAL_START_MONTH
        };
        Self { start_month }
    }

    fn start_month(&self) -> u32 {
        if (1..=12).contains(&self.start_month) {
            self.start_month
        } else {
            DEFAULT_FISCAL_START_MONTH
        }
    }

    fn start_year_for(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.start_month() {
            date.year()
        } else {
            date.year() - 1
        }
    }

    pub fn fiscal_year_start(&self, date: NaiveDate) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year_for(date), self.start_month(), 1).unwrap_or(date)
    }

    pub fn previous_fiscal_year_start(&self, date: NaiveDate) -> NaiveDate {
        let start = self.fiscal_year_start(date);
        start.checked_sub_months(Months::new(12)).unwrap_or(start)
    }

    pub fn next_fiscal_year_start(&self, date: NaiveDate) -> NaiveDate {
        let start = self.fiscal_year_start(date);
        start.checked_add_months(Months::new(12)).unwrap_or(start)
    }

    /// Last day of the fiscal year containing `date`.
    pub fn fiscal_year_end(&self, date: NaiveDate) -> NaiveDate {
        let next = self.next_fiscal_year_start(date);
        next.pred_opt().unwrap_or(next)
    }

    pub fn fiscal_year(&self, date: NaiveDate) -> i32 {
        if self.start_month() == 1 {
            date.year()
        } else {
            self.start_year_for(date) + 1
        }
    }

    pub fn days_until_fiscal_year_end(&self, date: NaiveDate) -> i64 {
        days_between(date, self.fiscal_year_end(date)).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl DateUnit {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "day" | "days" => Some(Self::Days),
            "week" | "weeks" => Some(Self::Weeks),
            "month" | "months" => Some(Self::Months),
            "year" | "years" => Some(Self::Years),
            _ => None,
        }
    }
}

/// Relative date tokens produced by the upstream intent parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDate {
    Today,
    Ago { amount: u32, unit: DateUnit },
    ThisFiscalYear,
    LastFiscalYear,
    ThisCalendarYear,
    LastCalendarYear,
}

impl RelativeDate {
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "today" => return Some(Self::Today),
            "yesterday" => {
                return Some(Self::Ago {
                    amount: 1,
                    unit: DateUnit::Days,
                })
            }
            "this_fiscal_year" | "current_fiscal_year" => return Some(Self::ThisFiscalYear),
            "last_fiscal_year" | "previous_fiscal_year" => return Some(Self::LastFiscalYear),
            "this_calendar_year" | "this_year" => return Some(Self::ThisCalendarYear),
            "last_calendar_year" | "last_year" => return Some(Self::LastCalendarYear),
            _ => {}
        }

        let parts: Vec<&str> = normalized.split('_').collect();
        match parts.as_slice() {
            [amount, unit, "ago"] => {
                let amount = amount.parse::<u32>().ok()?;
                let unit = DateUnit::parse(unit)?;
                Some(Self::Ago { amount, unit })
            }
            _ => None,
        }
    }

    pub fn resolve(&self, reference: NaiveDate, calendar: &FiscalCalendar) -> Option<NaiveDate> {
        match *self {
            Self::Today => Some(reference),
            Self::Ago { amount, unit } => match unit {
                DateUnit::Days => reference.checked_sub_signed(Duration::days(i64::from(amount))),
                DateUnit::Weeks => {
                    reference.checked_sub_signed(Duration::weeks(i64::from(amount)))
                }
                DateUnit::Months => reference.checked_sub_months(Months::new(amount)),
                DateUnit::Years => {
                    reference.checked_sub_months(Months::new(amount.checked_mul(12)?))
                }
            },
            Self::ThisFiscalYear => Some(calendar.fiscal_year_start(reference)),
            Self::LastFiscalYear => Some(calendar.previous_fiscal_year_start(reference)),
            Self::ThisCalendarYear => NaiveDate::from_ymd_opt(reference.year(), 1, 1),
            Self::LastCalendarYear => NaiveDate::from_ymd_opt(reference.year() - 1, 1, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemporalError {
    #[error("unrecognized relative date token '{0}'")]
    UnrecognizedToken(String),
    #[error("relative date '{0}' falls outside the supported calendar range")]
    OutOfRange(String),
}

/// True when `raw` is already an absolute ISO-8601 date or timestamp.
pub fn is_absolute_date(raw: &str) -> bool {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(trimmed).is_ok()
        || NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

/// Resolves a date-valued filter operand. Absolute dates are returned untouched, relative
/// tokens become `YYYY-MM-DD` strings, and anything else is rejected.
pub fn resolve_date_value(
    raw: &str,
    reference: NaiveDate,
    calendar: &FiscalCalendar,
) -> Result<String, TemporalError> {
    if is_absolute_date(raw) {
        return Ok(raw.to_string());
    }

    let relative =
        RelativeDate::parse(raw).ok_or_else(|| TemporalError::UnrecognizedToken(raw.to_string()))?;
    let resolved = relative
        .resolve(reference, calendar)
        .ok_or_else(|| TemporalError::OutOfRange(raw.to_string()))?;
    Ok(resolved.format("%Y-%m-%d").to_string())
}
