use chrono::NaiveDate;
use givemetry::error::AppError;
use givemetry::import::DonorDataset;
use givemetry::intelligence::{CampaignCalendar, DonorIntelligence, HealthReport, RankedDonor};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Ranked donors plus the organization's data health for one set of exports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PortfolioReport {
    pub(crate) reference_date: NaiveDate,
    pub(crate) fiscal_year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) active_campaign: Option<String>,
    pub(crate) constituents: usize,
    pub(crate) donors: Vec<RankedDonor>,
    pub(crate) data_health: HealthReport,
}

pub(crate) fn build_portfolio_report(
    intelligence: &DonorIntelligence,
    dataset: &DonorDataset,
    campaigns: &CampaignCalendar,
    reference: NaiveDate,
    limit: Option<usize>,
) -> Result<PortfolioReport, AppError> {
    let mut donors = intelligence.assess_portfolio(dataset, campaigns, reference)?;
    let constituents = donors.len();
    if let Some(limit) = limit {
        donors.truncate(limit);
    }
    let data_health = intelligence.data_health(&dataset.to_aggregate(reference), None);

    Ok(PortfolioReport {
        reference_date: reference,
        fiscal_year: intelligence.fiscal_calendar().fiscal_year(reference),
        active_campaign: campaigns
            .active_campaign(reference)
            .map(|campaign| campaign.name.clone()),
        constituents,
        donors,
        data_health,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
