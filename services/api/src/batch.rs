use crate::infra::{build_portfolio_report, PortfolioReport};
use chrono::{Local, NaiveDate};
use clap::Args;
use givemetry::config::AppConfig;
use givemetry::error::AppError;
use givemetry::import::DonorDataset;
use givemetry::intelligence::sources::Campaign;
use givemetry::intelligence::{CampaignCalendar, DonorIntelligence};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Constituent export (CSV with a constituent_id column)
    #[arg(long)]
    pub(crate) constituents: PathBuf,
    /// Gift export (constituent_id, amount, gift_date)
    #[arg(long)]
    pub(crate) gifts: PathBuf,
    /// Contact export (constituent_id, contact_date, contact_type, outcome)
    #[arg(long)]
    pub(crate) contacts: PathBuf,
    /// Optional JSON list of campaigns ({ name, starts_on, ends_on })
    #[arg(long)]
    pub(crate) campaigns: Option<PathBuf>,
    /// Scoring date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Only print the top N donors
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Emit the full report as JSON instead of a summary table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        constituents,
        gifts,
        contacts,
        campaigns,
        as_of,
        limit,
        json,
    } = args;

    let config = AppConfig::load()?;
    let intelligence = DonorIntelligence::new(config.intelligence);
    let dataset = DonorDataset::from_paths(&constituents, &gifts, &contacts)?;
    let campaigns = match campaigns {
        Some(path) => serde_json::from_str::<Vec<Campaign>>(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    let calendar = CampaignCalendar::new(*intelligence.fiscal_calendar(), campaigns);
    let reference = as_of.unwrap_or_else(|| Local::now().date_naive());

    let report = build_portfolio_report(&intelligence, &dataset, &calendar, reference, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report, &dataset);
    }
    Ok(())
}

fn render_report(report: &PortfolioReport, dataset: &DonorDataset) {
    println!(
        "Donor portfolio as of {} (FY{}) | {} constituents",
        report.reference_date, report.fiscal_year, report.constituents
    );
    if let Some(campaign) = &report.active_campaign {
        println!("Active campaign: {campaign}");
    }

    for donor in &report.donors {
        let name = dataset
            .profile(&donor.constituent_id)
            .and_then(|profile| profile.display_name())
            .unwrap_or_else(|| "(unnamed)".to_string());
        let assessment = &donor.assessment;
        println!(
            "{:>3}. {} {} | priority {:.2} ({}) | lapse {:.2} ({}, {}) | {}",
            donor.rank,
            donor.constituent_id,
            name,
            assessment.priority.score,
            assessment.priority.tier.label(),
            assessment.lapse.score,
            assessment.lapse.risk_level.label(),
            assessment.lapse.predicted_lapse_window,
            assessment.segment.segment.label(),
        );
    }

    let health = &report.data_health;
    println!(
        "\nData health {:.0}% | completeness {:.0}% | freshness {:.0}% \
         | consistency {:.0}% | coverage {:.0}%",
        health.overall_score * 100.0,
        health.categories.completeness * 100.0,
        health.categories.freshness * 100.0,
        health.categories.consistency * 100.0,
        health.categories.coverage * 100.0,
    );
    for factor in &health.factors {
        println!("  - {}: {}", factor.kind.label(), factor.value);
    }
}
