use super::common::*;
use crate::intelligence::domain::{ConstituentId, DonorHistory};
use crate::intelligence::segment::DonorSegment;
use crate::intelligence::sources::{Campaign, CampaignCalendar, DirectoryError, DonorDirectory};
use crate::intelligence::{DonorIntelligence, FiscalCalendar};

fn directory() -> MemoryDirectory {
    MemoryDirectory::default()
        .with("C-100", loyal_annual_donor(), Some(500_000.0))
        .with("C-200", lapsing_donor(), Some(500_000.0))
        .with("C-300", DonorHistory::default(), None)
        .with("C-050", loyal_annual_donor(), Some(500_000.0))
}

#[test]
fn portfolio_ranks_by_priority_then_risk_then_id() {
    let intelligence = DonorIntelligence::default();
    let ranked = intelligence
        .assess_portfolio(&directory(), &FiscalCalendar::default(), reference())
        .expect("directory available");

    let order: Vec<_> = ranked
        .iter()
        .map(|donor| donor.constituent_id.0.as_str())
        .collect();
    assert_eq!(order, vec!["C-050", "C-100", "C-200", "C-300"]);
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[3].rank, 4);
    assert!(ranked
        .windows(2)
        .all(|pair| pair[0].assessment.priority.score >= pair[1].assessment.priority.score));
    assert_eq!(ranked[3].assessment.segment.segment, DonorSegment::Prospect);
}

#[test]
fn active_campaign_raises_every_priority() {
    let intelligence = DonorIntelligence::default();
    let campaigns = CampaignCalendar::new(
        FiscalCalendar::default(),
        vec![Campaign {
            name: "Annual Giving".to_string(),
            starts_on: date(2026, 1, 1),
            ends_on: date(2026, 2, 28),
        }],
    );
    let quiet = CampaignCalendar::new(FiscalCalendar::default(), Vec::new());

    let during = intelligence
        .assess_portfolio(&directory(), &campaigns, reference())
        .expect("directory available");
    let outside = intelligence
        .assess_portfolio(&directory(), &quiet, reference())
        .expect("directory available");

    for donor in &during {
        let baseline = outside
            .iter()
            .find(|other| other.constituent_id == donor.constituent_id)
            .expect("same constituents");
        assert!(donor.assessment.priority.score > baseline.assessment.priority.score);
    }
}

#[test]
fn directory_failures_propagate() {
    let intelligence = DonorIntelligence::default();
    let error = intelligence
        .assess_portfolio(&UnavailableDirectory, &FiscalCalendar::default(), reference())
        .expect_err("unavailable");
    assert!(matches!(error, DirectoryError::Unavailable(_)));
}

#[test]
fn missing_constituent_is_reported() {
    let error = directory()
        .history(&ConstituentId("C-999".to_string()))
        .expect_err("unknown constituent");
    assert_eq!(error.to_string(), "constituent C-999 not found");
}
