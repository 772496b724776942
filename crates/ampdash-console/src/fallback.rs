//! Static stand-in data for failed upstream reads.
//!
//! The dataset is already canonical, so nothing downstream can tell it apart
//! from decoded live data; [`crate::DataSource::Fallback`] is the only signal.

use std::collections::BTreeSet;

use ampdash_client::ApiCall;
use ampdash_core::{
    Budget, Campaign, CampaignStatus, Content, Marketer, Platform, ReportingSnapshot,
    DEFAULT_CURRENCY,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub const FALLBACK_MARKETER_ID: &str = "00037dfc4e76d2a5dbdd7ee00f0fd871e3";
pub const FALLBACK_CAMPAIGN_ID: &str = "00e2e008dd9c2fffa3ef21ff551dacbc08";

const CLICKS: u64 = 115_640;
const IMPRESSIONS: u64 = 2_840_000;
const CONVERSIONS: u64 = 1847;

/// One substituted read result.
#[derive(Debug, Clone, PartialEq)]
pub enum Substitute {
    Marketers(Vec<Marketer>),
    Campaigns(Vec<Campaign>),
    Contents(Vec<Content>),
    Reporting(ReportingSnapshot),
}

/// The fallback dataset: one marketer running one June campaign with two ads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackData;

impl FallbackData {
    /// Stand-in result for `call`, or `None` for mutations, which never fall
    /// back.
    #[must_use]
    pub fn substitute(self, call: &ApiCall) -> Option<Substitute> {
        match call {
            ApiCall::GetMyMarketers => Some(Substitute::Marketers(self.marketers())),
            ApiCall::GetCampaigns { .. } => Some(Substitute::Campaigns(self.campaigns())),
            ApiCall::GetContents { campaign_id } => {
                Some(Substitute::Contents(self.contents(campaign_id)))
            }
            ApiCall::GetReporting { campaign_id, .. } => {
                Some(Substitute::Reporting(self.reporting(campaign_id.as_deref())))
            }
            ApiCall::SetCampaignEnabled { .. }
            | ApiCall::SetContentEnabled { .. }
            | ApiCall::ChangeBudget { .. } => None,
        }
    }

    #[must_use]
    pub fn marketers(self) -> Vec<Marketer> {
        vec![Marketer {
            id: FALLBACK_MARKETER_ID.to_owned(),
            name: "Route Agency Limited".to_owned(),
            enabled: true,
            currency: DEFAULT_CURRENCY.to_owned(),
        }]
    }

    /// The same campaign list is served for every marketer id.
    #[must_use]
    pub fn campaigns(self) -> Vec<Campaign> {
        vec![Campaign {
            id: FALLBACK_CAMPAIGN_ID.to_owned(),
            name: "Carents Room Traffic Campaign - June 2025".to_owned(),
            status: CampaignStatus::Enabled,
            budget: Budget {
                amount: Decimal::new(1550, 0),
                currency: Some(DEFAULT_CURRENCY.to_owned()),
            },
            cpc: Decimal::new(112, 4),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            platform: BTreeSet::from([Platform::Mobile, Platform::Tablet]),
            amount_spent: spend(),
            on_air: true,
            clicks: CLICKS,
            impressions: IMPRESSIONS,
        }]
    }

    /// Ads of the fallback campaign; empty for any other id.
    #[must_use]
    pub fn contents(self, campaign_id: &str) -> Vec<Content> {
        if campaign_id != FALLBACK_CAMPAIGN_ID {
            return Vec::new();
        }
        [
            "Carents Room - Premium Content Discovery",
            "Discover Family-Friendly Spaces",
        ]
        .iter()
        .enumerate()
        .map(|(i, headline)| Content {
            id: format!("content-{FALLBACK_CAMPAIGN_ID}-{}", i + 1),
            headline: (*headline).to_owned(),
            status: CampaignStatus::Enabled,
            campaign_id: FALLBACK_CAMPAIGN_ID.to_owned(),
        })
        .collect()
    }

    /// Aggregate figures (`campaign_id == None`) match the single fallback
    /// campaign; any other campaign reports no activity.
    #[must_use]
    pub fn reporting(self, campaign_id: Option<&str>) -> ReportingSnapshot {
        match campaign_id {
            None | Some(FALLBACK_CAMPAIGN_ID) => ReportingSnapshot::from_totals(
                campaign_id.map(str::to_owned),
                spend(),
                IMPRESSIONS,
                CLICKS,
                CONVERSIONS,
            ),
            Some(other) => {
                ReportingSnapshot::from_totals(Some(other.to_owned()), Decimal::ZERO, 0, 0, 0)
            }
        }
    }
}

fn spend() -> Decimal {
    Decimal::new(129_532, 2)
}
