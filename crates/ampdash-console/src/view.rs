//! Pure projections over canonical console state.
//!
//! Nothing here performs I/O or mutates its inputs; every function can be
//! called on any snapshot returned by [`crate::Console::state`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ampdash_core::reporting::percentage;
use ampdash_core::{Campaign, CampaignStatus, Content};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ConsoleError;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Narrows campaigns by the calendar month of their start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthFilter {
    #[default]
    All,
    /// 1-indexed month, `1..=12`.
    Month(u32),
}

impl FromStr for MonthFilter {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.parse::<u32>() {
            Ok(month @ 1..=12) => Ok(Self::Month(month)),
            _ => Err(ConsoleError::InvalidFilter {
                kind: "month",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Month(m) => write!(f, "{m}"),
        }
    }
}

/// Narrows campaigns by status or live delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// `status == ENABLED`
    Active,
    /// `status == PAUSED`
    Paused,
    /// `onAir == true`, regardless of status.
    Live,
}

impl FromStr for StatusFilter {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "live" => Ok(Self::Live),
            other => Err(ConsoleError::InvalidFilter {
                kind: "status",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Live => "live",
        })
    }
}

/// Summary totals shown above the campaign list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    /// Sum of budgets; currencies are assumed to match the marketer's.
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    /// Enabled ads across the whole content map.
    pub live_ads: usize,
}

/// Campaigns passing both filters, in their original order.
#[must_use]
pub fn filtered_campaigns(
    campaigns: &[Campaign],
    month: MonthFilter,
    status: StatusFilter,
) -> Vec<&Campaign> {
    campaigns
        .iter()
        .filter(|c| matches_month(c, month) && matches_status(c, status))
        .collect()
}

fn matches_month(campaign: &Campaign, filter: MonthFilter) -> bool {
    match filter {
        MonthFilter::All => true,
        MonthFilter::Month(month) => campaign.start_date.is_some_and(|d| d.month() == month),
    }
}

fn matches_status(campaign: &Campaign, filter: StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Active => campaign.status == CampaignStatus::Enabled,
        StatusFilter::Paused => campaign.status == CampaignStatus::Paused,
        StatusFilter::Live => campaign.on_air,
    }
}

#[must_use]
pub fn aggregates(campaigns: &[Campaign], contents: &BTreeMap<String, Vec<Content>>) -> Aggregates {
    Aggregates {
        total_campaigns: campaigns.len(),
        active_campaigns: campaigns.iter().filter(|c| c.is_enabled()).count(),
        total_budget: saturating_sum(campaigns.iter().map(|c| c.budget.amount)),
        total_spent: saturating_sum(campaigns.iter().map(|c| c.amount_spent)),
        live_ads: contents
            .values()
            .flatten()
            .filter(|ad| ad.status.is_enabled())
            .count(),
    }
}

/// Totals of non-negative amounts stop at [`Decimal::MAX`].
fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).unwrap_or(Decimal::MAX)
    })
}

/// Click-through rate as a percentage with two decimals; `0` without
/// impressions.
#[must_use]
pub fn ctr(clicks: u64, impressions: u64) -> Decimal {
    percentage(clicks, impressions)
}

/// `(enabled, total)` ad counts for one campaign.
#[must_use]
pub fn content_summary(
    contents: &BTreeMap<String, Vec<Content>>,
    campaign_id: &str,
) -> (usize, usize) {
    contents.get(campaign_id).map_or((0, 0), |ads| {
        (ads.iter().filter(|ad| ad.status.is_enabled()).count(), ads.len())
    })
}

/// Badge text for a campaign card: `LIVE` while delivering, else the status.
#[must_use]
pub fn display_status(campaign: &Campaign) -> &'static str {
    if campaign.on_air {
        "LIVE"
    } else {
        campaign.status.as_str()
    }
}

#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_NAMES.get(index).copied()
}
