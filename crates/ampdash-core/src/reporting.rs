//! Reporting snapshot and the date range it is scoped by.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Decimal places kept for percentage figures (`ctr`, `conversionRate`).
pub const PERCENT_DP: u32 = 2;
/// Decimal places kept for per-click cost.
pub const CPC_DP: u32 = 4;
/// Decimal places kept for per-acquisition cost.
pub const CPA_DP: u32 = 2;

/// Aggregated performance figures, either over all campaigns of a marketer or
/// for a single campaign (`campaign_id` is set).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    pub total_spend: Decimal,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// Click-through rate as a percentage (0-100).
    pub ctr: Decimal,
    pub cpc: Decimal,
    pub cpa: Decimal,
    /// Conversions per click as a percentage (0-100).
    pub conversion_rate: Decimal,
}

impl ReportingSnapshot {
    /// Builds a snapshot from raw totals, deriving every ratio field.
    #[must_use]
    pub fn from_totals(
        campaign_id: Option<String>,
        total_spend: Decimal,
        impressions: u64,
        clicks: u64,
        conversions: u64,
    ) -> Self {
        Self {
            campaign_id,
            total_spend,
            impressions,
            clicks,
            conversions,
            ctr: percentage(clicks, impressions),
            cpc: ratio(total_spend, clicks, CPC_DP),
            cpa: ratio(total_spend, conversions, CPA_DP),
            conversion_rate: percentage(conversions, clicks),
        }
    }

    /// True when no activity was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.impressions == 0 && self.clicks == 0 && self.total_spend.is_zero()
    }
}

/// `part / whole * 100`, rounded to [`PERCENT_DP`]; zero when `whole` is zero.
#[must_use]
pub fn percentage(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(PERCENT_DP)
}

/// `amount / count`, rounded to `dp`; zero when `count` is zero.
#[must_use]
pub fn ratio(amount: Decimal, count: u64, dp: u32) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (amount / Decimal::from(count)).round_dp(dp)
}

/// Inclusive calendar date range a report is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `from > to`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvertedDateRange`] when `from` is after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, CoreError> {
        if from > to {
            return Err(CoreError::InvertedDateRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// The `days`-long window ending on `today`. A window reaching past
    /// the earliest representable date starts at [`NaiveDate::MIN`].
    #[must_use]
    pub fn trailing_days(today: NaiveDate, days: u32) -> Self {
        let from = today
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }
}
