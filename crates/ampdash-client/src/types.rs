//! Raw upstream record shapes.
//!
//! ## Demo shape
//! Flat records whose field names match the canonical model one-to-one
//! (`budget`, `currency`, `startDate`, `platform`, `amountSpent`, `onAir`,
//! `clicks`, `impressions`). Both `status` (`"ENABLED"`/`"PAUSED"`) and
//! `enabled` may be present; `enabled` wins when it is.
//!
//! ## Live shape
//! The bridge forwards the advertising API's nested campaign objects:
//!
//! ```json
//! {
//!   "id": "00e2...", "name": "...", "enabled": true, "cpc": 0.0112,
//!   "budget": { "amount": 1550, "currency": "GBP",
//!               "startDate": "2025-06-02", "endDate": "2025-06-30" },
//!   "targeting": { "platform": ["MOBILE", "TABLET"] },
//!   "liveStatus": { "amountSpent": 1295.32, "campaignOnAir": true }
//! }
//! ```
//!
//! Clicks and impressions are not part of this shape; they come from a
//! per-campaign reporting lookup. Content in the live shape is a promoted
//! link carrying `text` and `enabled` instead of `headline` and `status`.
//!
//! Every field except `id` is decoded through [`crate::lenient`] and
//! defaults when absent or malformed.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::lenient;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarketer {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_boolean")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Demo shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoCampaign {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_boolean")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub budget: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cpc: Decimal,
    #[serde(default, deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub end_date: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub platform: Vec<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount_spent: Decimal,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub on_air: bool,
    #[serde(default, deserialize_with = "lenient::count")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub impressions: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoContent {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub headline: String,
    #[serde(default, deserialize_with = "lenient::opt_boolean")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    pub campaign_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Live shape
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveCampaign {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cpc: Decimal,
    #[serde(default, deserialize_with = "lenient::nested")]
    pub budget: LiveBudget,
    #[serde(default, deserialize_with = "lenient::nested")]
    pub targeting: LiveTargeting,
    #[serde(default, deserialize_with = "lenient::nested")]
    pub live_status: LiveStatus,
}

/// Budget object; also carries the campaign's run schedule.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBudget {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub end_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTargeting {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub platform: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub amount_spent: Decimal,
    #[serde(default, alias = "onAir", deserialize_with = "lenient::boolean")]
    pub campaign_on_air: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveContent {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, alias = "headline", deserialize_with = "lenient::string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "lenient::id")]
    pub campaign_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Flat performance record. Ratio fields are optional and derived from the
/// totals when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReporting {
    #[serde(default, alias = "campaignId", deserialize_with = "lenient::id")]
    pub id: Option<String>,
    #[serde(default, alias = "spend", deserialize_with = "lenient::decimal")]
    pub total_spend: Decimal,
    #[serde(default, deserialize_with = "lenient::count")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub conversions: u64,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub ctr: Option<Decimal>,
    #[serde(default, alias = "ecpc", deserialize_with = "lenient::opt_decimal")]
    pub cpc: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub cpa: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    pub conversion_rate: Option<Decimal>,
}
