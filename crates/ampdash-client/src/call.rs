//! The named remote operations the console can issue.

use ampdash_core::DateRange;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// One remote call with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    GetMyMarketers,
    GetCampaigns {
        marketer_id: String,
    },
    GetContents {
        campaign_id: String,
    },
    GetReporting {
        marketer_id: String,
        range: DateRange,
        campaign_id: Option<String>,
    },
    SetCampaignEnabled {
        campaign_id: String,
        enabled: bool,
    },
    SetContentEnabled {
        content_id: String,
        enabled: bool,
    },
    ChangeBudget {
        campaign_id: String,
        amount: Decimal,
    },
}

impl ApiCall {
    /// Wire name of the call, e.g. `getCampaigns` or `disableContent`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetMyMarketers => "getMyMarketers",
            Self::GetCampaigns { .. } => "getCampaigns",
            Self::GetContents { .. } => "getContents",
            Self::GetReporting { .. } => "getReporting",
            Self::SetCampaignEnabled { enabled: true, .. } => "enableCampaign",
            Self::SetCampaignEnabled { enabled: false, .. } => "disableCampaign",
            Self::SetContentEnabled { enabled: true, .. } => "enableContent",
            Self::SetContentEnabled { enabled: false, .. } => "disableContent",
            Self::ChangeBudget { .. } => "changeBudget",
        }
    }

    /// JSON parameter object sent with the call.
    #[must_use]
    pub fn params(&self) -> Value {
        match self {
            Self::GetMyMarketers => json!({}),
            Self::GetCampaigns { marketer_id } => json!({ "marketerId": marketer_id }),
            Self::GetContents { campaign_id } => json!({ "campaignId": campaign_id }),
            Self::GetReporting {
                marketer_id,
                range,
                campaign_id,
            } => {
                let mut params = json!({
                    "marketerId": marketer_id,
                    "from": range.from.format("%Y-%m-%d").to_string(),
                    "to": range.to.format("%Y-%m-%d").to_string(),
                });
                if let Some(id) = campaign_id {
                    params["campaignId"] = json!(id);
                }
                params
            }
            Self::SetCampaignEnabled { campaign_id, .. } => json!({ "campaignId": campaign_id }),
            Self::SetContentEnabled { content_id, .. } => json!({ "contentId": content_id }),
            Self::ChangeBudget {
                campaign_id,
                amount,
            } => json!({ "campaignId": campaign_id, "amount": amount.to_f64() }),
        }
    }

    /// Reads never change upstream state; only reads may be substituted by
    /// fallback data.
    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::GetMyMarketers
                | Self::GetCampaigns { .. }
                | Self::GetContents { .. }
                | Self::GetReporting { .. }
        )
    }
}
