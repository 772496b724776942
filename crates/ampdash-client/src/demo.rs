//! In-process upstream serving a fixed demo account in the demo record shape.
//!
//! Mutations are applied to the in-memory records, so toggles and budget
//! edits show up on the next read exactly as they would against the bridge.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use serde_json::{json, Value};

use crate::call::ApiCall;
use crate::client::Upstream;
use crate::error::ClientError;

pub const DEMO_MARKETER_ID: &str = "00037dfc4e76d2a5dbdd7ee00f0fd871e3";

/// Demo [`Upstream`]. Serves [`ampdash_core::SourceShape::Demo`] records.
#[derive(Debug)]
pub struct DemoUpstream {
    campaigns: Mutex<Vec<Value>>,
    paused_contents: Mutex<HashSet<String>>,
    outage: HashSet<String>,
}

impl Default for DemoUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoUpstream {
    #[must_use]
    pub fn new() -> Self {
        Self {
            campaigns: Mutex::new(demo_campaigns()),
            paused_contents: Mutex::new(HashSet::new()),
            outage: HashSet::new(),
        }
    }

    /// Makes every call whose wire name is in `calls` fail, simulating a
    /// bridge outage for those operations.
    #[must_use]
    pub fn with_outage<I, S>(mut self, calls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outage.extend(calls.into_iter().map(Into::into));
        self
    }

    fn answer(&self, call: &ApiCall) -> Result<Value, ClientError> {
        if self.outage.contains(call.name()) {
            return Err(ClientError::Api {
                call: call.name().to_owned(),
                message: "demo bridge unavailable".to_owned(),
            });
        }

        match call {
            ApiCall::GetMyMarketers => Ok(json!([{
                "id": DEMO_MARKETER_ID,
                "name": "Route Agency Limited",
                "enabled": true,
                "currency": "GBP"
            }])),
            ApiCall::GetCampaigns { marketer_id } => {
                if marketer_id != DEMO_MARKETER_ID {
                    return Ok(json!([]));
                }
                Ok(Value::Array(self.lock_campaigns().clone()))
            }
            ApiCall::GetContents { campaign_id } => {
                if !self.has_campaign(campaign_id) {
                    return Ok(json!([]));
                }
                let paused = self
                    .paused_contents
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let ads = CONTENT_HEADLINES
                    .iter()
                    .enumerate()
                    .map(|(i, headline)| {
                        let id = format!("content-{campaign_id}-{}", i + 1);
                        let status = if paused.contains(&id) { "PAUSED" } else { "ENABLED" };
                        json!({
                            "id": id,
                            "headline": headline,
                            "status": status,
                            "campaignId": campaign_id
                        })
                    })
                    .collect();
                Ok(Value::Array(ads))
            }
            ApiCall::GetReporting { campaign_id, .. } => Ok(match campaign_id {
                Some(id) if id == JUNE_ID => june_report(Some(id)),
                Some(id) => json!({
                    "id": id, "totalSpend": 0, "impressions": 0, "clicks": 0, "conversions": 0,
                    "ctr": 0, "cpc": 0, "cpa": 0, "conversionRate": 0
                }),
                None => june_report(None),
            }),
            ApiCall::SetCampaignEnabled {
                campaign_id,
                enabled,
            } => {
                let status = if *enabled { "ENABLED" } else { "PAUSED" };
                self.update_campaign(call, campaign_id, |c| {
                    c["enabled"] = json!(enabled);
                    c["status"] = json!(status);
                })
            }
            ApiCall::ChangeBudget {
                campaign_id,
                amount,
            } => {
                let amount = amount.to_string();
                self.update_campaign(call, campaign_id, |c| c["budget"] = json!(amount))
            }
            ApiCall::SetContentEnabled {
                content_id,
                enabled,
            } => {
                let known = self
                    .lock_campaigns()
                    .iter()
                    .filter_map(|c| c["id"].as_str())
                    .any(|cid| content_id.starts_with(&format!("content-{cid}-")));
                if !known {
                    return Err(not_found(call, content_id));
                }
                let mut paused = self
                    .paused_contents
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if *enabled {
                    paused.remove(content_id);
                } else {
                    paused.insert(content_id.clone());
                }
                Ok(json!({ "success": true }))
            }
        }
    }

    fn lock_campaigns(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.campaigns.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_campaign(&self, campaign_id: &str) -> bool {
        self.lock_campaigns()
            .iter()
            .any(|c| c["id"].as_str() == Some(campaign_id))
    }

    fn update_campaign(
        &self,
        call: &ApiCall,
        campaign_id: &str,
        apply: impl FnOnce(&mut Value),
    ) -> Result<Value, ClientError> {
        let mut campaigns = self.lock_campaigns();
        let campaign = campaigns
            .iter_mut()
            .find(|c| c["id"].as_str() == Some(campaign_id))
            .ok_or_else(|| not_found(call, campaign_id))?;
        apply(campaign);
        Ok(json!({ "success": true }))
    }
}

impl Upstream for DemoUpstream {
    async fn call(&self, call: &ApiCall) -> Result<Value, ClientError> {
        tracing::debug!(call = call.name(), "demo upstream call");
        self.answer(call)
    }
}

fn not_found(call: &ApiCall, id: &str) -> ClientError {
    ClientError::Api {
        call: call.name().to_owned(),
        message: format!("{id} not found"),
    }
}

const JUNE_ID: &str = "00e2e008dd9c2fffa3ef21ff551dacbc08";

const CONTENT_HEADLINES: [&str; 2] = [
    "Carents Room - Premium Content Discovery",
    "Discover Family-Friendly Spaces",
];

fn june_report(campaign_id: Option<&str>) -> Value {
    let mut report = json!({
        "totalSpend": 1295.32,
        "impressions": 2_840_000,
        "clicks": 115_640,
        "conversions": 1847,
        "ctr": 4.07,
        "cpc": 0.0112,
        "cpa": 0.70,
        "conversionRate": 1.60
    });
    if let Some(id) = campaign_id {
        report["id"] = json!(id);
    }
    report
}

#[allow(clippy::too_many_arguments)]
fn demo_campaign(
    id: &str,
    name: &str,
    enabled: bool,
    budget: u32,
    cpc: f64,
    dates: (&str, &str),
    platform: &[&str],
    delivery: Option<(f64, u64, u64)>,
) -> Value {
    let (amount_spent, clicks, impressions) = delivery.unwrap_or((0.0, 0, 0));
    json!({
        "id": id,
        "name": name,
        "status": if enabled { "ENABLED" } else { "PAUSED" },
        "budget": budget,
        "currency": "GBP",
        "enabled": enabled,
        "cpc": cpc,
        "startDate": dates.0,
        "endDate": dates.1,
        "platform": platform,
        "amountSpent": amount_spent,
        "onAir": delivery.is_some(),
        "clicks": clicks,
        "impressions": impressions
    })
}

fn demo_campaigns() -> Vec<Value> {
    const MOBILE: &[&str] = &["MOBILE", "TABLET"];
    vec![
        demo_campaign(
            "009be0ce07f9b8c6079cc0a6db14a990f9",
            "Carents Room Volume Mobile Traffic Campaign January 2025",
            false,
            1000,
            0.0131,
            ("2025-01-02", "2025-03-31"),
            MOBILE,
            None,
        ),
        demo_campaign(
            "000629a8028b8ef663ec9256460a71fbf0",
            "Carents Room Volume Mobile Traffic Campaign March 2025 Desktop",
            true,
            700,
            0.1778,
            ("2025-03-01", "2025-03-30"),
            &["DESKTOP"],
            None,
        ),
        demo_campaign(
            "00eac3edea4a45f262c1a2df3b873f87c8",
            "Carents Room Volume Mobile Traffic Campaign March 2025",
            true,
            1200,
            0.0355,
            ("2025-03-01", "2025-03-30"),
            MOBILE,
            None,
        ),
        demo_campaign(
            "00b5bddb99a62a5b093c1b06f2a214a73b",
            "Carents Room Traffic Campaign - April 2025",
            true,
            1000,
            0.0391,
            ("2025-04-04", "2025-04-30"),
            MOBILE,
            None,
        ),
        demo_campaign(
            "00dd289d1fb535f17d81454efd9a56a654",
            "Carents Room Traffic Campaign - May 2025",
            true,
            1550,
            0.7173,
            ("2025-05-01", "2025-05-31"),
            MOBILE,
            None,
        ),
        demo_campaign(
            JUNE_ID,
            "Carents Room Traffic Campaign - June 2025",
            true,
            1550,
            0.0112,
            ("2025-06-02", "2025-06-30"),
            MOBILE,
            Some((1295.32, 115_640, 2_840_000)),
        ),
    ]
}
