//! Normalization from raw upstream payloads to the canonical model.
//!
//! Each supported upstream shape has its own decoder; [`SourceShape`] picks
//! one at the call site. Adding a shape means adding a raw type in
//! [`crate::types`], a decoder here, and a `SourceShape` variant.
//!
//! Batch decoders fail on the first record without an identifier, because
//! every downstream lookup is keyed by id. All other fields fall back to
//! their documented defaults.

use std::collections::BTreeSet;

use ampdash_core::reporting::{percentage, ratio, CPA_DP, CPC_DP};
use ampdash_core::{
    Budget, Campaign, CampaignStatus, Content, Marketer, Platform, ReportingSnapshot, SourceShape,
    DEFAULT_CURRENCY,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::NormalizeError;
use crate::types::{
    DemoCampaign, DemoContent, LiveCampaign, LiveContent, RawMarketer, RawReporting,
};

const MARKETER: &str = "marketer";
const CAMPAIGN: &str = "campaign";
const CONTENT: &str = "content";
const REPORTING: &str = "reporting";

/// Decodes a `getMyMarketers` payload.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the payload is not a list or any record
/// lacks an id.
pub fn decode_marketers(payload: Value) -> Result<Vec<Marketer>, NormalizeError> {
    records(payload, MARKETER, &["marketers", "results"])?
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let raw: RawMarketer = parse_record(record, MARKETER, index)?;
            let id = raw.id.ok_or(NormalizeError::MissingId {
                entity: MARKETER,
                index,
            })?;
            Ok(Marketer {
                id,
                name: raw.name,
                enabled: raw.enabled.unwrap_or(true),
                currency: raw
                    .currency
                    .map_or_else(|| DEFAULT_CURRENCY.to_owned(), |c| c.to_ascii_uppercase()),
            })
        })
        .collect()
}

/// Decodes a `getCampaigns` payload of the given shape.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the payload is not a list or any record
/// lacks an id.
pub fn decode_campaigns(
    shape: SourceShape,
    payload: Value,
) -> Result<Vec<Campaign>, NormalizeError> {
    records(payload, CAMPAIGN, &["campaigns", "results"])?
        .into_iter()
        .enumerate()
        .map(|(index, record)| decode_campaign(shape, record, index))
        .collect()
}

/// Decodes one campaign record; `index` is only used in error reports.
///
/// # Errors
///
/// Returns [`NormalizeError::MissingId`] or [`NormalizeError::NotAnObject`].
pub fn decode_campaign(
    shape: SourceShape,
    record: Value,
    index: usize,
) -> Result<Campaign, NormalizeError> {
    match shape {
        SourceShape::Demo => from_demo_campaign(parse_record(record, CAMPAIGN, index)?, index),
        SourceShape::Live => from_live_campaign(parse_record(record, CAMPAIGN, index)?, index),
    }
}

fn from_demo_campaign(raw: DemoCampaign, index: usize) -> Result<Campaign, NormalizeError> {
    let id = raw.id.ok_or(NormalizeError::MissingId {
        entity: CAMPAIGN,
        index,
    })?;
    let status = status_of(raw.enabled, raw.status.as_deref());

    Ok(Campaign {
        status,
        budget: Budget {
            amount: non_negative(raw.budget),
            currency: raw.currency,
        },
        cpc: non_negative(raw.cpc),
        start_date: parse_date(&raw.start_date),
        end_date: parse_date(&raw.end_date),
        platform: parse_platforms(&raw.platform, &id),
        amount_spent: non_negative(raw.amount_spent),
        on_air: raw.on_air,
        clicks: raw.clicks,
        impressions: raw.impressions,
        name: raw.name,
        id,
    })
}

/// Live records carry no delivery counters; `clicks` and `impressions` start
/// at zero and are filled by a reporting lookup afterwards.
fn from_live_campaign(raw: LiveCampaign, index: usize) -> Result<Campaign, NormalizeError> {
    let id = raw.id.ok_or(NormalizeError::MissingId {
        entity: CAMPAIGN,
        index,
    })?;

    Ok(Campaign {
        status: CampaignStatus::from_enabled(raw.enabled),
        budget: Budget {
            amount: non_negative(raw.budget.amount),
            currency: raw.budget.currency,
        },
        cpc: non_negative(raw.cpc),
        start_date: parse_date(&raw.budget.start_date),
        end_date: parse_date(&raw.budget.end_date),
        platform: parse_platforms(&raw.targeting.platform, &id),
        amount_spent: non_negative(raw.live_status.amount_spent),
        on_air: raw.live_status.campaign_on_air,
        clicks: 0,
        impressions: 0,
        name: raw.name,
        id,
    })
}

/// Decodes a `getContents` payload for `campaign_id`.
///
/// Records without their own `campaignId` are attributed to `campaign_id`.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the payload is not a list or any record
/// lacks an id.
pub fn decode_contents(
    shape: SourceShape,
    payload: Value,
    campaign_id: &str,
) -> Result<Vec<Content>, NormalizeError> {
    records(payload, CONTENT, &["promotedLinks", "contents", "results"])?
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let (id, headline, status, owner) = match shape {
                SourceShape::Demo => {
                    let raw: DemoContent = parse_record(record, CONTENT, index)?;
                    let status = status_of(raw.enabled, raw.status.as_deref());
                    (raw.id, raw.headline, status, raw.campaign_id)
                }
                SourceShape::Live => {
                    let raw: LiveContent = parse_record(record, CONTENT, index)?;
                    let status = CampaignStatus::from_enabled(raw.enabled);
                    (raw.id, raw.text, status, raw.campaign_id)
                }
            };
            let id = id.ok_or(NormalizeError::MissingId {
                entity: CONTENT,
                index,
            })?;
            Ok(Content {
                id,
                headline,
                status,
                campaign_id: owner.unwrap_or_else(|| campaign_id.to_owned()),
            })
        })
        .collect()
}

/// Decodes a `getReporting` payload.
///
/// Accepts a single record object; `null` or `{}` is an empty snapshot.
/// Ratio fields missing upstream are derived from the totals. When a
/// campaign was requested and the record names none, the request's id is
/// used.
///
/// # Errors
///
/// Returns [`NormalizeError::UnexpectedPayload`] for non-object payloads.
pub fn decode_reporting(
    payload: Value,
    campaign_id: Option<&str>,
) -> Result<ReportingSnapshot, NormalizeError> {
    let payload = match payload {
        Value::Null => Value::Object(serde_json::Map::new()),
        Value::Object(mut map) => match map.remove("summary") {
            Some(inner @ Value::Object(_)) => inner,
            Some(_) | None => Value::Object(map),
        },
        other => {
            return Err(NormalizeError::UnexpectedPayload {
                entity: REPORTING,
                found: kind(&other),
            })
        }
    };
    let raw: RawReporting = serde_json::from_value(payload).unwrap_or_default();

    Ok(ReportingSnapshot {
        campaign_id: raw.id.or_else(|| campaign_id.map(str::to_owned)),
        total_spend: non_negative(raw.total_spend),
        impressions: raw.impressions,
        clicks: raw.clicks,
        conversions: raw.conversions,
        ctr: raw
            .ctr
            .unwrap_or_else(|| percentage(raw.clicks, raw.impressions)),
        cpc: raw
            .cpc
            .unwrap_or_else(|| ratio(raw.total_spend, raw.clicks, CPC_DP)),
        cpa: raw
            .cpa
            .unwrap_or_else(|| ratio(raw.total_spend, raw.conversions, CPA_DP)),
        conversion_rate: raw
            .conversion_rate
            .unwrap_or_else(|| percentage(raw.conversions, raw.clicks)),
    })
}

/// Maps the enabled flag onto a status, falling back to a status label.
fn status_of(enabled: Option<bool>, label: Option<&str>) -> CampaignStatus {
    match (enabled, label) {
        (Some(flag), _) => CampaignStatus::from_enabled(flag),
        (None, Some(label)) => {
            CampaignStatus::from_enabled(label.trim().eq_ignore_ascii_case("ENABLED"))
        }
        (None, None) => CampaignStatus::Paused,
    }
}

/// Parses `"YYYY-MM-DD"`, also accepting a full timestamp by its date prefix.
///
/// Returns `None` for empty or unparseable input.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").ok()))
}

fn parse_platforms(labels: &[String], campaign_id: &str) -> BTreeSet<Platform> {
    labels
        .iter()
        .filter_map(|label| {
            let parsed = Platform::parse(label);
            if parsed.is_none() {
                tracing::warn!(campaign = %campaign_id, platform = %label, "ignoring unknown platform");
            }
            parsed
        })
        .collect()
}

fn non_negative(d: Decimal) -> Decimal {
    d.max(Decimal::ZERO)
}

/// Extracts the record list from a bare array or a wrapper object keyed by
/// one of `keys`.
fn records(
    payload: Value,
    entity: &'static str,
    keys: &[&str],
) -> Result<Vec<Value>, NormalizeError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            let list = keys.iter().find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            });
            list.ok_or(NormalizeError::NotAList {
                entity,
                found: "object",
            })
        }
        other => Err(NormalizeError::NotAList {
            entity,
            found: kind(&other),
        }),
    }
}

fn parse_record<T: DeserializeOwned>(
    record: Value,
    entity: &'static str,
    index: usize,
) -> Result<T, NormalizeError> {
    if !record.is_object() {
        return Err(NormalizeError::NotAnObject { entity, index });
    }
    serde_json::from_value(record).map_err(|_| NormalizeError::NotAnObject { entity, index })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
