//! Canonical marketer, campaign, and content entities.
//!
//! These are the only shapes the console and view layers ever see. Upstream
//! payloads of every supported shape are decoded into them by the client
//! crate's normalizer, and the fallback dataset is built from them directly.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An advertiser account; the top-level scope for campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marketer {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// ISO-4217 code, e.g. `"GBP"`.
    pub currency: String,
}

impl Marketer {
    /// Name for display, falling back to the opaque id when the name is blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Enablement status shared by campaigns and content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Enabled,
    Paused,
}

impl CampaignStatus {
    /// Projects the upstream `enabled` flag onto a status.
    #[must_use]
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Paused
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device class a campaign targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Mobile,
    Tablet,
    Desktop,
}

impl Platform {
    /// Parses an upstream platform label, case-insensitively.
    ///
    /// Returns `None` for labels outside the known set.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "MOBILE" => Some(Self::Mobile),
            "TABLET" => Some(Self::Tablet),
            "DESKTOP" => Some(Self::Desktop),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "MOBILE",
            Self::Tablet => "TABLET",
            Self::Desktop => "DESKTOP",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget amount plus the currency it is denominated in, when known.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Budget {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

/// A budgeted, time-bounded advertising effort.
///
/// `status` mirrors the upstream `enabled` flag and nothing else. `on_air` is
/// an independent upstream signal: an enabled campaign outside its date window
/// is `Enabled` but not on air.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub status: CampaignStatus,
    pub budget: Budget,
    pub cpc: Decimal,
    #[serde(with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    pub platform: BTreeSet<Platform>,
    pub amount_spent: Decimal,
    pub on_air: bool,
    pub clicks: u64,
    pub impressions: u64,
}

impl Campaign {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }
}

/// An individual ad creative belonging to a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub headline: String,
    pub status: CampaignStatus,
    pub campaign_id: String,
}

/// Serialises `Option<NaiveDate>` as `"YYYY-MM-DD"` or `""`.
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), FORMAT).ok()))
    }
}
