//! The explicit console state object and per-collection request sequencing.

use std::collections::BTreeMap;

use ampdash_core::{Campaign, Content, DateRange, Marketer, ReportingSnapshot};

use crate::view::{self, Aggregates, MonthFilter, StatusFilter};

/// Where a collection's current contents came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Live,
    /// Substituted by the fallback dataset after the upstream read failed.
    Fallback { reason: String },
}

impl DataSource {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Out-of-band provenance for each canonical collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sources {
    pub marketers: DataSource,
    pub campaigns: DataSource,
    pub contents: DataSource,
    pub reporting: DataSource,
}

/// Reporting lifecycle: `Idle -> Loading -> Ready | Idle` (with the error
/// banner set).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportState {
    #[default]
    Idle,
    Loading,
    Ready(ReportingSnapshot),
}

impl ReportState {
    #[must_use]
    pub fn snapshot(&self) -> Option<&ReportingSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            Self::Idle | Self::Loading => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Everything the presentation layer reads. Mutated only by
/// [`crate::Console`] operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleState {
    pub marketers: Vec<Marketer>,
    pub selected_marketer: Option<String>,
    pub campaigns: Vec<Campaign>,
    /// One entry per campaign in `campaigns`, possibly empty.
    pub contents: BTreeMap<String, Vec<Content>>,
    pub report: ReportState,
    pub selected_campaign: Option<String>,
    pub month_filter: MonthFilter,
    pub status_filter: StatusFilter,
    pub date_range: DateRange,
    /// True while any marketer or campaign load is in flight.
    pub loading: bool,
    /// Dismissible error banner.
    pub error: Option<String>,
    pub sources: Sources,
}

impl ConsoleState {
    #[must_use]
    pub fn new(date_range: DateRange) -> Self {
        Self {
            marketers: Vec::new(),
            selected_marketer: None,
            campaigns: Vec::new(),
            contents: BTreeMap::new(),
            report: ReportState::Idle,
            selected_campaign: None,
            month_filter: MonthFilter::All,
            status_filter: StatusFilter::All,
            date_range,
            loading: false,
            error: None,
            sources: Sources::default(),
        }
    }

    #[must_use]
    pub fn marketer(&self) -> Option<&Marketer> {
        let id = self.selected_marketer.as_deref()?;
        self.marketers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn campaign(&self, id: &str) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    /// Campaigns passing the stored month and status filters.
    #[must_use]
    pub fn filtered_campaigns(&self) -> Vec<&Campaign> {
        view::filtered_campaigns(&self.campaigns, self.month_filter, self.status_filter)
    }

    #[must_use]
    pub fn aggregates(&self) -> Aggregates {
        view::aggregates(&self.campaigns, &self.contents)
    }

    /// Whether any collection currently shows fallback data.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        let s = &self.sources;
        s.marketers.is_fallback()
            || s.campaigns.is_fallback()
            || s.contents.is_fallback()
            || s.reporting.is_fallback()
    }
}

/// Proof that a request was issued; compared against the latest issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic request counter for one collection. Only the response to the
/// most recently issued request may be applied.
#[derive(Debug, Default)]
pub struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}
