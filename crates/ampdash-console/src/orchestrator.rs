//! The data orchestrator: the only writer of [`ConsoleState`].
//!
//! Every operation takes `&self`, so overlapping calls are possible. State
//! lives behind a mutex that is only ever locked between awaits, and each
//! collection carries a [`RequestSeq`] so a response that arrives after a
//! newer request for the same collection is dropped instead of applied.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ampdash_client::{
    decode_campaigns, decode_contents, decode_marketers, decode_reporting, ApiCall,
    NormalizeError, Upstream,
};
use ampdash_core::{AppConfig, Campaign, Content, DateRange, ReportingSnapshot, SourceShape};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::ConsoleError;
use crate::fallback::{FallbackData, Substitute};
use crate::state::{ConsoleState, DataSource, ReportState, RequestSeq};
use crate::view::{MonthFilter, StatusFilter};

/// Upper bound on per-campaign fetches in flight during one campaign load.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Whether a completed request changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request for the same collection was issued meanwhile; the
    /// response (or error) was discarded.
    Superseded,
}

struct Inner {
    state: ConsoleState,
    marketers_seq: RequestSeq,
    campaigns_seq: RequestSeq,
    reporting_seq: RequestSeq,
    loads_in_flight: u32,
}

impl Inner {
    fn begin_load(&mut self) {
        self.loads_in_flight += 1;
        self.state.loading = true;
    }

    fn finish_load(&mut self) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        self.state.loading = self.loads_in_flight > 0;
    }

    fn surface(&mut self, err: ConsoleError) -> ConsoleError {
        self.state.error = Some(err.to_string());
        err
    }
}

/// A freshly fetched campaign list with its per-campaign contents.
struct CampaignView {
    campaigns: Vec<Campaign>,
    contents: BTreeMap<String, Vec<Content>>,
    source: DataSource,
    contents_source: DataSource,
}

#[derive(Default)]
struct ContentFetch {
    contents: Vec<Content>,
    fallback_reason: Option<String>,
}

/// Campaign console over an [`Upstream`].
pub struct Console<U> {
    upstream: U,
    shape: SourceShape,
    fallback: Option<FallbackData>,
    inner: Mutex<Inner>,
}

impl<U: Upstream> Console<U> {
    /// Creates a console with fallback substitution enabled.
    pub fn new(upstream: U, shape: SourceShape, date_range: DateRange) -> Self {
        Self {
            upstream,
            shape,
            fallback: Some(FallbackData),
            inner: Mutex::new(Inner {
                state: ConsoleState::new(date_range),
                marketers_seq: RequestSeq::default(),
                campaigns_seq: RequestSeq::default(),
                reporting_seq: RequestSeq::default(),
                loads_in_flight: 0,
            }),
        }
    }

    /// Creates a console configured by `config`, reporting over the
    /// configured trailing window ending on `today`.
    pub fn from_config(upstream: U, config: &AppConfig, today: NaiveDate) -> Self {
        let range = DateRange::trailing_days(today, config.report_window_days);
        Self::new(upstream, config.source_shape, range).with_fallback(config.fallback_enabled)
    }

    #[must_use]
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled.then_some(FallbackData);
        self
    }

    #[must_use]
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        self.lock().state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn surface(&self, err: ConsoleError) -> ConsoleError {
        self.lock().surface(err)
    }

    fn require_marketer(&self) -> Result<String, ConsoleError> {
        let mut inner = self.lock();
        match inner.state.selected_marketer.clone() {
            Some(id) => Ok(id),
            None => Err(inner.surface(ConsoleError::NoMarketerSelected)),
        }
    }

    // -----------------------------------------------------------------------
    // loads
    // -----------------------------------------------------------------------

    /// Loads marketers, then campaigns for the selected one.
    ///
    /// # Errors
    ///
    /// Returns the first failing load's error.
    pub async fn bootstrap(&self) -> Result<Outcome, ConsoleError> {
        self.load_marketers().await?;
        let selected = self.lock().state.selected_marketer.clone();
        match selected {
            Some(id) => self.load_campaigns(&id).await,
            None => Ok(Outcome::Applied),
        }
    }

    /// Fetches marketers and selects the first one when nothing is selected.
    /// On failure previously loaded marketers are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] when the read fails without a fallback or
    /// the payload cannot be decoded.
    pub async fn load_marketers(&self) -> Result<Outcome, ConsoleError> {
        let ticket = {
            let mut inner = self.lock();
            inner.begin_load();
            inner.marketers_seq.issue()
        };

        let result = self
            .read(ApiCall::GetMyMarketers, decode_marketers, |s| match s {
                Substitute::Marketers(m) => Some(m),
                _ => None,
            })
            .await;

        let mut inner = self.lock();
        inner.finish_load();
        if !inner.marketers_seq.is_current(ticket) {
            tracing::debug!(collection = "marketers", "discarding superseded response");
            return Ok(Outcome::Superseded);
        }
        match result {
            Ok((marketers, source)) => {
                tracing::info!(count = marketers.len(), "marketers loaded");
                if inner.state.selected_marketer.is_none() {
                    inner.state.selected_marketer = marketers.first().map(|m| m.id.clone());
                }
                inner.state.marketers = marketers;
                inner.state.sources.marketers = source;
                Ok(Outcome::Applied)
            }
            Err(err) => Err(inner.surface(err)),
        }
    }

    /// Replaces the campaign list for `marketer_id` and fetches every
    /// campaign's contents concurrently. A failed content fetch leaves that
    /// campaign with no ads and does not fail the load.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] when the campaign read fails without a
    /// fallback or cannot be decoded; prior campaigns are then kept.
    pub async fn load_campaigns(&self, marketer_id: &str) -> Result<Outcome, ConsoleError> {
        let (ticket, range) = {
            let mut inner = self.lock();
            inner.begin_load();
            (inner.campaigns_seq.issue(), inner.state.date_range)
        };

        let result = self.fetch_campaign_view(marketer_id, range).await;

        let mut inner = self.lock();
        inner.finish_load();
        if !inner.campaigns_seq.is_current(ticket) {
            tracing::debug!(
                collection = "campaigns",
                marketer = %marketer_id,
                "discarding superseded response"
            );
            return Ok(Outcome::Superseded);
        }
        match result {
            Ok(view) => {
                tracing::info!(
                    marketer = %marketer_id,
                    campaigns = view.campaigns.len(),
                    fallback = view.source.is_fallback(),
                    "campaigns loaded"
                );
                let state = &mut inner.state;
                let still_listed = state
                    .selected_campaign
                    .as_deref()
                    .is_none_or(|id| view.campaigns.iter().any(|c| c.id == id));
                if !still_listed {
                    state.selected_campaign = None;
                }
                state.campaigns = view.campaigns;
                state.contents = view.contents;
                state.sources.campaigns = view.source;
                state.sources.contents = view.contents_source;
                Ok(Outcome::Applied)
            }
            Err(err) => Err(inner.surface(err)),
        }
    }

    /// Selects a marketer, drops its predecessor's report, and reloads
    /// campaigns.
    ///
    /// # Errors
    ///
    /// Propagates [`Console::load_campaigns`] errors.
    pub async fn select_marketer(&self, marketer_id: &str) -> Result<Outcome, ConsoleError> {
        {
            let mut inner = self.lock();
            inner.state.selected_marketer = Some(marketer_id.to_owned());
            inner.state.selected_campaign = None;
            inner.state.report = ReportState::Idle;
            inner.state.sources.reporting = DataSource::Live;
            // Any report still in flight belongs to the previous marketer.
            inner.reporting_seq.issue();
        }
        self.load_campaigns(marketer_id).await
    }

    /// Reloads campaigns for the selected marketer.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::NoMarketerSelected`], or any load error.
    pub async fn refresh(&self) -> Result<Outcome, ConsoleError> {
        let marketer_id = self.require_marketer()?;
        self.load_campaigns(&marketer_id).await
    }

    async fn fetch_campaign_view(
        &self,
        marketer_id: &str,
        range: DateRange,
    ) -> Result<CampaignView, ConsoleError> {
        let shape = self.shape;
        let (mut campaigns, source) = self
            .read(
                ApiCall::GetCampaigns {
                    marketer_id: marketer_id.to_owned(),
                },
                |payload| decode_campaigns(shape, payload),
                |s| match s {
                    Substitute::Campaigns(c) => Some(c),
                    _ => None,
                },
            )
            .await?;

        // Live records carry no delivery counters; fallback records already do.
        let with_metrics = shape == SourceShape::Live && !source.is_fallback();

        let fetched: Vec<(usize, ContentFetch, Option<ReportingSnapshot>)> =
            stream::iter(campaigns.iter().enumerate())
                .map(|(index, campaign)| async move {
                    let metrics = async {
                        if with_metrics {
                            self.fetch_metrics(marketer_id, campaign, range).await
                        } else {
                            None
                        }
                    };
                    let (contents, metrics) =
                        futures::join!(self.fetch_contents(&campaign.id), metrics);
                    (index, contents, metrics)
                })
                .buffer_unordered(MAX_CONCURRENT_FETCHES)
                .collect()
                .await;

        let mut contents = BTreeMap::new();
        let mut contents_source = DataSource::Live;
        for (index, fetch, metrics) in fetched {
            let campaign = &mut campaigns[index];
            if let Some(snapshot) = metrics {
                campaign.clicks = snapshot.clicks;
                campaign.impressions = snapshot.impressions;
            }
            if let Some(reason) = fetch.fallback_reason {
                contents_source = DataSource::Fallback { reason };
            }
            contents.insert(campaign.id.clone(), fetch.contents);
        }

        Ok(CampaignView {
            campaigns,
            contents,
            source,
            contents_source,
        })
    }

    async fn fetch_contents(&self, campaign_id: &str) -> ContentFetch {
        let shape = self.shape;
        let result = self
            .read(
                ApiCall::GetContents {
                    campaign_id: campaign_id.to_owned(),
                },
                |payload| decode_contents(shape, payload, campaign_id),
                |s| match s {
                    Substitute::Contents(c) => Some(c),
                    _ => None,
                },
            )
            .await;

        match result {
            Ok((contents, DataSource::Live)) => ContentFetch {
                contents,
                fallback_reason: None,
            },
            Ok((contents, DataSource::Fallback { reason })) => ContentFetch {
                contents,
                fallback_reason: Some(reason),
            },
            Err(err) => {
                tracing::warn!(
                    campaign = %campaign_id,
                    error = %err,
                    "content fetch failed, showing no ads for this campaign"
                );
                ContentFetch::default()
            }
        }
    }

    /// Per-campaign delivery counters over the campaign's own flight dates,
    /// or `range` when those are unknown.
    async fn fetch_metrics(
        &self,
        marketer_id: &str,
        campaign: &Campaign,
        range: DateRange,
    ) -> Option<ReportingSnapshot> {
        let window = match (campaign.start_date, campaign.end_date) {
            (Some(from), Some(to)) => DateRange::new(from, to).unwrap_or(range),
            _ => range,
        };
        let call = ApiCall::GetReporting {
            marketer_id: marketer_id.to_owned(),
            range: window,
            campaign_id: Some(campaign.id.clone()),
        };

        let result = match self.upstream.call(&call).await {
            Ok(payload) => decode_reporting(payload, Some(campaign.id.as_str()))
                .map_err(ConsoleError::from),
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(
                    campaign = %campaign.id,
                    error = %err,
                    "delivery lookup failed, clicks and impressions left at zero"
                );
                None
            }
        }
    }

    /// Issues a read, substituting fallback data when the upstream call
    /// fails. Decode failures are never substituted.
    async fn read<T>(
        &self,
        call: ApiCall,
        decode: impl FnOnce(Value) -> Result<T, NormalizeError>,
        pick: impl FnOnce(Substitute) -> Option<T>,
    ) -> Result<(T, DataSource), ConsoleError> {
        match self.upstream.call(&call).await {
            Ok(payload) => Ok((decode(payload)?, DataSource::Live)),
            Err(err) => {
                let substitute = self
                    .fallback
                    .filter(|_| call.is_read())
                    .and_then(|data| data.substitute(&call))
                    .and_then(pick);
                match substitute {
                    Some(value) => {
                        tracing::warn!(
                            call = call.name(),
                            error = %err,
                            "upstream read failed, serving fallback data"
                        );
                        Ok((
                            value,
                            DataSource::Fallback {
                                reason: err.to_string(),
                            },
                        ))
                    }
                    None => Err(err.into()),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // reporting
    // -----------------------------------------------------------------------

    /// Fetches a reporting snapshot. State is `Loading` until the latest
    /// issued request completes; on failure it returns to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] when the read fails without a fallback or
    /// cannot be decoded.
    pub async fn generate_report(
        &self,
        marketer_id: &str,
        range: DateRange,
        campaign_id: Option<&str>,
    ) -> Result<Outcome, ConsoleError> {
        let ticket = {
            let mut inner = self.lock();
            inner.state.report = ReportState::Loading;
            inner.reporting_seq.issue()
        };

        let call = ApiCall::GetReporting {
            marketer_id: marketer_id.to_owned(),
            range,
            campaign_id: campaign_id.map(str::to_owned),
        };
        let result = self
            .read(
                call,
                |payload| decode_reporting(payload, campaign_id),
                |s| match s {
                    Substitute::Reporting(r) => Some(r),
                    _ => None,
                },
            )
            .await;

        let mut inner = self.lock();
        if !inner.reporting_seq.is_current(ticket) {
            tracing::debug!(collection = "reporting", "discarding superseded response");
            return Ok(Outcome::Superseded);
        }
        match result {
            Ok((snapshot, source)) => {
                inner.state.report = ReportState::Ready(snapshot);
                inner.state.sources.reporting = source;
                Ok(Outcome::Applied)
            }
            Err(err) => {
                inner.state.report = ReportState::Idle;
                Err(inner.surface(err))
            }
        }
    }

    /// Generates a report for the selected marketer over the stored date
    /// range, scoped to the selected campaign if any.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::NoMarketerSelected`], or any report error.
    pub async fn generate_report_for_selection(&self) -> Result<Outcome, ConsoleError> {
        let marketer_id = self.require_marketer()?;
        let (range, campaign_id) = {
            let inner = self.lock();
            (inner.state.date_range, inner.state.selected_campaign.clone())
        };
        self.generate_report(&marketer_id, range, campaign_id.as_deref())
            .await
    }

    // -----------------------------------------------------------------------
    // mutations
    // -----------------------------------------------------------------------

    /// Validates `input` as a non-negative amount, changes the budget
    /// upstream, then reloads campaigns. Invalid input never reaches the
    /// upstream.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::InvalidBudget`], [`ConsoleError::NoMarketerSelected`],
    /// the upstream failure, or a reload error.
    pub async fn update_budget(&self, campaign_id: &str, input: &str) -> Result<(), ConsoleError> {
        let amount = parse_budget(input).map_err(|e| self.surface(e))?;
        let marketer_id = self.require_marketer()?;
        self.mutate(ApiCall::ChangeBudget {
            campaign_id: campaign_id.to_owned(),
            amount,
        })
        .await?;
        self.load_campaigns(&marketer_id).await?;
        Ok(())
    }

    /// Flips a campaign's enablement and reloads campaigns.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::NoMarketerSelected`], the upstream failure (state is
    /// left untouched), or a reload error.
    pub async fn toggle_campaign(
        &self,
        campaign_id: &str,
        currently_enabled: bool,
    ) -> Result<(), ConsoleError> {
        let marketer_id = self.require_marketer()?;
        self.mutate(ApiCall::SetCampaignEnabled {
            campaign_id: campaign_id.to_owned(),
            enabled: !currently_enabled,
        })
        .await?;
        self.load_campaigns(&marketer_id).await?;
        Ok(())
    }

    /// Flips an ad's enablement and reloads campaigns.
    ///
    /// # Errors
    ///
    /// Same as [`Console::toggle_campaign`].
    pub async fn toggle_content(
        &self,
        content_id: &str,
        currently_enabled: bool,
    ) -> Result<(), ConsoleError> {
        let marketer_id = self.require_marketer()?;
        self.mutate(ApiCall::SetContentEnabled {
            content_id: content_id.to_owned(),
            enabled: !currently_enabled,
        })
        .await?;
        self.load_campaigns(&marketer_id).await?;
        Ok(())
    }

    async fn mutate(&self, call: ApiCall) -> Result<(), ConsoleError> {
        match self.upstream.call(&call).await {
            Ok(_) => {
                tracing::info!(call = call.name(), "upstream change applied");
                Ok(())
            }
            Err(err) => Err(self.surface(err.into())),
        }
    }

    // -----------------------------------------------------------------------
    // local selection and filters
    // -----------------------------------------------------------------------

    pub fn select_campaign(&self, campaign_id: Option<&str>) {
        self.lock().state.selected_campaign = campaign_id.map(str::to_owned);
    }

    pub fn set_month_filter(&self, filter: MonthFilter) {
        self.lock().state.month_filter = filter;
    }

    pub fn set_status_filter(&self, filter: StatusFilter) {
        self.lock().state.status_filter = filter;
    }

    /// Sets the report date range.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::InvalidDateRange`] when `from` is after `to`; the
    /// stored range is unchanged.
    pub fn set_date_range(&self, from: NaiveDate, to: NaiveDate) -> Result<(), ConsoleError> {
        let mut inner = self.lock();
        match DateRange::new(from, to) {
            Ok(range) => {
                inner.state.date_range = range;
                Ok(())
            }
            Err(err) => Err(inner.surface(err.into())),
        }
    }

    pub fn dismiss_error(&self) {
        self.lock().state.error = None;
    }
}

/// Parses operator budget input: trimmed, decimal, and not negative.
///
/// # Errors
///
/// [`ConsoleError::InvalidBudget`] describing the rejection.
pub fn parse_budget(input: &str) -> Result<Decimal, ConsoleError> {
    let invalid = |reason: String| ConsoleError::InvalidBudget {
        input: input.to_owned(),
        reason,
    };
    let amount = Decimal::from_str(input.trim()).map_err(|e| invalid(e.to_string()))?;
    if amount < Decimal::ZERO {
        return Err(invalid("must not be negative".to_owned()));
    }
    Ok(amount)
}
