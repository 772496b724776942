//! Scenario tests for `Console` against a scripted in-memory upstream.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use ampdash_client::{ApiCall, ClientError, Upstream};
use ampdash_console::{
    Console, ConsoleError, DataSource, Outcome, ReportState, StatusFilter, FALLBACK_CAMPAIGN_ID,
};
use ampdash_core::{CampaignStatus, DateRange, SourceShape};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

struct Reply {
    result: Result<Value, String>,
    delay_ms: u64,
}

/// Answers calls from per-key reply queues. The last reply of a queue is
/// sticky; unscripted calls fail.
#[derive(Default)]
struct ScriptedUpstream {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<ApiCall>>,
}

fn key(call: &ApiCall) -> String {
    let id = match call {
        ApiCall::GetMyMarketers => "",
        ApiCall::GetCampaigns { marketer_id } => marketer_id.as_str(),
        ApiCall::GetContents { campaign_id }
        | ApiCall::SetCampaignEnabled { campaign_id, .. }
        | ApiCall::ChangeBudget { campaign_id, .. } => campaign_id.as_str(),
        ApiCall::GetReporting { campaign_id, .. } => campaign_id.as_deref().unwrap_or(""),
        ApiCall::SetContentEnabled { content_id, .. } => content_id.as_str(),
    };
    format!("{}:{id}", call.name())
}

impl ScriptedUpstream {
    fn push(self, key: &str, result: Result<Value, &str>, delay_ms: u64) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(key.to_owned())
            .or_default()
            .push_back(Reply {
                result: result.map_err(str::to_owned),
                delay_ms,
            });
        self
    }

    fn ok(self, key: &str, payload: Value) -> Self {
        self.push(key, Ok(payload), 0)
    }

    fn fail(self, key: &str) -> Self {
        self.push(key, Err("bridge unavailable"), 0)
    }

    fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.name() == name).count()
    }

    fn next_reply(&self, call: &ApiCall) -> (Result<Value, String>, u64) {
        let mut replies = self.replies.lock().unwrap();
        let Some(queue) = replies.get_mut(&key(call)) else {
            return (Err(format!("unscripted call {}", key(call))), 0);
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|r| Reply {
                result: r.result.clone(),
                delay_ms: r.delay_ms,
            })
        };
        reply.map_or_else(
            || (Err("empty script".to_owned()), 0),
            |r| (r.result, r.delay_ms),
        )
    }
}

impl Upstream for ScriptedUpstream {
    async fn call(&self, call: &ApiCall) -> Result<Value, ClientError> {
        self.calls.lock().unwrap().push(call.clone());
        let (result, delay_ms) = self.next_reply(call);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        result.map_err(|message| ClientError::Api {
            call: call.name().to_owned(),
            message,
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn range() -> DateRange {
    DateRange::new(date(2025, 6, 1), date(2025, 6, 30)).unwrap()
}

fn console(upstream: ScriptedUpstream, shape: SourceShape) -> Console<ScriptedUpstream> {
    Console::new(upstream, shape, range())
}

fn marketers() -> Value {
    json!([{ "id": "m-route", "name": "Route Agency Limited", "currency": "GBP" }])
}

fn demo_campaign(id: &str, enabled: bool, on_air: bool, budget: u32) -> Value {
    json!({
        "id": id,
        "name": format!("campaign {id}"),
        "enabled": enabled,
        "budget": budget,
        "startDate": "2025-06-02",
        "endDate": "2025-06-30",
        "platform": ["MOBILE"],
        "amountSpent": 10,
        "onAir": on_air,
        "clicks": 5,
        "impressions": 100
    })
}

fn demo_ads(campaign_id: &str) -> Value {
    json!([
        { "id": format!("{campaign_id}-ad-1"), "headline": "one", "status": "ENABLED" },
        { "id": format!("{campaign_id}-ad-2"), "headline": "two", "status": "PAUSED" }
    ])
}

/// One marketer with one demo campaign `c1` and its ads.
fn single_campaign_upstream() -> ScriptedUpstream {
    ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok("getCampaigns:m-route", json!([demo_campaign("c1", true, true, 500)]))
        .ok("getContents:c1", demo_ads("c1"))
}

// ---------------------------------------------------------------------------
// loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_campaign_load_falls_back_to_june_campaign() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .fail("getCampaigns:m-route");
    let console = console(upstream, SourceShape::Live);

    console.bootstrap().await.expect("fallback should absorb the failure");

    let state = console.state();
    assert_eq!(state.selected_marketer.as_deref(), Some("m-route"));
    assert_eq!(state.marketer().unwrap().name, "Route Agency Limited");
    assert_eq!(state.campaigns.len(), 1);
    assert!(state.campaigns[0].name.ends_with("June 2025"));
    assert!(state.campaigns[0].on_air);
    assert!(state.sources.campaigns.is_fallback());
    assert_eq!(state.sources.marketers, DataSource::Live);
    assert!(state.error.is_none());

    let totals = state.aggregates();
    assert_eq!(totals.total_budget, Decimal::new(155_000, 2));
    assert_eq!(totals.total_spent, Decimal::new(129_532, 2));
    assert_eq!(totals.active_campaigns, 1);
    assert_eq!(totals.live_ads, 2, "fallback ads for the June campaign");
    assert!(state.contents.contains_key(FALLBACK_CAMPAIGN_ID));
}

#[tokio::test]
async fn one_failed_content_fetch_does_not_blank_the_others() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok(
            "getCampaigns:m-route",
            json!([
                demo_campaign("c1", true, true, 100),
                demo_campaign("c2", true, true, 100),
                demo_campaign("c3", true, true, 100)
            ]),
        )
        .ok("getContents:c1", demo_ads("c1"))
        .fail("getContents:c2")
        .ok("getContents:c3", demo_ads("c3"));
    let console = console(upstream, SourceShape::Demo).with_fallback(false);

    let outcome = console.bootstrap().await.unwrap();
    assert_eq!(outcome, Outcome::Applied);

    let state = console.state();
    assert_eq!(state.contents.len(), 3);
    assert_eq!(state.contents["c1"].len(), 2);
    assert!(state.contents["c2"].is_empty());
    assert_eq!(state.contents["c3"].len(), 2);
    assert!(state.error.is_none());
    assert_eq!(console.upstream().count("getContents"), 3);
}

#[tokio::test]
async fn campaign_failure_without_fallback_keeps_prior_state() {
    let upstream = single_campaign_upstream().fail("getCampaigns:m-route");
    let console = console(upstream, SourceShape::Demo).with_fallback(false);
    console.bootstrap().await.unwrap();
    let before = console.state().campaigns;

    let err = console.refresh().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Upstream(_)));

    let state = console.state();
    assert_eq!(state.campaigns, before);
    assert!(state.error.as_deref().unwrap().contains("bridge unavailable"));
    assert!(!state.loading);
}

#[tokio::test]
async fn undecodable_campaigns_are_surfaced_not_substituted() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok("getCampaigns:m-route", json!([{ "name": "no id" }]));
    let console = console(upstream, SourceShape::Live);

    let err = console.bootstrap().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Normalize(_)));

    let state = console.state();
    assert!(state.campaigns.is_empty());
    assert_eq!(state.sources.campaigns, DataSource::Live);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn marketer_failure_keeps_loaded_marketers() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .fail("getMyMarketers:");
    let console = console(upstream, SourceShape::Demo).with_fallback(false);

    console.load_marketers().await.unwrap();
    assert!(console.load_marketers().await.is_err());

    let state = console.state();
    assert_eq!(state.marketers.len(), 1);
    assert_eq!(state.selected_marketer.as_deref(), Some("m-route"));
    assert!(state.error.is_some());
}

#[tokio::test]
async fn zero_campaigns_give_zero_aggregates() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok("getCampaigns:m-route", json!([]));
    let console = console(upstream, SourceShape::Live);
    console.bootstrap().await.unwrap();

    let state = console.state();
    let totals = state.aggregates();
    assert_eq!(totals.total_campaigns, 0);
    assert_eq!(totals.total_budget, Decimal::ZERO);
    assert_eq!(totals.live_ads, 0);
    assert!(state.filtered_campaigns().is_empty());
}

#[tokio::test]
async fn enabled_campaign_off_air_is_not_live() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok("getCampaigns:m-route", json!([demo_campaign("c1", true, false, 100)]))
        .ok("getContents:c1", json!([]));
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();

    console.set_status_filter(StatusFilter::Live);
    let state = console.state();
    assert_eq!(state.campaigns[0].status, CampaignStatus::Enabled);
    assert!(state.filtered_campaigns().is_empty());

    console.set_status_filter(StatusFilter::Active);
    assert_eq!(console.state().filtered_campaigns().len(), 1);
}

#[tokio::test]
async fn live_campaigns_get_delivery_counters_from_reporting() {
    let live = json!([{
        "id": "c1",
        "enabled": true,
        "budget": { "amount": 100, "startDate": "2025-05-01", "endDate": "2025-05-31" },
        "liveStatus": { "campaignOnAir": false }
    }]);
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok("getCampaigns:m-route", live)
        .ok("getContents:c1", json!([]))
        .ok("getReporting:c1", json!({ "clicks": 40, "impressions": 2000 }));
    let console = console(upstream, SourceShape::Live);
    console.bootstrap().await.unwrap();

    let campaign = &console.state().campaigns[0];
    assert_eq!(campaign.clicks, 40);
    assert_eq!(campaign.impressions, 2000);

    let lookup = console
        .upstream()
        .calls()
        .into_iter()
        .find(|c| c.name() == "getReporting")
        .unwrap();
    let ApiCall::GetReporting { range, .. } = lookup else {
        unreachable!()
    };
    assert_eq!(range.from, date(2025, 5, 1), "window follows the flight dates");
    assert_eq!(range.to, date(2025, 5, 31));
}

#[tokio::test]
async fn failed_delivery_lookup_leaves_zero() {
    let live = json!([{ "id": "c1", "enabled": true }]);
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .ok("getCampaigns:m-route", live)
        .ok("getContents:c1", json!([]))
        .fail("getReporting:c1");
    let console = console(upstream, SourceShape::Live);
    console.bootstrap().await.unwrap();

    let state = console.state();
    assert_eq!(state.campaigns[0].clicks, 0);
    assert_eq!(state.campaigns[0].impressions, 0);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn stale_campaign_response_is_discarded() {
    let upstream = ScriptedUpstream::default()
        .ok("getMyMarketers:", marketers())
        .push(
            "getCampaigns:m-route",
            Ok(json!([demo_campaign("old", true, true, 1)])),
            80,
        )
        .ok("getCampaigns:m-route", json!([demo_campaign("new", true, true, 2)]))
        .ok("getContents:old", json!([]))
        .ok("getContents:new", json!([]));
    let console = console(upstream, SourceShape::Demo);
    console.load_marketers().await.unwrap();

    let slow = console.load_campaigns("m-route");
    let fast = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        console.load_campaigns("m-route").await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), Outcome::Superseded);
    assert_eq!(fast.unwrap(), Outcome::Applied);
    let state = console.state();
    assert_eq!(state.campaigns.len(), 1);
    assert_eq!(state.campaigns[0].id, "new");
    assert!(!state.loading);
}

// ---------------------------------------------------------------------------
// mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_budget_never_reaches_upstream() {
    let console = console(single_campaign_upstream(), SourceShape::Demo);
    console.bootstrap().await.unwrap();
    let calls_before = console.upstream().calls().len();

    for input in ["-5", "abc"] {
        let err = console.update_budget("c1", input).await.unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidBudget { .. }));
    }

    assert_eq!(console.upstream().calls().len(), calls_before);
    let state = console.state();
    assert_eq!(state.campaigns[0].budget.amount, Decimal::new(500, 0));
    assert!(state.error.as_deref().unwrap().contains("abc"));
}

#[tokio::test]
async fn budget_change_reloads_campaigns() {
    let upstream = single_campaign_upstream()
        .ok("changeBudget:c1", json!({ "success": true }))
        .ok("getCampaigns:m-route", json!([demo_campaign("c1", true, true, 750)]));
    // The first getCampaigns reply is consumed by bootstrap, the second is sticky.
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();

    console.update_budget("c1", " 750 ").await.unwrap();

    let change = console
        .upstream()
        .calls()
        .into_iter()
        .find(|c| c.name() == "changeBudget")
        .unwrap();
    assert_eq!(
        change,
        ApiCall::ChangeBudget {
            campaign_id: "c1".to_owned(),
            amount: Decimal::new(750, 0),
        }
    );
    assert_eq!(console.upstream().count("getCampaigns"), 2);
    assert_eq!(console.state().campaigns[0].budget.amount, Decimal::new(750, 0));
}

#[tokio::test]
async fn failed_budget_change_is_surfaced_even_with_fallback_on() {
    let upstream = single_campaign_upstream().fail("changeBudget:c1");
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();

    let err = console.update_budget("c1", "900").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Upstream(ClientError::Api { .. })));

    let state = console.state();
    assert_eq!(state.campaigns[0].budget.amount, Decimal::new(500, 0));
    assert_eq!(state.sources.campaigns, DataSource::Live);
    assert!(state.error.is_some());
    assert_eq!(console.upstream().count("getCampaigns"), 1, "no reload");
}

#[tokio::test]
async fn toggle_sends_the_inverse_state() {
    let upstream = single_campaign_upstream()
        .ok("disableCampaign:c1", json!({ "success": true }))
        .ok("enableContent:c1-ad-2", json!({ "success": true }));
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();

    console.toggle_campaign("c1", true).await.unwrap();
    console.toggle_content("c1-ad-2", false).await.unwrap();

    assert_eq!(console.upstream().count("disableCampaign"), 1);
    assert_eq!(console.upstream().count("enableContent"), 1);
    assert_eq!(console.upstream().count("getCampaigns"), 3);
}

#[tokio::test]
async fn failed_toggle_leaves_state_untouched() {
    let upstream = single_campaign_upstream().fail("disableCampaign:c1");
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();
    let before = console.state();

    let err = console.toggle_campaign("c1", true).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Upstream(ClientError::Api { .. })));

    let after = console.state();
    assert_eq!(after.campaigns, before.campaigns);
    assert_eq!(after.contents, before.contents);
    assert!(after.error.is_some());
    assert_eq!(console.upstream().count("getCampaigns"), 1, "no reload");

    console.dismiss_error();
    assert!(console.state().error.is_none());
}

#[tokio::test]
async fn mutations_require_a_selected_marketer() {
    let console = console(ScriptedUpstream::default(), SourceShape::Demo);
    let err = console.toggle_campaign("c1", true).await.unwrap_err();
    assert!(matches!(err, ConsoleError::NoMarketerSelected));
    assert!(console.upstream().calls().is_empty());
}

// ---------------------------------------------------------------------------
// reporting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_moves_through_loading_to_ready() {
    let upstream = single_campaign_upstream().push(
        "getReporting:",
        Ok(json!({ "totalSpend": 10, "impressions": 1000, "clicks": 20, "conversions": 2 })),
        50,
    );
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();
    assert_eq!(console.state().report, ReportState::Idle);

    let report = console.generate_report_for_selection();
    let observe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        console.state().report
    };
    let (outcome, mid_flight) = tokio::join!(report, observe);

    assert_eq!(mid_flight, ReportState::Loading);
    assert_eq!(outcome.unwrap(), Outcome::Applied);
    let state = console.state();
    let snapshot = state.report.snapshot().unwrap();
    assert_eq!(snapshot.ctr, Decimal::new(2, 0));
    assert_eq!(snapshot.cpa, Decimal::new(5, 0));
    assert_eq!(state.sources.reporting, DataSource::Live);
}

#[tokio::test]
async fn failed_report_returns_to_idle_with_error() {
    let upstream = single_campaign_upstream().fail("getReporting:");
    let console = console(upstream, SourceShape::Demo).with_fallback(false);
    console.bootstrap().await.unwrap();

    let err = console
        .generate_report("m-route", range(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConsoleError::Upstream(_)));

    let state = console.state();
    assert_eq!(state.report, ReportState::Idle);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn failed_report_with_fallback_serves_fallback_figures() {
    let upstream = single_campaign_upstream().fail("getReporting:");
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();

    console.generate_report("m-route", range(), None).await.unwrap();

    let state = console.state();
    let snapshot = state.report.snapshot().unwrap();
    assert_eq!(snapshot.clicks, 115_640);
    assert!(state.sources.reporting.is_fallback());
}

#[tokio::test]
async fn switching_marketer_discards_in_flight_report() {
    let upstream = single_campaign_upstream()
        .push("getReporting:", Ok(json!({ "clicks": 1 })), 60)
        .ok("getCampaigns:m-other", json!([]));
    let console = console(upstream, SourceShape::Demo);
    console.bootstrap().await.unwrap();

    let report = console.generate_report("m-route", range(), None);
    let switch = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        console.select_marketer("m-other").await
    };
    let (report, switch) = tokio::join!(report, switch);

    assert_eq!(report.unwrap(), Outcome::Superseded);
    switch.unwrap();
    let state = console.state();
    assert_eq!(state.report, ReportState::Idle);
    assert_eq!(state.selected_marketer.as_deref(), Some("m-other"));
    assert!(state.campaigns.is_empty());
}

#[tokio::test]
async fn inverted_date_range_is_rejected() {
    let console = console(ScriptedUpstream::default(), SourceShape::Demo);
    let err = console
        .set_date_range(date(2025, 6, 30), date(2025, 6, 1))
        .unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidDateRange(_)));
    assert_eq!(console.state().date_range, range());
}
