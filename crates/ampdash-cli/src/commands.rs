//! Command handlers. Each one drives the console through its named
//! operations and prints the resulting state.

use ampdash_client::Upstream;
use ampdash_console::{view, Console, ConsoleState, DataSource, MonthFilter};
use serde_json::json;

use crate::Commands;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    pub json: bool,
}

pub(crate) async fn run<U: Upstream>(
    console: &Console<U>,
    command: Commands,
    output: Output,
) -> anyhow::Result<()> {
    match command {
        Commands::Marketers => {
            console.load_marketers().await?;
            print_marketers(&console.state(), output)
        }
        Commands::Campaigns {
            month,
            status,
            marketer,
        } => {
            open(console, marketer.as_deref()).await?;
            console.set_month_filter(month);
            console.set_status_filter(status);
            print_campaigns(&console.state(), output)
        }
        Commands::Report {
            from,
            to,
            campaign,
            marketer,
        } => {
            open(console, marketer.as_deref()).await?;
            let current = console.state().date_range;
            console.set_date_range(from.unwrap_or(current.from), to.unwrap_or(current.to))?;
            console.select_campaign(campaign.as_deref());
            console.generate_report_for_selection().await?;
            print_report(&console.state(), output)
        }
        Commands::ToggleCampaign { id, marketer } => {
            open(console, marketer.as_deref()).await?;
            let enabled = console
                .state()
                .campaign(&id)
                .map(ampdash_core::Campaign::is_enabled)
                .ok_or_else(|| anyhow::anyhow!("campaign {id} not found"))?;
            console.toggle_campaign(&id, enabled).await?;
            if let Some(campaign) = console.state().campaign(&id) {
                println!("{}: {}", campaign.name, campaign.status);
            }
            Ok(())
        }
        Commands::ToggleContent { id, marketer } => {
            open(console, marketer.as_deref()).await?;
            let enabled = console
                .state()
                .contents
                .values()
                .flatten()
                .find(|ad| ad.id == id)
                .map(|ad| ad.status.is_enabled())
                .ok_or_else(|| anyhow::anyhow!("ad {id} not found"))?;
            console.toggle_content(&id, enabled).await?;
            let state = console.state();
            if let Some(ad) = state.contents.values().flatten().find(|ad| ad.id == id) {
                println!("{}: {}", ad.headline, ad.status);
            }
            Ok(())
        }
        Commands::Budget {
            id,
            amount,
            marketer,
        } => {
            open(console, marketer.as_deref()).await?;
            console.update_budget(&id, &amount).await?;
            if let Some(campaign) = console.state().campaign(&id) {
                println!("{}: budget {:.2}", campaign.name, campaign.budget.amount);
            }
            Ok(())
        }
    }
}

/// Loads marketers and the campaigns of `marketer` (or of the default
/// selection).
async fn open<U: Upstream>(console: &Console<U>, marketer: Option<&str>) -> anyhow::Result<()> {
    console.load_marketers().await?;
    match marketer {
        Some(id) => console.select_marketer(id).await?,
        None => console.refresh().await?,
    };
    Ok(())
}

fn note_fallback(state: &ConsoleState) {
    let sources = [
        ("marketers", &state.sources.marketers),
        ("campaigns", &state.sources.campaigns),
        ("ads", &state.sources.contents),
        ("report", &state.sources.reporting),
    ];
    for (collection, source) in sources {
        if let DataSource::Fallback { reason } = source {
            eprintln!("note: {collection} shown from fallback data ({reason})");
        }
    }
}

fn print_marketers(state: &ConsoleState, output: Output) -> anyhow::Result<()> {
    note_fallback(state);
    if output.json {
        println!("{}", serde_json::to_string_pretty(&state.marketers)?);
        return Ok(());
    }
    for m in &state.marketers {
        let marker = if state.selected_marketer.as_deref() == Some(m.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {:<36} {:<34} {}", m.display_name(), m.id, m.currency);
    }
    Ok(())
}

fn print_campaigns(state: &ConsoleState, output: Output) -> anyhow::Result<()> {
    note_fallback(state);
    let campaigns = state.filtered_campaigns();
    let totals = state.aggregates();
    if output.json {
        let body = json!({ "campaigns": campaigns, "aggregates": totals });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let currency = state.marketer().map_or("", |m| m.currency.as_str());
    if let MonthFilter::Month(month) = state.month_filter {
        println!("Campaigns starting in {}", view::month_name(month).unwrap_or("?"));
    }
    for c in &campaigns {
        let (active_ads, total_ads) = view::content_summary(&state.contents, &c.id);
        let dates = match (c.start_date, c.end_date) {
            (Some(from), Some(to)) => format!("{from} to {to}"),
            (Some(from), None) => format!("from {from}"),
            _ => String::new(),
        };
        println!("{:<8} {}", view::display_status(c), c.name);
        println!(
            "         budget {:.2} {currency}  spent {:.2}  ctr {:.2}%  ads {active_ads}/{total_ads}  {dates}",
            c.budget.amount,
            c.amount_spent,
            view::ctr(c.clicks, c.impressions),
        );
    }
    println!();
    println!(
        "{} campaigns, {} active, budget {:.2} {currency}, spent {:.2}, {} live ads",
        totals.total_campaigns,
        totals.active_campaigns,
        totals.total_budget,
        totals.total_spent,
        totals.live_ads
    );
    Ok(())
}

fn print_report(state: &ConsoleState, output: Output) -> anyhow::Result<()> {
    note_fallback(state);
    let Some(report) = state.report.snapshot() else {
        anyhow::bail!("no report available");
    };
    if output.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let range = state.date_range;
    let scope = report.campaign_id.as_deref().unwrap_or("all campaigns");
    println!("Report for {scope}, {} to {}", range.from, range.to);
    println!("  spend            {:.2}", report.total_spend);
    println!("  impressions      {}", report.impressions);
    println!("  clicks           {}", report.clicks);
    println!("  conversions      {}", report.conversions);
    println!("  ctr              {:.2}%", report.ctr);
    println!("  cpc              {:.4}", report.cpc);
    println!("  cpa              {:.2}", report.cpa);
    println!("  conversion rate  {:.2}%", report.conversion_rate);
    Ok(())
}
