mod commands;

use ampdash_client::{DemoUpstream, HttpUpstream};
use ampdash_console::{Console, MonthFilter, StatusFilter};
use ampdash_core::SourceShape;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ampdash")]
#[command(about = "Campaign console for the ad bridge")]
struct Cli {
    /// Serve the built-in demo account instead of calling the bridge
    #[arg(long, global = true)]
    demo: bool,
    /// Make the named demo call fail, e.g. `getCampaigns` (repeatable)
    #[arg(long = "outage", global = true, requires = "demo")]
    outage: Vec<String>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List marketers
    Marketers,
    /// List campaigns with totals
    Campaigns {
        /// Start month, 1-12, or "all"
        #[arg(long, default_value = "all")]
        month: MonthFilter,
        /// all, active, paused or live
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Marketer id (defaults to the first marketer)
        #[arg(long)]
        marketer: Option<String>,
    },
    /// Generate a reporting snapshot
    Report {
        /// First day, YYYY-MM-DD (defaults to the configured window)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Restrict to one campaign
        #[arg(long)]
        campaign: Option<String>,
        #[arg(long)]
        marketer: Option<String>,
    },
    /// Enable a paused campaign or pause an enabled one
    ToggleCampaign {
        id: String,
        #[arg(long)]
        marketer: Option<String>,
    },
    /// Enable a paused ad or pause an enabled one
    ToggleContent {
        id: String,
        #[arg(long)]
        marketer: Option<String>,
    },
    /// Change a campaign budget
    Budget {
        id: String,
        /// New amount, e.g. 1550.00
        amount: String,
        #[arg(long)]
        marketer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ampdash_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let today = Utc::now().date_naive();
    let output = commands::Output { json: cli.json };

    if cli.demo {
        config.source_shape = SourceShape::Demo;
        let upstream = DemoUpstream::new().with_outage(cli.outage);
        let console = Console::from_config(upstream, &config, today);
        commands::run(&console, cli.command, output).await
    } else {
        tracing::debug!(
            api = %config.api_base_url,
            shape = %config.source_shape,
            env = %config.env,
            "using bridge"
        );
        let upstream = HttpUpstream::from_config(&config)
            .map_err(|e| anyhow::anyhow!("failed to build bridge client: {e}"))?;
        let console = Console::from_config(upstream, &config, today);
        commands::run(&console, cli.command, output).await
    }
}
