use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moatwatch_core::earnings::FinnhubClient;
use moatwatch_core::market::YahooChartClient;
use moatwatch_core::pipeline::Aggregator;
use moatwatch_core::query::{self, CompanyFilter, SortKey};
use moatwatch_core::sheet::SheetLoader;

/// One-shot aggregation run: load the watchlist, enrich it, print JSON.
#[derive(Debug, Parser)]
#[command(name = "moatwatch_cli")]
struct Args {
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Append a summary block (totals, count at >=15%, mean annual return).
    #[arg(long)]
    summary: bool,

    /// Case-insensitive substring match on company name or ticker.
    #[arg(long)]
    search: Option<String>,

    /// Exact industry label to keep.
    #[arg(long)]
    industry: Option<String>,

    /// Sort order: five_year_return_desc (default), five_year_return_asc,
    /// annual_return_desc, annual_return_asc, name_asc, name_desc.
    #[arg(long)]
    sort: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = moatwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let sort = match args.sort.as_deref() {
        Some(s) => s.parse::<SortKey>().context("invalid --sort value")?,
        None => SortKey::default(),
    };
    let filter = CompanyFilter {
        search: args.search,
        industry: args.industry,
    };

    let aggregator = Aggregator::new(
        Arc::new(SheetLoader::from_settings(&settings)?),
        Arc::new(YahooChartClient::from_settings(&settings)?),
        Arc::new(FinnhubClient::from_settings(&settings)?),
        &settings,
    );

    let companies = match aggregator.latest().await {
        Ok(c) => c,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    };

    let rows = query::apply(&companies, &filter, sort);
    tracing::info!(total = companies.len(), shown = rows.len(), "aggregation complete");

    let payload = if args.summary {
        serde_json::json!({
            "companies": rows,
            "summary": query::summarize(&rows),
        })
    } else {
        serde_json::to_value(&rows)?
    };

    let out = if args.pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    println!("{out}");

    Ok(())
}

fn init_sentry(
    settings: &moatwatch_core::config::Settings,
) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
