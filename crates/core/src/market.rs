use crate::config::Settings;
use crate::domain::{MarketSnapshot, RangeSource};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

// Yahoo rejects requests without a browser-looking UA.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fetches a current price plus 52-week high/low band for one bare symbol.
/// Errors signal "enrichment unavailable for this row"; callers degrade the
/// row rather than failing the cycle.
#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot>;
}

/// Yahoo Finance v8 chart client: one year of daily bars per request.
#[derive(Debug, Clone)]
pub struct YahooChartClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build market http client")?;

        Ok(Self {
            http,
            base_url: settings.market_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl MarketDataClient for YahooChartClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);

        let res = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .query(&[("interval", "1d"), ("range", "1y")])
            .send()
            .await
            .with_context(|| format!("market request failed for {symbol}"))?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("market HTTP {status} for {symbol}");
        }

        let body: ChartResponse = res
            .json()
            .await
            .with_context(|| format!("failed to parse chart response for {symbol}"))?;

        snapshot_from_chart(body).with_context(|| format!("no chart data for {symbol}"))
    }
}

fn snapshot_from_chart(body: ChartResponse) -> Result<MarketSnapshot> {
    let result = body
        .chart
        .result
        .into_iter()
        .flatten()
        .next()
        .context("chart result missing")?;

    let current_price = result
        .meta
        .regular_market_price
        .or(result.meta.previous_close)
        .context("no current price in chart metadata")?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default();

    let highs: Vec<f64> = quote.high.into_iter().flatten().collect();
    let lows: Vec<f64> = quote.low.into_iter().flatten().collect();

    // An empty series after null-filtering gets a synthesized +/-10% band,
    // tagged so downstream can tell it apart from a genuine narrow range.
    let (week52_high, week52_low, range_source) = match (
        highs.iter().cloned().fold(f64::NAN, f64::max),
        lows.iter().cloned().fold(f64::NAN, f64::min),
    ) {
        (high, low) if high.is_finite() && low.is_finite() => (high, low, RangeSource::Observed),
        _ => (
            current_price * 1.1,
            current_price * 0.9,
            RangeSource::Estimated,
        ),
    };

    Ok(MarketSnapshot {
        current_price,
        week52_high,
        week52_low,
        range_source,
    })
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "previousClose")]
    previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
}
