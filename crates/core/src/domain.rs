use serde::{Deserialize, Serialize};

/// One watchlist row as curated in the spreadsheet, before enrichment.
///
/// `ticker` is exchange-qualified ("NASDAQ:MSFT"). It is the natural key but
/// uniqueness is not enforced; duplicate tickers are enriched independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub ticker: String,
    pub industry: String,
    pub moat: String,
    pub target_price: f64,
    pub currency: String,
    pub next_earnings: String,
}

/// Where a 52-week band came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    /// Extrema of the observed daily high/low series.
    Observed,
    /// No usable series; band synthesized as current price +/- 10%.
    Estimated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub week52_high: f64,
    pub week52_low: f64,
    pub range_source: RangeSource,
}

/// Quality tag on an enriched row, so consumers can tell a real zero from a
/// failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    /// Snapshot backed by an observed price series.
    Live,
    /// Price is live but the 52-week band is a synthesized placeholder.
    Estimated,
    /// Market fetch failed; price and metrics are zeroed defaults.
    Unavailable,
}

/// The unit served to the dashboard: a watchlist row plus market data and
/// derived valuation metrics. Rebuilt from scratch every cache cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedCompany {
    pub name: String,
    pub ticker: String,
    pub industry: String,
    pub moat: String,
    pub target_price: f64,
    pub currency: String,
    pub current_price: f64,
    pub annual_return_pct: f64,
    pub five_year_return_pct: f64,
    pub week52_high: f64,
    pub week52_low: f64,
    pub week52_position_pct: f64,
    pub price_for_15_annual: f64,
    pub five_year_target_price: f64,
    pub next_earnings: String,
    pub market_status: MarketStatus,
}

/// Where the base-row set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    Sheet,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct BaseRows {
    pub records: Vec<CompanyRecord>,
    pub origin: RowOrigin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total: usize,
    pub count_at_least_15pct: usize,
    pub mean_annual_return_pct: f64,
}
