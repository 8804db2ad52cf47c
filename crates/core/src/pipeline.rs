use crate::config::Settings;
use crate::domain::{CompanyRecord, EnrichedCompany, MarketStatus, RangeSource};
use crate::earnings::EarningsCalendarClient;
use crate::market::MarketDataClient;
use crate::metrics;
use crate::sheet::CompanySource;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

/// Strip the exchange qualifier from a ticker ("NASDAQ:MSFT" -> "MSFT").
pub fn ticker_symbol(ticker: &str) -> &str {
    match ticker.split_once(':') {
        Some((_, symbol)) => symbol,
        None => ticker,
    }
}

struct CacheSlot {
    companies: Arc<Vec<EnrichedCompany>>,
    refreshed_at: Instant,
}

/// Orchestrates one aggregation cycle: base rows from the sheet, then a
/// bounded concurrent fan-out of per-row market/earnings enrichment, with the
/// result held in a single cache slot for a short freshness window.
///
/// The cache mutex doubles as a single-flight guard: it is held across the
/// reload, so concurrent callers during a refresh wait for the in-flight
/// result instead of starting their own fetch storm.
pub struct Aggregator {
    companies: Arc<dyn CompanySource>,
    market: Arc<dyn MarketDataClient>,
    earnings: Arc<dyn EarningsCalendarClient>,
    cache: Mutex<Option<CacheSlot>>,
    ttl: Duration,
    concurrency: usize,
}

impl Aggregator {
    pub fn new(
        companies: Arc<dyn CompanySource>,
        market: Arc<dyn MarketDataClient>,
        earnings: Arc<dyn EarningsCalendarClient>,
        settings: &Settings,
    ) -> Self {
        Self {
            companies,
            market,
            earnings,
            cache: Mutex::new(None),
            ttl: Duration::from_secs(settings.cache_ttl_secs),
            concurrency: settings.fetch_concurrency.max(1),
        }
    }

    /// Serve the enriched watchlist, from cache when it is still fresh.
    pub async fn latest(&self) -> Result<Arc<Vec<EnrichedCompany>>> {
        let mut guard = self.cache.lock().await;

        if let Some(slot) = guard.as_ref() {
            if slot.refreshed_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&slot.companies));
            }
        }

        let companies = Arc::new(self.reload().await?);
        *guard = Some(CacheSlot {
            companies: Arc::clone(&companies),
            refreshed_at: Instant::now(),
        });

        Ok(companies)
    }

    async fn reload(&self) -> Result<Vec<EnrichedCompany>> {
        let started = Instant::now();
        let base = self.companies.load().await;

        if base.records.is_empty() {
            tracing::warn!("watchlist is empty; skipping enrichment");
            return Ok(Vec::new());
        }

        let total = base.records.len();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (idx, record) in base.records.into_iter().enumerate() {
            let permits = Arc::clone(&permits);
            let market = Arc::clone(&self.market);
            let earnings = Arc::clone(&self.earnings);

            tasks.spawn(async move {
                // Semaphore closes only on drop, which cannot happen while
                // this task holds a clone of it.
                let _permit = permits.acquire_owned().await.expect("semaphore closed");
                (idx, enrich_row(record, market.as_ref(), earnings.as_ref()).await)
            });
        }

        let mut rows: Vec<Option<EnrichedCompany>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (idx, row) = joined.context("enrichment task panicked")?;
            rows[idx] = Some(row);
        }

        let rows: Vec<EnrichedCompany> = rows.into_iter().flatten().collect();
        tracing::info!(
            rows = rows.len(),
            origin = ?base.origin,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "watchlist refreshed"
        );
        Ok(rows)
    }
}

/// Enrich one row. Every external call is attempted exactly once; any failure
/// degrades this row alone, never the cycle.
async fn enrich_row(
    record: CompanyRecord,
    market: &dyn MarketDataClient,
    earnings: &dyn EarningsCalendarClient,
) -> EnrichedCompany {
    let symbol = ticker_symbol(&record.ticker).to_string();

    // The sheet's pre-filled date wins; the calendar is only consulted when
    // the cell is blank.
    let next_earnings = if record.next_earnings.is_empty() {
        match earnings.next_earnings(&symbol).await {
            Ok(Some(date)) => date,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::warn!(symbol = %symbol, error = %err, "earnings lookup failed");
                String::new()
            }
        }
    } else {
        record.next_earnings.clone()
    };

    let snapshot = match market.fetch_snapshot(&symbol).await {
        Ok(snap) if snap.current_price > 0.0 => snap,
        Ok(snap) => {
            tracing::warn!(symbol = %symbol, price = snap.current_price, "non-positive market price; degrading row");
            return degraded_row(record, next_earnings);
        }
        Err(err) => {
            tracing::warn!(symbol = %symbol, error = %err, "market fetch failed; degrading row");
            return degraded_row(record, next_earnings);
        }
    };

    let market_status = match snapshot.range_source {
        RangeSource::Observed => MarketStatus::Live,
        RangeSource::Estimated => MarketStatus::Estimated,
    };

    EnrichedCompany {
        current_price: snapshot.current_price,
        annual_return_pct: metrics::annual_return_pct(snapshot.current_price, record.target_price),
        five_year_return_pct: metrics::five_year_return_pct(
            snapshot.current_price,
            record.target_price,
        ),
        week52_high: snapshot.week52_high,
        week52_low: snapshot.week52_low,
        week52_position_pct: metrics::week52_position_pct(
            snapshot.current_price,
            snapshot.week52_low,
            snapshot.week52_high,
        ),
        price_for_15_annual: metrics::price_for_15_annual(record.target_price),
        five_year_target_price: metrics::five_year_target_price(snapshot.current_price),
        next_earnings,
        market_status,
        name: record.name,
        ticker: record.ticker,
        industry: record.industry,
        moat: record.moat,
        target_price: record.target_price,
        currency: record.currency,
    }
}

/// Zero-valued placeholder for a row whose market fetch failed. The entry
/// price for the target is still derivable without market data.
fn degraded_row(record: CompanyRecord, next_earnings: String) -> EnrichedCompany {
    EnrichedCompany {
        current_price: 0.0,
        annual_return_pct: 0.0,
        five_year_return_pct: 0.0,
        week52_high: 0.0,
        week52_low: 0.0,
        week52_position_pct: 50.0,
        price_for_15_annual: metrics::price_for_15_annual(record.target_price),
        five_year_target_price: 0.0,
        next_earnings,
        market_status: MarketStatus::Unavailable,
        name: record.name,
        ticker: record.ticker,
        industry: record.industry,
        moat: record.moat,
        target_price: record.target_price,
        currency: record.currency,
    }
}
