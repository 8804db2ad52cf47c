pub mod csv;
pub mod domain;
pub mod earnings;
pub mod market;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod sheet;

pub mod config {
    const DEFAULT_SHEET_CSV_URL: &str =
        "https://docs.google.com/spreadsheets/d/14Gfj8DU4E3GyVQjbym-OYbSWewJMy6u8qLRfxo9gLSY/gviz/tq?tqx=out:csv";
    const DEFAULT_MARKET_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_EARNINGS_BASE_URL: &str = "https://finnhub.io";

    const DEFAULT_CACHE_TTL_SECS: u64 = 30;
    const DEFAULT_FETCH_CONCURRENCY: usize = 8;
    const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sheet_csv_url: String,
        pub market_base_url: String,
        pub earnings_base_url: String,
        pub finnhub_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub cache_ttl_secs: u64,
        pub fetch_concurrency: usize,
        pub http_timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sheet_csv_url: env_or("SHEET_CSV_URL", DEFAULT_SHEET_CSV_URL),
                market_base_url: env_or("MARKET_BASE_URL", DEFAULT_MARKET_BASE_URL),
                earnings_base_url: env_or("EARNINGS_BASE_URL", DEFAULT_EARNINGS_BASE_URL),
                finnhub_api_key: std::env::var("FINNHUB_API_KEY")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                cache_ttl_secs: env_parsed("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
                fetch_concurrency: env_parsed("FETCH_CONCURRENCY", DEFAULT_FETCH_CONCURRENCY)
                    .max(1),
                http_timeout_secs: env_parsed("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            })
        }
    }

    fn env_or(key: &str, default: &str) -> String {
        std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse::<T>().ok())
            .unwrap_or(default)
    }
}
