use crate::config::Settings;
use anyhow::{Context, Result};
use chrono::{Months, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Resolves the next scheduled earnings date for a bare symbol, within a
/// three-month window from today. `Ok(None)` means no date is scheduled;
/// errors are treated the same way by the pipeline.
#[async_trait::async_trait]
pub trait EarningsCalendarClient: Send + Sync {
    async fn next_earnings(&self, symbol: &str) -> Result<Option<String>>;
}

/// Finnhub earnings-calendar client. Without an API key the client is
/// disabled and resolves every symbol to "no date" without a network call.
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FinnhubClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build earnings http client")?;

        Ok(Self {
            http,
            base_url: settings.earnings_base_url.trim_end_matches('/').to_string(),
            api_key: settings.finnhub_api_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl EarningsCalendarClient for FinnhubClient {
    async fn next_earnings(&self, symbol: &str) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let today = Utc::now().date_naive();
        let (from, to) = calendar_window(today);
        let (from, to) = (from.to_string(), to.to_string());

        let url = format!("{}/api/v1/calendar/earnings", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("symbol", symbol),
                ("token", api_key),
            ])
            .send()
            .await
            .with_context(|| format!("earnings request failed for {symbol}"))?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("earnings HTTP {status} for {symbol}");
        }

        let body: CalendarResponse = res
            .json()
            .await
            .with_context(|| format!("failed to parse earnings calendar for {symbol}"))?;

        Ok(find_symbol_date(&body, symbol))
    }
}

fn calendar_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let to = today.checked_add_months(Months::new(3)).unwrap_or(today);
    (today, to)
}

fn find_symbol_date(body: &CalendarResponse, symbol: &str) -> Option<String> {
    body.earnings_calendar
        .iter()
        .find(|e| e.symbol == symbol)
        .and_then(|e| e.date.clone())
        .filter(|d| !d.is_empty())
}

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    #[serde(rename = "earningsCalendar", default)]
    earnings_calendar: Vec<CalendarEntry>,
}

#[derive(Debug, Deserialize)]
struct CalendarEntry {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(v: serde_json::Value) -> CalendarResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn picks_first_exact_symbol_match() {
        let body = fixture(json!({
            "earningsCalendar": [
                {"symbol": "MSFTX", "date": "2026-09-01"},
                {"symbol": "MSFT", "date": "2026-10-23"},
                {"symbol": "MSFT", "date": "2027-01-20"}
            ]
        }));
        assert_eq!(
            find_symbol_date(&body, "MSFT"),
            Some("2026-10-23".to_string())
        );
    }

    #[test]
    fn no_match_or_empty_calendar_yields_none() {
        let body = fixture(json!({"earningsCalendar": []}));
        assert_eq!(find_symbol_date(&body, "MSFT"), None);

        let body = fixture(json!({
            "earningsCalendar": [{"symbol": "AAPL", "date": "2026-10-30"}]
        }));
        assert_eq!(find_symbol_date(&body, "MSFT"), None);
    }

    #[test]
    fn missing_date_field_yields_none() {
        let body = fixture(json!({"earningsCalendar": [{"symbol": "MSFT"}]}));
        assert_eq!(find_symbol_date(&body, "MSFT"), None);
    }

    #[tokio::test]
    async fn disabled_client_resolves_to_no_date_without_a_request() {
        let client = FinnhubClient {
            http: reqwest::Client::new(),
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: None,
        };
        assert_eq!(client.next_earnings("MSFT").await.unwrap(), None);
    }

    #[tokio::test]
    async fn client_queries_the_calendar_with_its_credential() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let body = json!({
            "earningsCalendar": [{"symbol": "MSFT", "date": "2026-10-23"}]
        });
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/calendar/earnings"))
            .and(query_param("symbol", "MSFT"))
            .and(query_param("token", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = FinnhubClient {
            http: reqwest::Client::new(),
            base_url: server.uri(),
            api_key: Some("test-key".to_string()),
        };
        assert_eq!(
            client.next_earnings("MSFT").await.unwrap(),
            Some("2026-10-23".to_string())
        );
    }

    #[test]
    fn window_spans_three_months() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        let (from, to) = calendar_window(today);
        assert_eq!(from, today);
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 11, 25).unwrap());
    }
}
