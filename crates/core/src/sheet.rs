use crate::config::Settings;
use crate::csv;
use crate::domain::{BaseRows, CompanyRecord, RowOrigin};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::time::Duration;

/// Supplies the base watchlist rows for an aggregation cycle.
///
/// Loading never fails: implementations degrade to a built-in fallback list
/// so the pipeline always has something to enrich.
#[async_trait::async_trait]
pub trait CompanySource: Send + Sync {
    async fn load(&self) -> BaseRows;
}

/// Loads the watchlist from a published-spreadsheet CSV export.
#[derive(Debug, Clone)]
pub struct SheetLoader {
    http: reqwest::Client,
    url: String,
}

impl SheetLoader {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build sheet http client")?;

        Ok(Self {
            http,
            url: settings.sheet_csv_url.clone(),
        })
    }

    async fn fetch_rows(&self) -> Result<Vec<CompanyRecord>> {
        let res = self
            .http
            .get(&self.url)
            .header("Cache-Control", "no-store")
            .send()
            .await
            .context("sheet request failed")?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("sheet HTTP {status}");
        }

        let text = res.text().await.context("failed to read sheet response")?;
        Ok(normalize_rows(csv::parse(&text)))
    }
}

#[async_trait::async_trait]
impl CompanySource for SheetLoader {
    async fn load(&self) -> BaseRows {
        match self.fetch_rows().await {
            Ok(records) => {
                tracing::info!(rows = records.len(), "loaded watchlist from sheet");
                BaseRows {
                    records,
                    origin: RowOrigin::Sheet,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sheet load failed; using fallback watchlist");
                BaseRows {
                    records: fallback_companies(),
                    origin: RowOrigin::Fallback,
                }
            }
        }
    }
}

/// Drop rows missing a name or ticker and coerce the remaining fields:
/// target price parsed as f64 (invalid -> 0), currency defaults to USD,
/// pre-filled earnings date defaults to empty.
pub fn normalize_rows(rows: Vec<BTreeMap<String, String>>) -> Vec<CompanyRecord> {
    rows.into_iter()
        .filter(|row| !get(row, "empresa").is_empty() && !get(row, "ticker").is_empty())
        .map(|row| CompanyRecord {
            name: get(&row, "empresa"),
            ticker: get(&row, "ticker"),
            industry: get(&row, "industria"),
            moat: get(&row, "moat_principal"),
            target_price: get(&row, "precio_objetivo").parse::<f64>().unwrap_or(0.0),
            currency: {
                let c = get(&row, "divisa_base");
                if c.is_empty() {
                    "USD".to_string()
                } else {
                    c
                }
            },
            next_earnings: get(&row, "proximos_resultados"),
        })
        .collect()
}

fn get(row: &BTreeMap<String, String>, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

/// Fixed sample watchlist served when the sheet is unreachable.
pub fn fallback_companies() -> Vec<CompanyRecord> {
    vec![
        CompanyRecord {
            name: "Microsoft Corporation".to_string(),
            ticker: "NASDAQ:MSFT".to_string(),
            industry: "Tecnología - Software".to_string(),
            moat: "Ecosistema enterprise + Cloud".to_string(),
            target_price: 450.00,
            currency: "USD".to_string(),
            next_earnings: String::new(),
        },
        CompanyRecord {
            name: "Apple Inc.".to_string(),
            ticker: "NASDAQ:AAPL".to_string(),
            industry: "Tecnología - Hardware".to_string(),
            moat: "Ecosistema iOS + Marca".to_string(),
            target_price: 210.00,
            currency: "USD".to_string(),
            next_earnings: String::new(),
        },
        CompanyRecord {
            name: "Coca-Cola Company".to_string(),
            ticker: "NYSE:KO".to_string(),
            industry: "Consumo - Bebidas".to_string(),
            moat: "Marca + Red distribución".to_string(),
            target_price: 72.00,
            currency: "USD".to_string(),
            next_earnings: String::new(),
        },
    ]
}
