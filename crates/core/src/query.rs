//! Client-side style filtering, sorting, and summary stats over an enriched
//! watchlist. Pure functions; the HTTP endpoint serves the unfiltered list and
//! these helpers back the CLI and any downstream consumer.

use crate::domain::{EnrichedCompany, SummaryStats};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// Case-insensitive substring match on name or ticker.
    pub search: Option<String>,
    /// Exact industry label match.
    pub industry: Option<String>,
}

impl CompanyFilter {
    fn matches(&self, company: &EnrichedCompany) -> bool {
        if let Some(term) = self.search.as_deref() {
            let term = term.to_lowercase();
            let hit = company.name.to_lowercase().contains(&term)
                || company.ticker.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }

        if let Some(industry) = self.industry.as_deref() {
            if company.industry != industry {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    FiveYearReturnDesc,
    FiveYearReturnAsc,
    AnnualReturnDesc,
    AnnualReturnAsc,
    NameAsc,
    NameDesc,
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "five_year_return_desc" => Ok(Self::FiveYearReturnDesc),
            "five_year_return_asc" => Ok(Self::FiveYearReturnAsc),
            "annual_return_desc" => Ok(Self::AnnualReturnDesc),
            "annual_return_asc" => Ok(Self::AnnualReturnAsc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            other => anyhow::bail!("unknown sort key: {other}"),
        }
    }
}

/// Filter and sort a watchlist into a fresh vec.
pub fn apply(
    companies: &[EnrichedCompany],
    filter: &CompanyFilter,
    sort: SortKey,
) -> Vec<EnrichedCompany> {
    let mut out: Vec<EnrichedCompany> = companies
        .iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect();

    out.sort_by(|a, b| match sort {
        SortKey::FiveYearReturnDesc => cmp_f64(b.five_year_return_pct, a.five_year_return_pct),
        SortKey::FiveYearReturnAsc => cmp_f64(a.five_year_return_pct, b.five_year_return_pct),
        SortKey::AnnualReturnDesc => cmp_f64(b.annual_return_pct, a.annual_return_pct),
        SortKey::AnnualReturnAsc => cmp_f64(a.annual_return_pct, b.annual_return_pct),
        SortKey::NameAsc => a.name.cmp(&b.name),
        SortKey::NameDesc => b.name.cmp(&a.name),
    });

    out
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Sorted unique industry labels, blanks excluded.
pub fn industries(companies: &[EnrichedCompany]) -> Vec<String> {
    let mut out: Vec<String> = companies
        .iter()
        .map(|c| c.industry.clone())
        .filter(|i| !i.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Summary cards for a (possibly filtered) set. Recomputed per call.
pub fn summarize(companies: &[EnrichedCompany]) -> SummaryStats {
    let total = companies.len();
    let count_at_least_15pct = companies
        .iter()
        .filter(|c| c.annual_return_pct >= 15.0)
        .count();
    let mean_annual_return_pct = if total == 0 {
        0.0
    } else {
        companies.iter().map(|c| c.annual_return_pct).sum::<f64>() / total as f64
    };

    SummaryStats {
        total,
        count_at_least_15pct,
        mean_annual_return_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketStatus;

    fn company(name: &str, ticker: &str, industry: &str, annual: f64, five: f64) -> EnrichedCompany {
        EnrichedCompany {
            name: name.to_string(),
            ticker: ticker.to_string(),
            industry: industry.to_string(),
            moat: String::new(),
            target_price: 100.0,
            currency: "USD".to_string(),
            current_price: 50.0,
            annual_return_pct: annual,
            five_year_return_pct: five,
            week52_high: 60.0,
            week52_low: 40.0,
            week52_position_pct: 50.0,
            price_for_15_annual: 49.7,
            five_year_target_price: 100.6,
            next_earnings: String::new(),
            market_status: MarketStatus::Live,
        }
    }

    fn sample() -> Vec<EnrichedCompany> {
        vec![
            company("Microsoft", "NASDAQ:MSFT", "Software", 16.0, 110.0),
            company("Apple", "NASDAQ:AAPL", "Hardware", 10.0, 60.0),
            company("Coca-Cola", "NYSE:KO", "Beverages", 4.0, 20.0),
        ]
    }

    #[test]
    fn search_matches_name_or_ticker_case_insensitively() {
        let rows = sample();
        let filter = CompanyFilter {
            search: Some("msft".to_string()),
            industry: None,
        };
        let out = apply(&rows, &filter, SortKey::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Microsoft");

        let filter = CompanyFilter {
            search: Some("coca".to_string()),
            industry: None,
        };
        assert_eq!(apply(&rows, &filter, SortKey::default()).len(), 1);
    }

    #[test]
    fn industry_filter_is_exact() {
        let rows = sample();
        let filter = CompanyFilter {
            search: None,
            industry: Some("Hardware".to_string()),
        };
        let out = apply(&rows, &filter, SortKey::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ticker, "NASDAQ:AAPL");
    }

    #[test]
    fn default_sort_is_five_year_return_descending() {
        let out = apply(&sample(), &CompanyFilter::default(), SortKey::default());
        let names: Vec<&str> = out.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Microsoft", "Apple", "Coca-Cola"]);
    }

    #[test]
    fn name_sort_orders_lexically() {
        let out = apply(&sample(), &CompanyFilter::default(), SortKey::NameAsc);
        assert_eq!(out[0].name, "Apple");
        let out = apply(&sample(), &CompanyFilter::default(), SortKey::NameDesc);
        assert_eq!(out[0].name, "Microsoft");
    }

    #[test]
    fn industries_are_unique_and_sorted() {
        let mut rows = sample();
        rows.push(company("Pepsi", "NASDAQ:PEP", "Beverages", 5.0, 25.0));
        rows.push(company("Blank", "X", "", 0.0, 0.0));
        assert_eq!(industries(&rows), vec!["Beverages", "Hardware", "Software"]);
    }

    #[test]
    fn summary_counts_and_mean() {
        let stats = summarize(&sample());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count_at_least_15pct, 1);
        assert!((stats.mean_annual_return_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn summary_of_empty_set_is_zeroed() {
        let stats = summarize(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.count_at_least_15pct, 0);
        assert_eq!(stats.mean_annual_return_pct, 0.0);
    }

    #[test]
    fn sort_keys_parse_from_strings() {
        assert_eq!(
            "annual_return_desc".parse::<SortKey>().unwrap(),
            SortKey::AnnualReturnDesc
        );
        assert!("bogus".parse::<SortKey>().is_err());
    }
}
