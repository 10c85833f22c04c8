pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::{CompanyProfile, PricePoint, RawIndicators, Ticker};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use self::http_client::HttpClient;
use self::parsers::{
    INDICATOR_MODULES, PROFILE_MODULES, parse_chart, parse_crumb, parse_profile,
    parse_quote_summary,
};

// ── Provider trait ────────────────────────────────────────────────────────────

/// Swappable market-data source. Every call concerns one ticker and fails
/// on its own; callers decide how to aggregate.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_indicators(&self, ticker: &Ticker) -> Result<RawIndicators, ProviderError>;

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, ProviderError>;

    /// Daily closes from `start` (inclusive) to `end` (exclusive).
    async fn fetch_history(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ProviderError>;
}

// ── Yahoo Finance ─────────────────────────────────────────────────────────────

pub struct YahooProvider {
    client: HttpClient,
    base_url: String,
    cookie_url: String,
    crumb: OnceCell<String>,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            crumb: OnceCell::new(),
        })
    }

    /// The quoteSummary API rejects requests without a crumb tied to the
    /// session cookie. Obtained once per provider.
    async fn crumb(&self) -> Result<&str, ProviderError> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                self.client.touch(&self.cookie_url).await?;
                let url = Url::parse(&format!("{}/v1/test/getcrumb", self.base_url))?;
                let body = self.client.get_text(&url).await?;
                let crumb = parse_crumb(&body)?;
                info!("Obtained provider session crumb");
                Ok::<String, ProviderError>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }

    async fn quote_summary_url(&self, ticker: &Ticker, modules: &[&str]) -> Result<Url, ProviderError> {
        let crumb = self.crumb().await?;
        let mut url = Url::parse(&format!(
            "{}/v10/finance/quoteSummary/{}",
            self.base_url,
            ticker.as_str()
        ))?;
        url.query_pairs_mut()
            .append_pair("modules", &modules.join(","))
            .append_pair("crumb", crumb);
        Ok(url)
    }

    fn chart_url(&self, ticker: &Ticker, start: NaiveDate, end: NaiveDate) -> Result<Url, ProviderError> {
        let epoch = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc().timestamp();
        let mut url = Url::parse(&format!("{}/v8/finance/chart/{}", self.base_url, ticker.as_str()))?;
        url.query_pairs_mut()
            .append_pair("period1", &epoch(start).to_string())
            .append_pair("period2", &epoch(end).to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_indicators(&self, ticker: &Ticker) -> Result<RawIndicators, ProviderError> {
        let url = self.quote_summary_url(ticker, &INDICATOR_MODULES).await?;
        let json = self.client.get_json(&url).await?;
        let raw = parse_quote_summary(&json, ticker.as_str())?;
        debug!("{}: {} numeric fields", ticker, raw.fields.len());
        Ok(raw)
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<CompanyProfile, ProviderError> {
        let url = self.quote_summary_url(ticker, &PROFILE_MODULES).await?;
        let json = self.client.get_json(&url).await?;
        parse_profile(&json, ticker.as_str())
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let url = self.chart_url(ticker, start, end)?;
        let json = self.client.get_json(&url).await?;
        let points = parse_chart(&json, ticker.as_str())?;
        debug!("{}: {} bars between {} and {}", ticker, points.len(), start, end);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_url() {
        let provider = YahooProvider::new(&ProviderConfig::default()).unwrap();
        let ticker = Ticker::new("petr4.sa").unwrap();
        let url = provider
            .chart_url(
                &ticker,
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            )
            .unwrap();

        assert_eq!(url.path(), "/v8/finance/chart/PETR4.SA");
        let query = url.query().unwrap();
        assert!(query.contains("period1=1577836800"));
        assert!(query.contains("period2=1577923200"));
        assert!(query.contains("interval=1d"));
    }
}
