use crate::config::Settings;
use crate::time::labels::parse_provider_timestamp;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const SERIES_KEY: &str = "Time Series (60min)";

/// One hourly row as delivered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Hourly bars for `ticker`, oldest first.
    async fn intraday_series(&self, ticker: &str) -> Result<Vec<IntradayBar>>;
}

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_alpha_vantage_api_key()?.to_string();
        let base_url = std::env::var("ALPHA_VANTAGE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn intraday_series(&self, ticker: &str) -> Result<Vec<IntradayBar>> {
        tracing::info!(%ticker, "fetching intraday series");
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", ticker),
                ("interval", "60min"),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("market data request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if !status.is_success() {
            anyhow::bail!("market data HTTP {status}");
        }

        let raw = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("market data response is not valid JSON: {text}"))?;
        parse_intraday_response(&raw)
    }
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Maps provider error payloads and rate-limit notices to errors; otherwise returns bars
/// oldest first.
pub fn parse_intraday_response(raw: &Value) -> Result<Vec<IntradayBar>> {
    if let Some(msg) = raw.get("Error Message").and_then(Value::as_str) {
        anyhow::bail!("provider error: {msg}");
    }
    if raw.get("Note").is_some() || raw.get("Information").is_some() {
        anyhow::bail!("provider call frequency limit reached");
    }

    let series = raw
        .get(SERIES_KEY)
        .cloned()
        .context("no time series data available")?;
    let rows = serde_json::from_value::<BTreeMap<String, RawBar>>(series)
        .context("failed to decode intraday rows")?;

    let mut bars = Vec::with_capacity(rows.len());
    for (ts, row) in rows {
        bars.push(IntradayBar {
            timestamp: parse_provider_timestamp(&ts)?,
            open: parse_num(&row.open, "open")?,
            high: parse_num(&row.high, "high")?,
            low: parse_num(&row.low, "low")?,
            close: parse_num(&row.close, "close")?,
            volume: row
                .volume
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid volume: {}", row.volume))?,
        });
    }
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

fn parse_num(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("invalid {field}: {raw}"))
}
