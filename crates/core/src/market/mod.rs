use crate::config::Settings;
use crate::domain::market::{PricePoint, PriceSeries, Quote, SeriesSource, MIN_PRICE, SERIES_LEN};
use crate::time::labels::hour_minute;
use serde::Serialize;
use std::sync::Arc;

pub mod cache;
pub mod provider;
pub mod rate_limit;
pub mod simulated;

use cache::SeriesCache;
use provider::{IntradayBar, MarketDataProvider};
use rate_limit::SlidingWindowLimiter;
use simulated::SeriesSimulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiStatus {
    pub configured: bool,
    pub rate_limited: bool,
}

/// Cached, rate-limited series source with a simulated fallback. The limiter and cache are
/// owned here (and shareable via `Arc`) rather than living in process globals.
pub struct MarketDataFetcher {
    provider: Option<Arc<dyn MarketDataProvider>>,
    limiter: Arc<SlidingWindowLimiter>,
    cache: Arc<SeriesCache>,
    simulator: SeriesSimulator,
}

impl MarketDataFetcher {
    pub fn new(
        provider: Option<Arc<dyn MarketDataProvider>>,
        limiter: Arc<SlidingWindowLimiter>,
        cache: Arc<SeriesCache>,
        simulator: SeriesSimulator,
    ) -> Self {
        Self {
            provider,
            limiter,
            cache,
            simulator,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let provider: Option<Arc<dyn MarketDataProvider>> =
            match settings.alpha_vantage_api_key.as_deref() {
                Some(_) => match provider::AlphaVantageClient::from_settings(settings) {
                    Ok(client) => Some(Arc::new(client)),
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            "market data client unavailable; using simulated series"
                        );
                        None
                    }
                },
                None => {
                    tracing::info!("ALPHA_VANTAGE_API_KEY not set; using simulated series");
                    None
                }
            };

        Self::new(
            provider,
            Arc::new(SlidingWindowLimiter::default()),
            Arc::new(SeriesCache::default()),
            SeriesSimulator::default(),
        )
    }

    pub fn is_api_key_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        &self.limiter
    }

    pub fn cache(&self) -> &Arc<SeriesCache> {
        &self.cache
    }

    pub async fn status(&self) -> ApiStatus {
        ApiStatus {
            configured: self.is_api_key_configured(),
            rate_limited: self.limiter.is_saturated().await,
        }
    }

    /// 24 hourly points for `ticker`. Never fails: provider problems fall back to a simulated
    /// series, which is not cached.
    pub async fn fetch_series(&self, ticker: &str) -> PriceSeries {
        let ticker = normalize_ticker(ticker);

        if let Some(hit) = self.cache.get(&ticker).await {
            tracing::debug!(%ticker, "market data cache hit");
            return hit;
        }

        let Some(provider) = self.provider.as_ref() else {
            return self.simulator.generate(&ticker);
        };

        let waited = self.limiter.acquire().await;
        match provider.intraday_series(&ticker).await {
            Ok(bars) => match series_from_bars(&ticker, &bars) {
                Some(series) => {
                    tracing::info!(
                        %ticker,
                        provider = provider.provider_name(),
                        waited_ms = waited.as_millis() as u64,
                        "fetched provider series"
                    );
                    self.cache.put(&ticker, series.clone()).await;
                    series
                }
                None => {
                    tracing::warn!(
                        %ticker,
                        rows = bars.len(),
                        "provider series too short; using simulated series"
                    );
                    self.simulator.generate(&ticker)
                }
            },
            Err(err) => {
                tracing::warn!(
                    %ticker,
                    error = %err,
                    "provider fetch failed; using simulated series"
                );
                self.simulator.generate(&ticker)
            }
        }
    }

    pub async fn fetch_quote(&self, ticker: &str) -> Option<Quote> {
        self.fetch_series(ticker).await.quote()
    }
}

pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().trim_start_matches('$').to_ascii_uppercase()
}

/// Newest `SERIES_LEN` bars, oldest first. `None` when the provider returned fewer.
fn series_from_bars(ticker: &str, bars: &[IntradayBar]) -> Option<PriceSeries> {
    if bars.len() < SERIES_LEN {
        return None;
    }

    let mut sorted: Vec<&IntradayBar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.timestamp);
    let recent = &sorted[sorted.len() - SERIES_LEN..];

    let points = recent
        .iter()
        .map(|bar| PricePoint {
            time: hour_minute(&bar.timestamp),
            price: bar.close.max(MIN_PRICE),
            volume: bar.volume,
        })
        .collect();

    Some(PriceSeries {
        ticker: ticker.to_string(),
        source: SeriesSource::Provider,
        points,
    })
}
