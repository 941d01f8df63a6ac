//! Per-ticker cache of provider series.

use crate::domain::market::PriceSeries;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    series: PriceSeries,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct SeriesCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh entry for `ticker`, if one was stored less than `ttl` ago.
    pub async fn get(&self, ticker: &str) -> Option<PriceSeries> {
        let entries = self.entries.read().await;
        entries.get(ticker).and_then(|entry| {
            if entry.fetched_at.elapsed() < self.ttl {
                Some(entry.series.clone())
            } else {
                None
            }
        })
    }

    /// Replaces any previous entry for the ticker. Expired entries for other tickers are
    /// evicted on the same write.
    pub async fn put(&self, ticker: &str, series: PriceSeries) {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
        entries.insert(
            ticker.to_string(),
            CacheEntry {
                series,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{PricePoint, SeriesSource};

    fn series(price: f64) -> PriceSeries {
        PriceSeries {
            ticker: "INFY".to_string(),
            source: SeriesSource::Provider,
            points: vec![PricePoint {
                time: "10:00".to_string(),
                price,
                volume: 10,
            }],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = SeriesCache::default();
        cache.put("INFY", series(10.0)).await;
        assert!(cache.get("INFY").await.is_some());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("INFY").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("INFY").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn put_evicts_stale_tickers() {
        let cache = SeriesCache::default();
        cache.put("INFY", series(10.0)).await;
        cache.put("TCS", series(11.0)).await;

        tokio::time::advance(Duration::from_secs(200)).await;
        cache.put("WIPRO", series(12.0)).await;
        assert_eq!(cache.len().await, 3);

        tokio::time::advance(Duration::from_secs(150)).await;
        cache.put("HDFC", series(13.0)).await;
        assert_eq!(cache.len().await, 2);
        assert!(cache.get("WIPRO").await.is_some());
        assert!(cache.get("INFY").await.is_none());
    }

    #[tokio::test]
    async fn later_puts_replace_earlier_ones() {
        let cache = SeriesCache::default();
        cache.put("INFY", series(10.0)).await;
        cache.put("INFY", series(12.0)).await;
        assert_eq!(cache.get("INFY").await.unwrap().points[0].price, 12.0);
        assert_eq!(cache.len().await, 1);
    }
}
