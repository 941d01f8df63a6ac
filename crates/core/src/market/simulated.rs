//! Placeholder series used when the provider is unavailable. Seeded by the ticker so each
//! symbol keeps a recognisable price level, but the per-step jitter is random.

use crate::domain::market::{PricePoint, PriceSeries, SeriesSource, MIN_PRICE, SERIES_LEN};
use crate::time::labels::{hour_minute, trailing_hours};
use chrono::{DateTime, Local};
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub base_price: f64,
    pub base_span: u32,
    /// Width of the uniform per-step jitter, centred on zero.
    pub jitter: f64,
    /// Weight of the seeded sine drift.
    pub drift: f64,
    pub min_volume: u64,
    pub volume_span: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            base_price: 100.0,
            base_span: 200,
            jitter: 0.05,
            drift: 0.1 * 0.02,
            min_volume: 100_000,
            volume_span: 1_000_000,
        }
    }
}

pub fn ticker_seed(ticker: &str) -> u32 {
    ticker.chars().map(|c| c as u32).fold(0u32, u32::wrapping_add)
}

#[derive(Debug, Clone, Default)]
pub struct SeriesSimulator {
    params: SimulationParams,
}

impl SeriesSimulator {
    pub fn new(params: SimulationParams) -> Self {
        Self { params }
    }

    pub fn base_price(&self, ticker: &str) -> f64 {
        let span = self.params.base_span.max(1);
        self.params.base_price + f64::from(ticker_seed(ticker) % span)
    }

    pub fn generate(&self, ticker: &str) -> PriceSeries {
        self.generate_at(ticker, Local::now(), &mut rand::thread_rng())
    }

    pub fn generate_at<R: Rng + ?Sized>(
        &self,
        ticker: &str,
        now: DateTime<Local>,
        rng: &mut R,
    ) -> PriceSeries {
        let p = &self.params;
        let seed = f64::from(ticker_seed(ticker));
        let mut price = self.base_price(ticker);

        let hours = trailing_hours(now, SERIES_LEN);
        let points = hours
            .iter()
            .enumerate()
            .map(|(idx, at)| {
                let hours_ago = (SERIES_LEN - 1 - idx) as f64;
                let noise =
                    (rng.gen::<f64>() - 0.5) * p.jitter + (seed + hours_ago).sin() * p.drift;
                price = (price * (1.0 + noise)).max(MIN_PRICE);
                PricePoint {
                    time: hour_minute(at),
                    price,
                    volume: p.min_volume + rng.gen_range(0..p.volume_span.max(1)),
                }
            })
            .collect();

        PriceSeries {
            ticker: ticker.to_string(),
            source: SeriesSource::Simulated,
            points,
        }
    }
}
