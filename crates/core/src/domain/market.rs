use serde::{Deserialize, Serialize};

/// Number of hourly samples in a series.
pub const SERIES_LEN: usize = 24;

/// Positive floor applied to every price, real or simulated.
pub const MIN_PRICE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Local `HH:MM` label.
    pub time: String,
    pub price: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    Provider,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub source: SeriesSource,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last-vs-previous delta. `None` with fewer than two points.
    pub fn quote(&self) -> Option<Quote> {
        let [.., previous, current] = self.points.as_slice() else {
            return None;
        };
        let change = current.price - previous.price;
        Some(Quote {
            price: current.price,
            change,
            change_percent: change / previous.price * 100.0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
}
