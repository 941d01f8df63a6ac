use crate::domain::flag::FlagRecord;
use crate::domain::market::{PriceSeries, SeriesSource};
use crate::monitor::last_24h;
use crate::monitor::tickers::mentions_ticker;
use crate::time::labels::local_hour_minute;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub time: String,
    pub price: f64,
    pub trading_volume: u64,
    pub message_volume: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationView {
    pub ticker: String,
    pub source: SeriesSource,
    pub points: Vec<CorrelationPoint>,
}

/// Messages mentioning `ticker` in the last 24 hours, bucketed by local hour (`"HH"`).
pub fn message_volume_by_hour(
    records: &[FlagRecord],
    ticker: &str,
    now: DateTime<Utc>,
) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for record in last_24h(records, now) {
        if mentions_ticker(&record.input_text, ticker) {
            let label = local_hour_minute(record.created_at);
            *out.entry(hour_key(&label).to_string()).or_insert(0) += 1;
        }
    }
    out
}

/// Joins each price point with the message count for its hour.
pub fn correlate(
    series: &PriceSeries,
    volume_by_hour: &BTreeMap<String, usize>,
) -> CorrelationView {
    let points = series
        .points
        .iter()
        .map(|p| CorrelationPoint {
            time: p.time.clone(),
            price: p.price,
            trading_volume: p.volume,
            message_volume: volume_by_hour.get(hour_key(&p.time)).copied().unwrap_or(0),
        })
        .collect();

    CorrelationView {
        ticker: series.ticker.clone(),
        source: series.source,
        points,
    }
}

fn hour_key(label: &str) -> &str {
    label.split(':').next().unwrap_or(label)
}
