//! Aggregates behind the regulator monitoring views. Everything here is a pure function over
//! a slice of [`FlagRecord`](crate::domain::flag::FlagRecord)s.

pub mod alerts;
pub mod correlation;
pub mod kpi;
pub mod tickers;

use crate::domain::flag::FlagRecord;
use chrono::{DateTime, Duration, Utc};

/// Records created within the trailing 24 hours of `now`.
pub fn last_24h<'a>(
    records: &'a [FlagRecord],
    now: DateTime<Utc>,
) -> impl Iterator<Item = &'a FlagRecord> + 'a {
    let cutoff = now - Duration::hours(24);
    records.iter().filter(move |r| r.created_at >= cutoff)
}
