use crate::domain::flag::FlagRecord;
use crate::monitor::last_24h;
use crate::monitor::tickers::count_mentions;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const MAX_ALERTS: usize = 5;
const SPIKE_MULTIPLE: f64 = 3.0;
const MEDIUM_MULTIPLE: f64 = 4.0;
const HIGH_MULTIPLE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeAlert {
    pub ticker: String,
    pub mentions: usize,
    pub median: usize,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Tickers whose 24-hour mention count exceeds three times the median across all mentioned
/// tickers. Most-mentioned first, capped at [`MAX_ALERTS`].
pub fn volume_alerts(records: &[FlagRecord], now: DateTime<Utc>) -> Vec<VolumeAlert> {
    let counts = count_mentions(last_24h(records, now).map(|r| r.input_text.as_str()));
    if counts.is_empty() {
        return Vec::new();
    }

    let mut volumes: Vec<usize> = counts.values().copied().collect();
    volumes.sort_unstable();
    let median = volumes[volumes.len() / 2];
    let m = median as f64;

    let mut alerts: Vec<VolumeAlert> = counts
        .into_iter()
        .filter(|(_, v)| *v as f64 > m * SPIKE_MULTIPLE)
        .map(|(ticker, mentions)| {
            let v = mentions as f64;
            let severity = if v > m * HIGH_MULTIPLE {
                AlertSeverity::High
            } else if v > m * MEDIUM_MULTIPLE {
                AlertSeverity::Medium
            } else {
                AlertSeverity::Low
            };
            let pct = (v / m * 100.0).round() as u64;
            VolumeAlert {
                message: format!(
                    "Message volume spike detected: {mentions} messages ({pct}% of median)"
                ),
                ticker,
                mentions,
                median,
                severity,
            }
        })
        .collect();

    alerts.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.ticker.cmp(&b.ticker)));
    alerts.truncate(MAX_ALERTS);
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verdict::Verdict;
    use crate::monitor::fixtures::{flag, now};

    fn mentions(ticker: &str, n: usize, hours_ago: i64) -> Vec<FlagRecord> {
        (0..n)
            .map(|_| flag(&format!("tip on ${ticker}"), Verdict::Watch, 70, hours_ago))
            .collect()
    }

    #[test]
    fn no_mentions_no_alerts() {
        assert!(volume_alerts(&[], now()).is_empty());
        let quiet = vec![flag("nothing here", Verdict::Watch, 50, 1)];
        assert!(volume_alerts(&quiet, now()).is_empty());
    }

    #[test]
    fn spike_above_three_times_median() {
        let mut records = Vec::new();
        records.extend(mentions("AAA", 1, 1));
        records.extend(mentions("BBB", 1, 1));
        records.extend(mentions("CCC", 1, 1));
        records.extend(mentions("PUMP", 6, 2));
        records.extend(mentions("MID", 4, 2));

        let alerts = volume_alerts(&records, now());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].ticker, "PUMP");
        assert_eq!(alerts[0].median, 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[1].ticker, "MID");
        assert_eq!(alerts[1].severity, AlertSeverity::Low);
    }

    #[test]
    fn stale_mentions_are_ignored() {
        let mut records = Vec::new();
        records.extend(mentions("AAA", 1, 1));
        records.extend(mentions("BBB", 1, 1));
        records.extend(mentions("OLD", 9, 48));
        assert!(volume_alerts(&records, now()).is_empty());
    }
}
