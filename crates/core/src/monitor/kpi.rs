use crate::domain::flag::FlagRecord;
use crate::domain::verdict::Verdict;
use crate::monitor::last_24h;
use crate::monitor::tickers::count_mentions;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardKpis {
    pub total_flags: u64,
    pub high_risk_flags: u64,
    pub watch_flags: u64,
    pub safe_flags: u64,
    pub avg_confidence: u8,
    pub reported_flags: u64,
    pub flags_last_24h: u64,
    pub high_risk_last_24h: u64,
    pub top_ticker: Option<String>,
}

/// Verdict and activity counters over a set of flags. Built from records in memory, or
/// aggregated by the database when the whole table is in scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagCounts {
    pub total: u64,
    pub high_risk: u64,
    pub watch: u64,
    pub likely_safe: u64,
    pub reported: u64,
    pub last_24h: u64,
    pub high_risk_last_24h: u64,
    pub confidence_sum: u64,
}

impl FlagCounts {
    pub fn from_records(records: &[FlagRecord], now: DateTime<Utc>) -> Self {
        let count = |v: Verdict| records.iter().filter(|r| r.verdict == v).count() as u64;
        let recent: Vec<&FlagRecord> = last_24h(records, now).collect();

        Self {
            total: records.len() as u64,
            high_risk: count(Verdict::HighRisk),
            watch: count(Verdict::Watch),
            likely_safe: count(Verdict::LikelySafe),
            reported: records.iter().filter(|r| r.reported).count() as u64,
            last_24h: recent.len() as u64,
            high_risk_last_24h: recent
                .iter()
                .filter(|r| r.verdict == Verdict::HighRisk)
                .count() as u64,
            confidence_sum: records.iter().map(|r| u64::from(r.confidence)).sum(),
        }
    }

    /// Rounded mean confidence, 0 when there are no flags.
    pub fn avg_confidence(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.confidence_sum as f64 / self.total as f64)
            .round()
            .clamp(0.0, 100.0) as u8
    }
}

impl DashboardKpis {
    pub fn from_counts(counts: &FlagCounts, mentions: &BTreeMap<String, usize>) -> Self {
        // Ties go to the alphabetically first ticker.
        let top_ticker = mentions
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(t, _)| t.clone());

        Self {
            total_flags: counts.total,
            high_risk_flags: counts.high_risk,
            watch_flags: counts.watch,
            safe_flags: counts.likely_safe,
            avg_confidence: counts.avg_confidence(),
            reported_flags: counts.reported,
            flags_last_24h: counts.last_24h,
            high_risk_last_24h: counts.high_risk_last_24h,
            top_ticker,
        }
    }
}

pub fn dashboard_kpis(records: &[FlagRecord], now: DateTime<Utc>) -> DashboardKpis {
    let mentions = count_mentions(records.iter().map(|r| r.input_text.as_str()));
    DashboardKpis::from_counts(&FlagCounts::from_records(records, now), &mentions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::fixtures::{flag, now};

    #[test]
    fn empty_feed_has_zeroed_kpis() {
        let k = dashboard_kpis(&[], now());
        assert_eq!(k.total_flags, 0);
        assert_eq!(k.avg_confidence, 0);
        assert_eq!(k.top_ticker, None);
    }

    #[test]
    fn counts_verdicts_and_recent_activity() {
        let mut reported = flag("$AAPL to the moon", Verdict::HighRisk, 90, 30);
        reported.reported = true;
        let records = vec![
            flag("AAPL guaranteed double", Verdict::HighRisk, 90, 1),
            flag("Quarterly results for MSFT", Verdict::LikelySafe, 85, 2),
            flag("Rumour about AAPL", Verdict::Watch, 75, 5),
            reported,
        ];

        let k = dashboard_kpis(&records, now());
        assert_eq!(k.total_flags, 4);
        assert_eq!(k.high_risk_flags, 2);
        assert_eq!(k.watch_flags, 1);
        assert_eq!(k.safe_flags, 1);
        assert_eq!(k.avg_confidence, 85);
        assert_eq!(k.reported_flags, 1);
        assert_eq!(k.flags_last_24h, 3);
        assert_eq!(k.high_risk_last_24h, 1);
        assert_eq!(k.top_ticker.as_deref(), Some("AAPL"));
    }

    #[test]
    fn table_wide_counts_are_not_capped() {
        let counts = FlagCounts {
            total: 1_500,
            high_risk: 900,
            watch: 400,
            likely_safe: 200,
            reported: 30,
            last_24h: 120,
            high_risk_last_24h: 70,
            confidence_sum: 1_500 * 80 + 700,
        };
        let mentions = BTreeMap::from([("TSLA".to_string(), 4), ("AAPL".to_string(), 4)]);

        let k = DashboardKpis::from_counts(&counts, &mentions);
        assert_eq!(k.total_flags, 1_500);
        assert_eq!(k.high_risk_flags, 900);
        assert_eq!(k.safe_flags, 200);
        assert_eq!(k.avg_confidence, 80);
        assert_eq!(k.reported_flags, 30);
        assert_eq!(k.top_ticker.as_deref(), Some("AAPL"));
    }

    #[test]
    fn in_memory_counts_match_kpis() {
        let records = vec![
            flag("TSLA pump", Verdict::HighRisk, 91, 3),
            flag("TSLA results", Verdict::LikelySafe, 84, 40),
        ];
        let counts = FlagCounts::from_records(&records, now());
        assert_eq!(counts.confidence_sum, 175);
        assert_eq!(counts.last_24h, 1);
        assert_eq!(counts.avg_confidence(), 88);
    }
}
