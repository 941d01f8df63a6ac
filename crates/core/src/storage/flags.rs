use crate::domain::flag::FlagRecord;
use crate::domain::verdict::{Category, Verdict};
use crate::monitor::kpi::FlagCounts;
use crate::monitor::tickers::extract_tickers;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

const SELECT_FLAGS: &str = "SELECT id, input_text, input_type, verdict, confidence, reasons, \
     evidence, created_at, reported, reported_at, anonymous \
     FROM flags";

// Rows per page when scanning the whole table for ticker mentions.
const SCAN_PAGE: i64 = 1_000;

#[derive(Debug, sqlx::FromRow)]
struct FlagRow {
    id: Uuid,
    input_text: String,
    input_type: String,
    verdict: String,
    confidence: i16,
    reasons: Vec<String>,
    evidence: Vec<String>,
    created_at: DateTime<Utc>,
    reported: bool,
    reported_at: Option<DateTime<Utc>>,
    anonymous: bool,
}

impl From<FlagRow> for FlagRecord {
    fn from(row: FlagRow) -> Self {
        Self {
            id: row.id,
            input_text: row.input_text,
            input_type: Category::from_hint(&row.input_type),
            verdict: Verdict::from_raw(&row.verdict),
            confidence: row.confidence.clamp(0, 100) as u8,
            reasons: row.reasons,
            evidence: row.evidence,
            created_at: row.created_at,
            reported: row.reported,
            reported_at: row.reported_at,
            anonymous: row.anonymous,
        }
    }
}

pub async fn insert_flag(pool: &sqlx::PgPool, flag: &FlagRecord) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO flags (id, input_text, input_type, verdict, confidence, reasons, evidence, \
         created_at, reported, reported_at, anonymous) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING id",
    )
    .bind(flag.id)
    .bind(&flag.input_text)
    .bind(flag.input_type.as_str())
    .bind(flag.verdict.as_str())
    .bind(i16::from(flag.confidence))
    .bind(&flag.reasons)
    .bind(&flag.evidence)
    .bind(flag.created_at)
    .bind(flag.reported)
    .bind(flag.reported_at)
    .bind(flag.anonymous)
    .fetch_one(pool)
    .await
    .context("insert flags failed")?;

    Ok(id)
}

/// Newest first.
pub async fn recent_flags(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<Vec<FlagRecord>> {
    let rows: Vec<FlagRow> = sqlx::query_as(&format!(
        "{SELECT_FLAGS} ORDER BY created_at DESC LIMIT $1"
    ))
    .bind(limit.max(0))
    .fetch_all(pool)
    .await
    .context("select recent flags failed")?;

    Ok(rows.into_iter().map(FlagRecord::from).collect())
}

/// Everything created at or after `since`, oldest first.
pub async fn flags_since(
    pool: &sqlx::PgPool,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<FlagRecord>> {
    let rows: Vec<FlagRow> = sqlx::query_as(&format!(
        "{SELECT_FLAGS} WHERE created_at >= $1 ORDER BY created_at ASC"
    ))
    .bind(since)
    .fetch_all(pool)
    .await
    .context("select flags since failed")?;

    Ok(rows.into_iter().map(FlagRecord::from).collect())
}

/// Stamps the escalation time. Returns `false` when no flag has that id.
pub async fn mark_reported(
    pool: &sqlx::PgPool,
    id: Uuid,
    anonymous: bool,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        "UPDATE flags SET reported = TRUE, reported_at = now(), anonymous = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(anonymous)
    .execute(pool)
    .await
    .with_context(|| format!("mark flag reported failed (id={id})"))?;
    Ok(res.rows_affected() > 0)
}

#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    total: i64,
    high_risk: i64,
    watch: i64,
    likely_safe: i64,
    reported: i64,
    last_24h: i64,
    high_risk_last_24h: i64,
    confidence_sum: i64,
}

impl From<CountsRow> for FlagCounts {
    fn from(row: CountsRow) -> Self {
        let n = |v: i64| v.max(0) as u64;
        Self {
            total: n(row.total),
            high_risk: n(row.high_risk),
            watch: n(row.watch),
            likely_safe: n(row.likely_safe),
            reported: n(row.reported),
            last_24h: n(row.last_24h),
            high_risk_last_24h: n(row.high_risk_last_24h),
            confidence_sum: n(row.confidence_sum),
        }
    }
}

/// Verdict and activity counters over the whole table.
pub async fn flag_counts(pool: &sqlx::PgPool, now: DateTime<Utc>) -> anyhow::Result<FlagCounts> {
    let row: CountsRow = sqlx::query_as(
        "SELECT COUNT(*) AS total, \
         COUNT(*) FILTER (WHERE verdict = $2) AS high_risk, \
         COUNT(*) FILTER (WHERE verdict = $3) AS watch, \
         COUNT(*) FILTER (WHERE verdict = $4) AS likely_safe, \
         COUNT(*) FILTER (WHERE reported) AS reported, \
         COUNT(*) FILTER (WHERE created_at >= $1) AS last_24h, \
         COUNT(*) FILTER (WHERE created_at >= $1 AND verdict = $2) AS high_risk_last_24h, \
         COALESCE(SUM(confidence), 0)::BIGINT AS confidence_sum \
         FROM flags",
    )
    .bind(now - Duration::hours(24))
    .bind(Verdict::HighRisk.as_str())
    .bind(Verdict::Watch.as_str())
    .bind(Verdict::LikelySafe.as_str())
    .fetch_one(pool)
    .await
    .context("aggregate flag counts failed")?;

    Ok(row.into())
}

/// Ticker mention counts over every stored flag, scanned in keyset pages.
pub async fn ticker_mentions(pool: &sqlx::PgPool) -> anyhow::Result<BTreeMap<String, usize>> {
    let mut out = BTreeMap::new();
    let mut cursor: Option<(DateTime<Utc>, Uuid)> = None;

    loop {
        let page: Vec<(Uuid, DateTime<Utc>, String)> = match cursor {
            Some((created_at, id)) => {
                sqlx::query_as(
                    "SELECT id, created_at, input_text FROM flags \
                     WHERE (created_at, id) > ($1, $2) \
                     ORDER BY created_at, id LIMIT $3",
                )
                .bind(created_at)
                .bind(id)
                .bind(SCAN_PAGE)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as(
                    "SELECT id, created_at, input_text FROM flags \
                     ORDER BY created_at, id LIMIT $1",
                )
                .bind(SCAN_PAGE)
                .fetch_all(pool)
                .await
            }
        }
        .context("scan flag texts failed")?;

        for (_, _, text) in &page {
            for ticker in extract_tickers(text) {
                *out.entry(ticker).or_insert(0) += 1;
            }
        }

        match page.last() {
            Some((id, created_at, _)) if page.len() as i64 == SCAN_PAGE => {
                cursor = Some((*created_at, *id));
            }
            _ => break,
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(verdict: &str, input_type: &str, confidence: i16) -> FlagRow {
        FlagRow {
            id: Uuid::nil(),
            input_text: "Buy XYZ now".to_string(),
            input_type: input_type.to_string(),
            verdict: verdict.to_string(),
            confidence,
            reasons: vec!["urgency".to_string()],
            evidence: vec![],
            created_at: Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
            reported: false,
            reported_at: None,
            anonymous: false,
        }
    }

    #[test]
    fn row_maps_stored_text_back_to_enums() {
        let rec = FlagRecord::from(row("HIGH RISK", "advisor", 88));
        assert_eq!(rec.verdict, Verdict::HighRisk);
        assert_eq!(rec.input_type, Category::Advisor);
        assert_eq!(rec.confidence, 88);
    }

    #[test]
    fn out_of_range_rows_are_tolerated() {
        let rec = FlagRecord::from(row("garbage", "sms", 140));
        assert_eq!(rec.verdict, Verdict::Watch);
        assert_eq!(rec.input_type, Category::Tip);
        assert_eq!(rec.confidence, 100);
    }

    #[test]
    fn report_metadata_survives_row_mapping() {
        let at = Utc.with_ymd_and_hms(2026, 3, 11, 8, 30, 0).unwrap();
        let mut r = row("WATCH", "tip", 60);
        r.reported = true;
        r.reported_at = Some(at);
        r.anonymous = true;

        let rec = FlagRecord::from(r);
        assert!(rec.reported);
        assert_eq!(rec.reported_at, Some(at));
        assert!(rec.anonymous);
    }

    #[test]
    fn negative_aggregates_clamp_to_zero() {
        let counts = FlagCounts::from(CountsRow {
            total: 3,
            high_risk: 1,
            watch: 1,
            likely_safe: 1,
            reported: 0,
            last_24h: 2,
            high_risk_last_24h: -1,
            confidence_sum: 240,
        });
        assert_eq!(counts.total, 3);
        assert_eq!(counts.high_risk_last_24h, 0);
        assert_eq!(counts.avg_confidence(), 80);
    }
}
