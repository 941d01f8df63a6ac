use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fraudshield_core::classify::Classifier;
use fraudshield_core::domain::flag::FlagRecord;
use fraudshield_core::domain::market::{PricePoint, Quote, SeriesSource};
use fraudshield_core::domain::verdict::{Category, ClassificationResult};
use fraudshield_core::market::{normalize_ticker, MarketDataFetcher};
use fraudshield_core::monitor::alerts::{volume_alerts, VolumeAlert};
use fraudshield_core::monitor::correlation::{correlate, message_volume_by_hour, CorrelationView};
use fraudshield_core::monitor::kpi::DashboardKpis;
use fraudshield_core::screening::corporate::{CorporateCheckReport, CorporateChecker};
use fraudshield_core::screening::filings::{
    latest_filings, BseFeedClient, FilingsFeed, LatestFilings,
};
use fraudshield_core::screening::platform::{verify_platform, PlatformVerification};
use fraudshield_core::storage::flags;

const DASHBOARD_RECENT: i64 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fraudshield_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();
    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match fraudshield_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(
                        error = %e,
                        "db migrations failed; starting API in degraded mode"
                    );
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let llm = fraudshield_core::llm::client_from_settings(&settings);
    if llm.is_none() {
        tracing::info!("no model credential configured; screening runs heuristic-only");
    }
    let feed: Option<Arc<dyn FilingsFeed>> = match BseFeedClient::from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "filings feed unavailable");
            None
        }
    };

    let state = AppState {
        pool,
        classifier: Arc::new(Classifier::with_llm(
            llm.clone(),
            settings.evidence_urls.clone(),
        )?),
        fetcher: Arc::new(MarketDataFetcher::from_settings(&settings)),
        corporate: Arc::new(CorporateChecker::new(llm, feed)),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/check", post(check))
        .route("/market-data/:ticker", get(market_data))
        .route("/market-data/:ticker/quote", get(market_quote))
        .route("/dashboard", get(dashboard))
        .route("/alerts", get(alerts))
        .route("/correlation/:ticker", get(correlation))
        .route("/flags/:id/report", post(report_flag))
        .route("/corporate-check", post(corporate_check))
        .route("/bse-latest", get(bse_latest))
        .route("/verify-platform", post(platform_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    classifier: Arc<Classifier>,
    fetcher: Arc<MarketDataFetcher>,
    corporate: Arc<CorporateChecker>,
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, "storage request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    input_text: String,
    #[serde(rename = "type", default)]
    input_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    #[serde(flatten)]
    result: ClassificationResult,
    flag_id: Option<Uuid>,
}

async fn check(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, StatusCode> {
    let text = req.input_text.trim();
    if text.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let category = req
        .input_type
        .as_deref()
        .map(Category::from_hint)
        .unwrap_or_default();

    let result = state.classifier.classify(text, category).await;

    // Persistence is best effort; the verdict is returned either way.
    let flag_id = match &state.pool {
        Some(pool) => {
            let record = FlagRecord::from_result(text, category, &result, Utc::now());
            match flags::insert_flag(pool, &record).await {
                Ok(id) => Some(id),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "failed to persist flag");
                    None
                }
            }
        }
        None => None,
    };

    Ok(Json(CheckResponse { result, flag_id }))
}

#[derive(Debug, Serialize)]
struct MarketDataResponse {
    ticker: String,
    source: SeriesSource,
    data: Vec<PricePoint>,
    api_configured: bool,
    rate_limited: bool,
    timestamp: DateTime<Utc>,
}

async fn market_data(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<MarketDataResponse>, StatusCode> {
    let ticker = normalize_ticker(&ticker);
    if ticker.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let series = state.fetcher.fetch_series(&ticker).await;
    let status = state.fetcher.status().await;

    Ok(Json(MarketDataResponse {
        ticker: series.ticker,
        source: series.source,
        data: series.points,
        api_configured: status.configured,
        rate_limited: status.rate_limited,
        timestamp: Utc::now(),
    }))
}

async fn market_quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Quote>, StatusCode> {
    let ticker = normalize_ticker(&ticker);
    if ticker.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .fetcher
        .fetch_quote(&ticker)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    kpis: DashboardKpis,
    recent_flags: Vec<FlagRecord>,
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    // Aggregates cover the whole table; only the listing is windowed.
    let counts = flags::flag_counts(pool, Utc::now())
        .await
        .map_err(internal_error)?;
    let mentions = flags::ticker_mentions(pool).await.map_err(internal_error)?;
    let recent_flags = flags::recent_flags(pool, DASHBOARD_RECENT)
        .await
        .map_err(internal_error)?;
    let kpis = DashboardKpis::from_counts(&counts, &mentions);

    Ok(Json(DashboardResponse { kpis, recent_flags }))
}

async fn alerts(State(state): State<AppState>) -> Result<Json<Vec<VolumeAlert>>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let now = Utc::now();
    let records = flags::flags_since(pool, now - Duration::hours(24))
        .await
        .map_err(internal_error)?;

    Ok(Json(volume_alerts(&records, now)))
}

async fn correlation(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<CorrelationView>, StatusCode> {
    let ticker = normalize_ticker(&ticker);
    if ticker.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let now = Utc::now();
    // Without storage the price side is still served, with zero message volume.
    let records = match &state.pool {
        Some(pool) => flags::flags_since(pool, now - Duration::hours(24))
            .await
            .map_err(internal_error)?,
        None => Vec::new(),
    };

    let series = state.fetcher.fetch_series(&ticker).await;
    let volume = message_volume_by_hour(&records, &ticker, now);
    Ok(Json(correlate(&series, &volume)))
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    #[serde(default)]
    anonymous: bool,
}

/// The body is optional; a bare POST files a named report.
async fn report_flag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ReportRequest>>,
) -> Result<StatusCode, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let id = Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let anonymous = body.is_some_and(|Json(req)| req.anonymous);
    let updated = flags::mark_reported(pool, id, anonymous)
        .await
        .map_err(internal_error)?;

    if updated {
        tracing::info!(%id, anonymous, "flag reported");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
struct CorporateCheckRequest {
    text: String,
}

async fn corporate_check(
    State(state): State<AppState>,
    Json(req): Json<CorporateCheckRequest>,
) -> Json<CorporateCheckReport> {
    Json(state.corporate.check(&req.text).await)
}

async fn bse_latest(State(state): State<AppState>) -> Json<LatestFilings> {
    Json(latest_filings(state.corporate.feed()).await)
}

#[derive(Debug, Deserialize)]
struct VerifyPlatformRequest {
    name: String,
}

async fn platform_check(Json(req): Json<VerifyPlatformRequest>) -> Json<PlatformVerification> {
    Json(verify_platform(&req.name))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &fraudshield_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
