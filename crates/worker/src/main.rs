use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fraudshield_core::classify::Classifier;
use fraudshield_core::config::Settings;
use fraudshield_core::domain::verdict::Category;
use fraudshield_core::domain::flag::FlagRecord;
use fraudshield_core::market::MarketDataFetcher;
use fraudshield_core::monitor::kpi::DashboardKpis;
use fraudshield_core::storage::flags;

#[derive(Debug, Parser)]
#[command(name = "fraudshield_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify a single submission and print the verdict.
    Classify {
        #[arg(long)]
        text: String,

        /// advisor, tip, link or file. Unknown values are treated as tip.
        #[arg(long, default_value = "tip")]
        category: String,
    },
    /// Print the 24-point hourly series for a ticker.
    Series {
        #[arg(long)]
        ticker: String,
    },
    Quote {
        #[arg(long)]
        ticker: String,
    },
    /// Dashboard KPIs over every persisted flag, plus the newest ones. Needs DATABASE_URL.
    Kpis {
        /// How many recent flags to print alongside the KPIs.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args.command, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "command failed");
        return Err(err);
    }
    Ok(())
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Classify { text, category } => {
            let classifier = Classifier::from_settings(settings)?;
            let result = classifier
                .classify(&text, Category::from_hint(&category))
                .await;
            print_json(&result)
        }
        Command::Series { ticker } => {
            let fetcher = MarketDataFetcher::from_settings(settings);
            print_json(&fetcher.fetch_series(&ticker).await)
        }
        Command::Quote { ticker } => {
            let fetcher = MarketDataFetcher::from_settings(settings);
            let quote = fetcher
                .fetch_quote(&ticker)
                .await
                .with_context(|| format!("no quote available for {ticker}"))?;
            print_json(&quote)
        }
        Command::Kpis { limit } => {
            let db_url = settings.require_database_url()?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(2)
                .connect(db_url)
                .await
                .context("connect DATABASE_URL failed")?;

            fraudshield_core::storage::migrate(&pool).await?;

            let counts = flags::flag_counts(&pool, chrono::Utc::now()).await?;
            let mentions = flags::ticker_mentions(&pool).await?;
            let recent_flags = flags::recent_flags(&pool, limit).await?;
            tracing::info!(total = counts.total, "aggregated flags");

            print_json(&KpiReport {
                kpis: DashboardKpis::from_counts(&counts, &mentions),
                recent_flags,
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct KpiReport {
    kpis: DashboardKpis,
    recent_flags: Vec<FlagRecord>,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
