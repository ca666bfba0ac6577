//! Offline batch pre-collector
//!
//! Reads a CSV of candidate points (the land-mask sampler's output), fetches
//! the historical window for every location and, for locations without cached
//! history, saves the transformed rows and trains and persists all five
//! models. Locations that already have history are left untouched; the
//! endpoint serves them from cache.
//!
//! Usage: collect-batch <points.csv>

use chrono::{Duration, NaiveDateTime};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::forecasting::{self, TrainingStats};
use shared::transform;
use shared::types::Location;

#[path = "../config.rs"]
mod config;
#[path = "../error.rs"]
mod error;
#[path = "../external/mod.rs"]
mod external;
#[path = "../services/mod.rs"]
mod services;

use external::giovanni::GiovanniClient;
use services::collect::CollectService;
use services::forecast::{ForecastService, PgForecastStore};
use services::timezone;

fn read_points(path: &str) -> anyhow::Result<Vec<Location>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let lat: f64 = record
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("row missing lat"))?
            .trim()
            .parse()?;
        let lon: f64 = record
            .get(1)
            .ok_or_else(|| anyhow::anyhow!("row missing lon"))?
            .trim()
            .parse()?;
        points.push(Location::new(lat, lon));
    }
    Ok(points)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collect_batch=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cfg = config::Config::load()?;

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: collect-batch <points.csv>"))?;
    let points = read_points(&path)?;
    tracing::info!(count = points.len(), "loaded candidate points");

    let db = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .min_connections(cfg.database.min_connections)
        .connect(&cfg.database.url)
        .await?;

    let giovanni = GiovanniClient::new(cfg.giovanni.base_url.clone(), cfg.giovanni.token.clone());
    let collector = CollectService::new(giovanni, cfg.forecast.fetch_concurrency);
    let forecast_service = ForecastService::new(
        PgForecastStore::new(db),
        cfg.forecast.horizon_steps,
        cfg.forecast.interval_level,
    );

    let window_start = NaiveDateTime::parse_from_str(
        &cfg.forecast.train_window_start,
        "%Y-%m-%dT%H:%M:%S",
    )?
    .and_utc();
    let window_end = NaiveDateTime::parse_from_str(
        &cfg.forecast.train_window_end,
        "%Y-%m-%dT%H:%M:%S",
    )?
    .and_utc();

    // Skip locations already collected before touching the upstream API.
    let mut pending = Vec::new();
    for point in points {
        if forecast_service.has_history(point).await? {
            tracing::debug!(%point, "history cached, skipping");
        } else {
            pending.push(point);
        }
    }
    tracing::info!(count = pending.len(), "locations to collect");

    let (group_a_tables, group_b_tables) = collector
        .collect_batch(&pending, window_start, window_end)
        .await;

    let stats = TrainingStats::default();
    let mut trained = 0usize;
    for group_a in &group_a_tables {
        let location = group_a.location();
        let Some(group_b) = group_b_tables.iter().find(|t| t.location() == location) else {
            tracing::warn!(%location, "no flux table, skipping location");
            continue;
        };

        let offset = match timezone::utc_offset(location) {
            Ok(offset) => offset,
            Err(error) => {
                tracing::warn!(%location, %error, "timezone lookup failed, skipping");
                continue;
            }
        };

        let rows = match transform::transform(
            group_a,
            group_b,
            Duration::minutes(cfg.forecast.flux_offset_minutes),
            offset,
        ) {
            Ok(rows) => rows,
            Err(error) => {
                tracing::warn!(%location, %error, "transform failed, skipping");
                continue;
            }
        };

        let inserted = forecast_service.save_history(&rows).await?;
        let models = match forecasting::train_models(
            &rows,
            cfg.forecast.horizon_steps,
            cfg.forecast.interval_level,
            &stats,
        ) {
            Ok(models) => models,
            Err(error) => {
                tracing::warn!(%location, %error, "training failed, history kept");
                continue;
            }
        };
        for model in models.values() {
            forecast_service.save_model(location, model).await?;
        }
        trained += 1;
        tracing::info!(%location, inserted, "location collected and trained");
    }

    tracing::info!(
        locations = trained,
        fits = stats.fits(),
        "batch collection finished"
    );
    Ok(())
}
