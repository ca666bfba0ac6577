//! Forecast pipeline over cached history, models and results
//!
//! For each requested location the pipeline branches on whether history was
//! already cached. First contact saves the transformed rows, trains all five
//! variable models and persists them. Later contacts load persisted models
//! and only retrain when an artifact is missing or unreadable; those fallback
//! models are served but deliberately not written back. The assembled result
//! document is always upserted, one row per (location, forecast date).
//!
//! Storage sits behind `ForecastStore` so the branch logic is testable
//! without Postgres; `PgForecastStore` is the production implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;

use shared::forecasting::{self, TrainingStats};
use shared::model::{ModelError, TrainedModel};
use shared::models::forecast::ForecastResult;
use shared::models::observation::ObservationRow;
use shared::models::variable::ForecastKind;
use shared::types::Location;

use crate::error::{AppError, AppResult};

/// Persistence contract for history rows, model artifacts and results.
///
/// Semantics the implementations must uphold: `has_history` is a pure read
/// (idempotent between writes), `save_history` ignores rows whose
/// (lat, lon, local timestamp) key already exists and reports how many were
/// new, `save_model` and `save_result` overwrite on key conflict.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    async fn has_history(&self, location: Location) -> AppResult<bool>;

    async fn save_history(&self, rows: &[ObservationRow]) -> AppResult<u64>;

    async fn save_model(&self, location: Location, model: &TrainedModel) -> AppResult<()>;

    async fn load_model(
        &self,
        location: Location,
        kind: ForecastKind,
    ) -> AppResult<Option<TrainedModel>>;

    async fn save_result(&self, location: Location, result: &ForecastResult) -> AppResult<()>;
}

/// Postgres implementation of `ForecastStore`
#[derive(Clone)]
pub struct PgForecastStore {
    db: PgPool,
}

impl PgForecastStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ForecastStore for PgForecastStore {
    async fn has_history(&self, location: Location) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM historico_localizacao WHERE lat = $1 AND lon = $2)",
        )
        .bind(location.lat)
        .bind(location.lon)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn save_history(&self, rows: &[ObservationRow]) -> AppResult<u64> {
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO historico_localizacao
                    (lat, lon, timestamp_local, tlml, qlml, speedlml, prectotcorr, tqv)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (lat, lon, timestamp_local) DO NOTHING
                "#,
            )
            .bind(row.lat)
            .bind(row.lon)
            .bind(row.timestamp_local)
            .bind(row.tlml)
            .bind(row.qlml)
            .bind(row.speedlml)
            .bind(row.prectotcorr)
            .bind(row.tqv)
            .execute(&self.db)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn save_model(&self, location: Location, model: &TrainedModel) -> AppResult<()> {
        let bytes = model.to_bytes()?;
        sqlx::query(
            r#"
            INSERT INTO modelos_treinados (lat, lon, tipo, modelo_pickle)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (lat, lon, tipo)
            DO UPDATE SET modelo_pickle = EXCLUDED.modelo_pickle
            "#,
        )
        .bind(location.lat)
        .bind(location.lon)
        .bind(model.kind.as_str())
        .bind(&bytes)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn load_model(
        &self,
        location: Location,
        kind: ForecastKind,
    ) -> AppResult<Option<TrainedModel>> {
        let bytes = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT modelo_pickle FROM modelos_treinados WHERE lat = $1 AND lon = $2 AND tipo = $3",
        )
        .bind(location.lat)
        .bind(location.lon)
        .bind(kind.as_str())
        .fetch_optional(&self.db)
        .await?;

        let Some(bytes) = bytes else {
            return Ok(None);
        };
        match TrainedModel::from_bytes(&bytes) {
            Ok(model) => Ok(Some(model)),
            Err(error) => {
                tracing::warn!(%location, %kind, %error, "stored model unreadable, retraining");
                Ok(None)
            }
        }
    }

    async fn save_result(&self, location: Location, result: &ForecastResult) -> AppResult<()> {
        let document = serde_json::to_value(result)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("serializing forecast: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO previsoes (lat, lon, data, resultado)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (lat, lon, data)
            DO UPDATE SET resultado = EXCLUDED.resultado
            "#,
        )
        .bind(location.lat)
        .bind(location.lon)
        .bind(result.timestamp.date())
        .bind(document)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// Service for forecast training, persistence and prediction
#[derive(Clone)]
pub struct ForecastService<S: ForecastStore> {
    store: S,
    horizon: usize,
    interval_level: f64,
    stats: Arc<TrainingStats>,
}

impl<S: ForecastStore> ForecastService<S> {
    pub fn new(store: S, horizon: usize, interval_level: f64) -> Self {
        Self {
            store,
            horizon,
            interval_level,
            stats: Arc::new(TrainingStats::default()),
        }
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub async fn has_history(&self, location: Location) -> AppResult<bool> {
        self.store.has_history(location).await
    }

    pub async fn save_history(&self, rows: &[ObservationRow]) -> AppResult<u64> {
        self.store.save_history(rows).await
    }

    pub async fn save_model(&self, location: Location, model: &TrainedModel) -> AppResult<()> {
        self.store.save_model(location, model).await
    }

    /// Run the whole pipeline for one location: cache or reuse history,
    /// train or load models, predict at `target` and persist the result.
    pub async fn forecast(
        &self,
        location: Location,
        rows: &[ObservationRow],
        target: NaiveDateTime,
    ) -> AppResult<ForecastResult> {
        if rows.is_empty() {
            return Err(AppError::NoData(location));
        }

        let models = if self.store.has_history(location).await? {
            tracing::info!(%location, "history cached, loading persisted models");
            let mut models = BTreeMap::new();
            for kind in ForecastKind::ALL {
                let model = match self.store.load_model(location, kind).await? {
                    Some(model) => model,
                    // Fallback retrain; the replacement is served for this
                    // request but not written back.
                    None => forecasting::train_model(
                        rows,
                        kind,
                        self.horizon,
                        self.interval_level,
                        &self.stats,
                    )?,
                };
                models.insert(kind, model);
            }
            models
        } else {
            tracing::info!(%location, rows = rows.len(), "first contact, saving history and training");
            let inserted = self.store.save_history(rows).await?;
            tracing::debug!(%location, inserted, "history rows cached");
            let models =
                forecasting::train_models(rows, self.horizon, self.interval_level, &self.stats)?;
            for model in models.values() {
                self.store.save_model(location, model).await?;
            }
            models
        };

        let result = forecasting::assemble_forecast(&models, location, target).map_err(
            |error| match error {
                ModelError::TargetOutsideHorizon(timestamp) => AppError::ForecastIndex(timestamp),
                other => AppError::Model(other),
            },
        )?;

        self.store.save_result(location, &result).await?;
        Ok(result)
    }
}
