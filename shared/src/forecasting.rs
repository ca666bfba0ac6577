//! Training and forecast assembly over the five variable models

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;

use crate::model::{ModelError, TrainedModel};
use crate::models::forecast::{
    ForecastLocation, ForecastResult, ForecastVariables, ModelInfo, VariableForecast,
};
use crate::models::observation::ObservationRow;
use crate::models::variable::ForecastKind;
use crate::types::Location;

/// Counts actual model fits, so callers can observe whether a request
/// retrained or reused persisted artifacts.
#[derive(Debug, Default)]
pub struct TrainingStats {
    fits: AtomicUsize,
}

impl TrainingStats {
    pub fn record_fit(&self) {
        self.fits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fits(&self) -> usize {
        self.fits.load(Ordering::Relaxed)
    }
}

/// Extract one variable's (local timestamp, value) training series from the
/// transformed rows. Rows without a value for the variable (unmatched flux
/// columns) are skipped.
pub fn training_series(rows: &[ObservationRow], kind: ForecastKind) -> Vec<(NaiveDateTime, f64)> {
    rows.iter()
        .filter_map(|row| row.value_for(kind).map(|v| (row.timestamp_local, v)))
        .collect()
}

/// Train one variable's model from the transformed rows.
pub fn train_model(
    rows: &[ObservationRow],
    kind: ForecastKind,
    horizon: usize,
    interval_level: f64,
    stats: &TrainingStats,
) -> Result<TrainedModel, ModelError> {
    let series = training_series(rows, kind);
    let model = TrainedModel::fit(kind, &series, horizon, interval_level)?;
    stats.record_fit();
    Ok(model)
}

/// Train all five variable models.
pub fn train_models(
    rows: &[ObservationRow],
    horizon: usize,
    interval_level: f64,
    stats: &TrainingStats,
) -> Result<BTreeMap<ForecastKind, TrainedModel>, ModelError> {
    let mut models = BTreeMap::new();
    for kind in ForecastKind::ALL {
        models.insert(kind, train_model(rows, kind, horizon, interval_level, stats)?);
    }
    Ok(models)
}

/// Assemble the result document for one target timestamp from the five
/// models. Fails when the target is outside any model's horizon.
///
/// `model_info.trained_until` reports the latest training origin across the
/// five models; origins can differ when flux rows are sparser than the
/// instantaneous ones.
pub fn assemble_forecast(
    models: &BTreeMap<ForecastKind, TrainedModel>,
    location: Location,
    target: NaiveDateTime,
) -> Result<ForecastResult, ModelError> {
    let mut parts = BTreeMap::new();
    let mut trained_until: Option<NaiveDateTime> = None;
    for kind in ForecastKind::ALL {
        let model = models
            .get(&kind)
            .ok_or(ModelError::TargetOutsideHorizon(target))?;
        let point = model.at(target)?;
        trained_until = Some(match trained_until {
            None => model.trained_until,
            Some(latest) => latest.max(model.trained_until),
        });
        parts.insert(
            kind,
            VariableForecast {
                predicted: point.predicted,
                interval_90: [point.lower, point.upper],
                unit: kind.unit().to_string(),
                series: model.day_series(target.date()),
            },
        );
    }

    // Every kind was inserted by the loop above.
    let mut take = |kind: ForecastKind| -> Result<VariableForecast, ModelError> {
        parts
            .remove(&kind)
            .ok_or(ModelError::TargetOutsideHorizon(target))
    };
    Ok(ForecastResult {
        location: ForecastLocation {
            latitude: location.lat,
            longitude: location.lon,
        },
        timestamp: target,
        forecast: ForecastVariables {
            temperature: take(ForecastKind::Temperature)?,
            humidity: take(ForecastKind::Humidity)?,
            wind_speed: take(ForecastKind::WindSpeed)?,
            rain: take(ForecastKind::Rain)?,
            water_vapor: take(ForecastKind::WaterVapor)?,
        },
        model_info: ModelInfo {
            model: "mstl-ets".to_string(),
            trained_until: trained_until.unwrap_or(target),
            data_source: "MERRA-2".to_string(),
        },
    })
}
