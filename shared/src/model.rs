//! Trained forecasting model artifact
//!
//! Training fits an MSTL model (daily seasonality) with an AutoETS trend on
//! one variable's hourly series, falling back to plain non-seasonal AutoETS
//! when the series is too short for seasonal decomposition. The fitted
//! library model is not serializable, so the persisted artifact is the
//! evaluated forecast over the fixed horizon: origin timestamp plus the
//! point/lower/upper vectors. Under the fixed-horizon workflow that is
//! equivalent to reloading the fitted model, and prediction becomes an index
//! lookup.

use augurs::{
    ets::AutoETS,
    forecaster::{transforms::LinearInterpolator, Forecaster, Transformer},
    mstl::MSTLModel,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::forecast::DaySeries;
use crate::models::variable::ForecastKind;

/// Hours per seasonal cycle.
pub const DAILY_PERIOD: usize = 24;

/// Minimum observations for any fit.
pub const MIN_DATA_POINTS: usize = 24;

/// Minimum observations for seasonal decomposition (two full cycles).
pub const MIN_SEASONAL_POINTS: usize = 2 * DAILY_PERIOD;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("insufficient data for {kind}: need at least {needed} points, got {got}")]
    InsufficientData {
        kind: ForecastKind,
        needed: usize,
        got: usize,
    },

    #[error("model fit failed for {kind}: {message}")]
    Fit { kind: ForecastKind, message: String },

    #[error("target timestamp {0} is not in the forecast horizon")]
    TargetOutsideHorizon(NaiveDateTime),

    #[error("artifact encode failed: {0}")]
    Encode(String),

    #[error("artifact decode failed: {0}")]
    Decode(String),
}

/// Point estimate with its prediction interval at one horizon step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointForecast {
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// The serializable result of training one variable's model.
///
/// Predictions cover `horizon` hourly steps strictly after `trained_until`,
/// the latest local timestamp seen during training.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainedModel {
    pub kind: ForecastKind,
    pub trained_at: DateTime<Utc>,
    pub trained_until: NaiveDateTime,
    pub interval_level: f64,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl TrainedModel {
    /// Fit a model on (local timestamp, value) samples and evaluate it over
    /// `horizon` hourly steps with prediction intervals at `interval_level`.
    pub fn fit(
        kind: ForecastKind,
        series: &[(NaiveDateTime, f64)],
        horizon: usize,
        interval_level: f64,
    ) -> Result<Self, ModelError> {
        if series.len() < MIN_DATA_POINTS {
            return Err(ModelError::InsufficientData {
                kind,
                needed: MIN_DATA_POINTS,
                got: series.len(),
            });
        }

        let mut sorted: Vec<&(NaiveDateTime, f64)> = series.iter().collect();
        sorted.sort_by_key(|(timestamp, _)| *timestamp);
        let Some(&&(trained_until, _)) = sorted.last() else {
            return Err(ModelError::InsufficientData {
                kind,
                needed: MIN_DATA_POINTS,
                got: 0,
            });
        };
        let values: Vec<f64> = sorted.iter().map(|(_, value)| *value).collect();

        let forecast = if values.len() >= MIN_SEASONAL_POINTS {
            fit_seasonal(&values, horizon, interval_level)
        } else {
            fit_trend_only(&values, horizon, interval_level)
        }
        .map_err(|message| ModelError::Fit { kind, message })?;

        let point = forecast.point;
        let (lower, upper) = match forecast.intervals {
            Some(intervals) => (intervals.lower, intervals.upper),
            // The library omits intervals only for degenerate fits; fall back
            // to a symmetric band so interval ordering still holds.
            None => {
                let lower = point.iter().map(|v| v - v.abs() * 0.2).collect();
                let upper = point.iter().map(|v| v + v.abs() * 0.2).collect();
                (lower, upper)
            }
        };

        Ok(Self {
            kind,
            trained_at: Utc::now(),
            trained_until,
            interval_level,
            point,
            lower,
            upper,
        })
    }

    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Timestamp of the h-th forecast step (1-based).
    fn step_timestamp(&self, step: usize) -> NaiveDateTime {
        self.trained_until + Duration::hours(step as i64)
    }

    /// Index of `target` in the horizon, if it falls on an hourly step
    /// strictly after `trained_until`.
    fn index_of(&self, target: NaiveDateTime) -> Option<usize> {
        let offset = target - self.trained_until;
        if offset <= Duration::zero() {
            return None;
        }
        let seconds = offset.num_seconds();
        if seconds % 3600 != 0 {
            return None;
        }
        let step = (seconds / 3600) as usize;
        if step > self.horizon() {
            return None;
        }
        Some(step - 1)
    }

    /// Prediction at `target`, failing when the timestamp is outside the
    /// horizon or off the hourly grid.
    pub fn at(&self, target: NaiveDateTime) -> Result<PointForecast, ModelError> {
        let idx = self
            .index_of(target)
            .ok_or(ModelError::TargetOutsideHorizon(target))?;
        Ok(PointForecast {
            predicted: self.point[idx],
            lower: self.lower[idx],
            upper: self.upper[idx],
        })
    }

    /// Predicted series restricted to one calendar date, clipped to the
    /// horizon. Timestamps and values have equal length.
    pub fn day_series(&self, date: NaiveDate) -> DaySeries {
        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for step in 1..=self.horizon() {
            let timestamp = self.step_timestamp(step);
            if timestamp.date() == date {
                timestamps.push(timestamp);
                values.push(self.point[step - 1]);
            }
        }
        DaySeries {
            timestamp: timestamps,
            values,
        }
    }

    /// Serialize the artifact for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ModelError::Encode(e.to_string()))
    }

    /// Deserialize an artifact loaded from storage.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(model, _)| model)
            .map_err(|e| ModelError::Decode(e.to_string()))
    }
}

fn fit_seasonal(values: &[f64], horizon: usize, level: f64) -> Result<augurs::Forecast, String> {
    let trend = AutoETS::non_seasonal().into_trend_model();
    let mstl = MSTLModel::new(vec![DAILY_PERIOD], trend);
    let transformers: Vec<Box<dyn Transformer>> = vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(mstl).with_transformers(transformers);
    forecaster.fit(values).map_err(|e| e.to_string())?;
    forecaster.predict(horizon, level).map_err(|e| e.to_string())
}

fn fit_trend_only(values: &[f64], horizon: usize, level: f64) -> Result<augurs::Forecast, String> {
    let ets = AutoETS::non_seasonal();
    let transformers: Vec<Box<dyn Transformer>> = vec![Box::new(LinearInterpolator::default())];
    let mut forecaster = Forecaster::new(ets).with_transformers(transformers);
    forecaster.fit(values).map_err(|e| e.to_string())?;
    forecaster.predict(horizon, level).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_series(len: usize) -> Vec<(NaiveDateTime, f64)> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..len)
            .map(|h| {
                let t = start + Duration::hours(h as i64);
                // Daily cycle around 25 with a slow trend.
                let value = 25.0
                    + 5.0 * ((h % 24) as f64 / 24.0 * std::f64::consts::TAU).sin()
                    + h as f64 * 0.001;
                (t, value)
            })
            .collect()
    }

    #[test]
    fn fit_produces_full_horizon_with_ordered_intervals() {
        let series = hourly_series(240);
        let model = TrainedModel::fit(ForecastKind::Temperature, &series, 72, 0.9).unwrap();
        assert_eq!(model.horizon(), 72);
        for step in 1..=72 {
            let p = model.at(model.trained_until + Duration::hours(step)).unwrap();
            assert!(p.lower <= p.upper);
        }
    }

    #[test]
    fn too_short_series_is_rejected() {
        let series = hourly_series(5);
        let err = TrainedModel::fit(ForecastKind::Rain, &series, 10, 0.9).unwrap_err();
        assert!(matches!(err, ModelError::InsufficientData { got: 5, .. }));
    }

    #[test]
    fn target_outside_horizon_fails() {
        let series = hourly_series(240);
        let model = TrainedModel::fit(ForecastKind::Humidity, &series, 24, 0.9).unwrap();

        // Before the origin.
        assert!(model.at(model.trained_until).is_err());
        // Past the horizon.
        assert!(model.at(model.trained_until + Duration::hours(25)).is_err());
        // Off the hourly grid.
        assert!(model
            .at(model.trained_until + Duration::minutes(90))
            .is_err());
        // On the grid, inside the horizon.
        assert!(model.at(model.trained_until + Duration::hours(24)).is_ok());
    }

    #[test]
    fn day_series_covers_one_calendar_date() {
        let series = hourly_series(240); // ends 2024-01-10 23:00
        let model = TrainedModel::fit(ForecastKind::WindSpeed, &series, 72, 0.9).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        let day = model.day_series(date);
        assert_eq!(day.timestamp.len(), day.values.len());
        assert_eq!(day.timestamp.len(), 24);
        assert!(day.timestamp.iter().all(|t| t.date() == date));
    }

    #[test]
    fn artifact_round_trips_through_bytes() {
        let series = hourly_series(120);
        let model = TrainedModel::fit(ForecastKind::WaterVapor, &series, 48, 0.9).unwrap();
        let bytes = model.to_bytes().unwrap();
        let restored = TrainedModel::from_bytes(&bytes).unwrap();
        assert_eq!(model, restored);
    }
}
