//! Forecast result models
//!
//! The JSON shape served to clients and persisted in the forecast table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Coordinates echoed back in a forecast result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForecastLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// The full-day series accompanying a point forecast.
///
/// `timestamp` and `values` always have equal length and cover the calendar
/// date of the requested target, clipped to the forecast horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySeries {
    pub timestamp: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

/// Point estimate, 90% interval and same-day series for one variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableForecast {
    pub predicted: f64,
    pub interval_90: [f64; 2],
    pub unit: String,
    pub series: DaySeries,
}

/// Per-variable forecasts keyed by forecast kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastVariables {
    pub temperature: VariableForecast,
    pub humidity: VariableForecast,
    pub wind_speed: VariableForecast,
    pub rain: VariableForecast,
    pub water_vapor: VariableForecast,
}

/// Provenance attached to every result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub model: String,
    pub trained_until: NaiveDateTime,
    pub data_source: String,
}

/// A complete forecast for one (location, target timestamp) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResult {
    pub location: ForecastLocation,
    pub timestamp: NaiveDateTime,
    pub forecast: ForecastVariables,
    pub model_info: ModelInfo,
}
