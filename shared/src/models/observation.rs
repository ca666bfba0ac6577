//! Observation data models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::variable::ForecastKind;

/// One sample of one upstream variable.
///
/// Timestamp uniqueness within a variable's series is assumed, not verified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// One fully joined and unit-converted observation for a location.
///
/// `timestamp_local` is `timestamp_utc` plus a fixed UTC offset computed once
/// per collection from the location's current timezone rule. It is not
/// adjusted for daylight-saving transitions across the multi-year window;
/// that approximation is part of the contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationRow {
    pub timestamp_utc: DateTime<Utc>,
    pub timestamp_local: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    /// Surface air temperature, °C.
    pub tlml: f64,
    /// Specific humidity, kg/kg.
    pub qlml: f64,
    /// Surface wind speed, km/h.
    pub speedlml: f64,
    /// Bias-corrected precipitation, mm. Null when the flux row had no match.
    pub prectotcorr: Option<f64>,
    /// Total precipitable water vapor, kg/m². Null when the flux row had no
    /// match.
    pub tqv: Option<f64>,
}

impl ObservationRow {
    /// Value of the converted column backing a forecast kind, if present on
    /// this row.
    pub fn value_for(&self, kind: ForecastKind) -> Option<f64> {
        match kind {
            ForecastKind::Temperature => Some(self.tlml),
            ForecastKind::Humidity => Some(self.qlml),
            ForecastKind::WindSpeed => Some(self.speedlml),
            ForecastKind::Rain => self.prectotcorr,
            ForecastKind::WaterVapor => self.tqv,
        }
    }
}
