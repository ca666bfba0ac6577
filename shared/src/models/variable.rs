//! Catalog of upstream dataset variables and forecast kinds
//!
//! The time-series provider exposes each atmospheric variable under a dataset
//! identifier (the `data` query parameter) and reports values under a short
//! column name. Two disjoint groups exist: instantaneous land-forcing
//! variables sampled on the hour, and accumulated/flux variables sampled on
//! the half hour.

use serde::{Deserialize, Serialize};

/// One upstream variable: dataset identifier plus its reported short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamVariable {
    pub dataset_id: &'static str,
    pub short_name: &'static str,
}

/// Group A: instantaneous variables (specific humidity, surface temperature,
/// surface wind speed).
pub const GROUP_A: [UpstreamVariable; 3] = [
    UpstreamVariable {
        dataset_id: "M2I1NXLFO_5_12_4_QLML",
        short_name: "QLML",
    },
    UpstreamVariable {
        dataset_id: "M2I1NXLFO_5_12_4_TLML",
        short_name: "TLML",
    },
    UpstreamVariable {
        dataset_id: "M2I1NXLFO_5_12_4_SPEEDLML",
        short_name: "SPEEDLML",
    },
];

/// Group B: accumulated/flux variables (bias-corrected precipitation, total
/// precipitable water vapor). Sampled 30 minutes off the hour.
pub const GROUP_B: [UpstreamVariable; 2] = [
    UpstreamVariable {
        dataset_id: "M2T1NXFLX_5_12_4_PRECTOTCORR",
        short_name: "PRECTOTCORR",
    },
    UpstreamVariable {
        dataset_id: "M2T1NXSLV_5_12_4_TQV",
        short_name: "TQV",
    },
];

/// The five forecast targets served by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    Temperature,
    Humidity,
    WindSpeed,
    Rain,
    WaterVapor,
}

impl ForecastKind {
    pub const ALL: [ForecastKind; 5] = [
        ForecastKind::Temperature,
        ForecastKind::Humidity,
        ForecastKind::WindSpeed,
        ForecastKind::Rain,
        ForecastKind::WaterVapor,
    ];

    /// Key used in the forecast JSON and in the trained-model table.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastKind::Temperature => "temperature",
            ForecastKind::Humidity => "humidity",
            ForecastKind::WindSpeed => "wind_speed",
            ForecastKind::Rain => "rain",
            ForecastKind::WaterVapor => "water_vapor",
        }
    }

    /// Unit of the converted value served to clients.
    pub fn unit(&self) -> &'static str {
        match self {
            ForecastKind::Temperature => "°C",
            ForecastKind::Humidity => "",
            ForecastKind::WindSpeed => "km/h",
            ForecastKind::Rain => "mm",
            ForecastKind::WaterVapor => "kg/m²",
        }
    }
}

impl std::fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ForecastKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(ForecastKind::Temperature),
            "humidity" => Ok(ForecastKind::Humidity),
            "wind_speed" => Ok(ForecastKind::WindSpeed),
            "rain" => Ok(ForecastKind::Rain),
            "water_vapor" => Ok(ForecastKind::WaterVapor),
            other => Err(format!("unknown forecast kind: {other}")),
        }
    }
}
