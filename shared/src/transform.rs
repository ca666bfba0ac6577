//! Observation transform pipeline
//!
//! Aligns the instantaneous (group A) and accumulated/flux (group B) tables
//! for one location, applies unit conversions and localizes timestamps.
//! Steps, in order: shift group B's timestamps backward by the flux offset;
//! left-join group A with shifted group B on timestamp; convert TLML from
//! Kelvin to Celsius and SPEEDLML from m/s to km/h; add one fixed UTC offset
//! to every row's timestamp.
//!
//! The UTC offset is sampled once per collection from the location's current
//! timezone rule and applied uniformly; rows spanning a daylight-saving
//! transition keep the sampled offset.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::observation::ObservationRow;
use crate::series::WideTable;

pub const KELVIN_OFFSET: f64 = 273.15;
pub const MPS_TO_KMH: f64 = 3.6;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * MPS_TO_KMH
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("instantaneous table is missing column {0}")]
    MissingColumn(&'static str),
}

/// Join, convert and localize one location's tables.
///
/// Group B rows are matched after shifting their timestamps backward by
/// `flux_shift`, so a flux row originally at `T` joins the instantaneous row
/// at `T - flux_shift`. Rows of group A without a flux match keep `None` in
/// the flux columns. Group B's lat/lon tags are discarded in favor of group
/// A's.
pub fn transform(
    group_a: &WideTable,
    group_b: &WideTable,
    flux_shift: Duration,
    utc_offset: Duration,
) -> Result<Vec<ObservationRow>, TransformError> {
    for column in ["TLML", "QLML", "SPEEDLML"] {
        if !group_a.columns().iter().any(|c| c == column) {
            return Err(TransformError::MissingColumn(column));
        }
    }

    let shifted: BTreeMap<DateTime<Utc>, (Option<f64>, Option<f64>)> = group_b
        .timestamps()
        .map(|t| {
            (
                t - flux_shift,
                (
                    group_b.value(t, "PRECTOTCORR"),
                    group_b.value(t, "TQV"),
                ),
            )
        })
        .collect();

    let location = group_a.location();
    let mut rows = Vec::with_capacity(group_a.len());
    for (timestamp, _) in group_a.iter() {
        let (prectotcorr, tqv) = shifted
            .get(&timestamp)
            .copied()
            .unwrap_or((None, None));

        // Column presence was checked above.
        let tlml = group_a.value(timestamp, "TLML").unwrap_or(f64::NAN);
        let qlml = group_a.value(timestamp, "QLML").unwrap_or(f64::NAN);
        let speedlml = group_a.value(timestamp, "SPEEDLML").unwrap_or(f64::NAN);

        rows.push(ObservationRow {
            timestamp_utc: timestamp,
            timestamp_local: (timestamp + utc_offset).naive_utc(),
            lat: location.lat,
            lon: location.lon,
            tlml: kelvin_to_celsius(tlml),
            qlml,
            speedlml: mps_to_kmh(speedlml),
            prectotcorr,
            tqv,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::TimeSeriesPoint;
    use crate::series::VariableSeries;
    use crate::types::Location;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn group_a(hours: &[u32]) -> WideTable {
        let mut table = WideTable::new(Location::new(-16.34, -46.88));
        for (name, base) in [("QLML", 0.01), ("TLML", 300.0), ("SPEEDLML", 10.0)] {
            table.inner_join(VariableSeries {
                name: name.to_string(),
                points: hours
                    .iter()
                    .map(|h| TimeSeriesPoint {
                        timestamp: ts(*h, 0),
                        value: base,
                    })
                    .collect(),
            });
        }
        table
    }

    fn group_b(half_hours: &[u32]) -> WideTable {
        let mut table = WideTable::new(Location::new(-16.34, -46.88));
        for (name, base) in [("PRECTOTCORR", 0.5), ("TQV", 25.0)] {
            table.inner_join(VariableSeries {
                name: name.to_string(),
                points: half_hours
                    .iter()
                    .map(|h| TimeSeriesPoint {
                        timestamp: ts(*h, 30),
                        value: base,
                    })
                    .collect(),
            });
        }
        table
    }

    #[test]
    fn unit_conversions_are_exact() {
        assert_eq!(kelvin_to_celsius(300.0), 26.849999999999994);
        assert!((kelvin_to_celsius(300.0) - 26.85).abs() < 1e-9);
        assert_eq!(mps_to_kmh(10.0), 36.0);
    }

    #[test]
    fn flux_rows_shift_back_thirty_minutes_before_join() {
        // Flux row at 00:30 must join the instantaneous row at 00:00.
        let rows = transform(
            &group_a(&[0]),
            &group_b(&[0]),
            Duration::minutes(30),
            Duration::zero(),
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].prectotcorr, Some(0.5));
        assert_eq!(rows[0].tqv, Some(25.0));
    }

    #[test]
    fn left_join_keeps_unmatched_instantaneous_rows() {
        let rows = transform(
            &group_a(&[0, 1]),
            &group_b(&[0]),
            Duration::minutes(30),
            Duration::zero(),
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prectotcorr, Some(0.5));
        assert_eq!(rows[1].prectotcorr, None);
        assert_eq!(rows[1].tqv, None);
    }

    #[test]
    fn conversions_applied_once() {
        let rows = transform(
            &group_a(&[0]),
            &group_b(&[0]),
            Duration::minutes(30),
            Duration::zero(),
        )
        .unwrap();
        assert!((rows[0].tlml - 26.85).abs() < 1e-9);
        assert!((rows[0].speedlml - 36.0).abs() < 1e-9);
        assert!((rows[0].qlml - 0.01).abs() < 1e-12);
    }

    #[test]
    fn local_timestamp_is_utc_plus_fixed_offset() {
        let offset = Duration::hours(-3);
        let rows = transform(
            &group_a(&[12]),
            &group_b(&[12]),
            Duration::minutes(30),
            offset,
        )
        .unwrap();
        assert_eq!(rows[0].timestamp_local, (ts(12, 0) + offset).naive_utc());
    }

    #[test]
    fn missing_instantaneous_column_is_an_error() {
        let mut partial = WideTable::new(Location::new(0.0, 0.0));
        partial.inner_join(VariableSeries {
            name: "TLML".to_string(),
            points: vec![TimeSeriesPoint {
                timestamp: ts(0, 0),
                value: 300.0,
            }],
        });
        let err = transform(
            &partial,
            &group_b(&[0]),
            Duration::minutes(30),
            Duration::zero(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn("QLML")));
    }
}
