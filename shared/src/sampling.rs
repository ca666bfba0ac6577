//! Land-mask grid sampling
//!
//! Enumerates the provider's native lat/lon grid, restricts it to the
//! Americas (longitudes west of a fixed meridian) and away from the Antarctic
//! (latitudes above a polar cutoff), and keeps the points a land/ocean
//! classifier marks as land. The classifier is injected so the grid logic
//! stays a pure function of the four constants.

use crate::types::Location;

/// Grid steps and cutoffs. Defaults match the provider's sampling grid.
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    pub lat_step: f64,
    pub lon_step: f64,
    /// Keep latitudes at or above this (excludes the Antarctic).
    pub min_lat: f64,
    /// Keep longitudes strictly west of this meridian.
    pub max_lon: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            lat_step: 0.5,
            lon_step: 0.625,
            min_lat: -60.0,
            max_lon: -20.0,
        }
    }
}

impl GridSpec {
    /// All grid points surviving the latitude and longitude cutoffs, in
    /// (lat, lon) scan order.
    pub fn candidate_points(&self) -> Vec<Location> {
        let mut points = Vec::new();
        let mut lat = -90.0;
        while lat <= 90.0 + 1e-9 {
            if lat >= self.min_lat {
                let mut lon = -180.0;
                while lon <= 180.0 + 1e-9 {
                    if lon < self.max_lon {
                        points.push(Location::new(lat, lon));
                    }
                    lon += self.lon_step;
                }
            }
            lat += self.lat_step;
        }
        points
    }
}

/// Candidate points classified as land by `is_land(lon, lat)`.
pub fn land_points<F>(spec: &GridSpec, mut is_land: F) -> Vec<Location>
where
    F: FnMut(f64, f64) -> bool,
{
    spec.candidate_points()
        .into_iter()
        .filter(|p| is_land(p.lon, p.lat))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoffs_exclude_antarctic_and_eastern_hemisphere() {
        let points = GridSpec::default().candidate_points();
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.lat >= -60.0));
        assert!(points.iter().all(|p| p.lon < -20.0));
    }

    #[test]
    fn grid_uses_configured_steps() {
        let spec = GridSpec::default();
        let points = spec.candidate_points();
        let first = points[0];
        assert_eq!(first.lat, -60.0);
        assert_eq!(first.lon, -180.0);
        let next_lon = points[1];
        assert!((next_lon.lon - (-180.0 + spec.lon_step)).abs() < 1e-9);
    }

    #[test]
    fn sampler_is_deterministic_and_filters_by_classifier() {
        let spec = GridSpec::default();
        // Call everything west of 100°W "land".
        let land = land_points(&spec, |lon, _lat| lon < -100.0);
        let again = land_points(&spec, |lon, _lat| lon < -100.0);
        assert_eq!(land, again);
        assert!(land.iter().all(|p| p.lon < -100.0));

        let none = land_points(&spec, |_, _| false);
        assert!(none.is_empty());
    }

    #[test]
    fn classifier_receives_lon_then_lat() {
        let spec = GridSpec {
            lat_step: 30.0,
            lon_step: 30.0,
            ..GridSpec::default()
        };
        let mut seen = Vec::new();
        let _ = land_points(&spec, |lon, lat| {
            seen.push((lon, lat));
            true
        });
        assert!(seen.iter().all(|(lon, lat)| *lon < -20.0 && *lat >= -60.0));
    }
}
