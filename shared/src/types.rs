//! Common types used across the service

use serde::{Deserialize, Serialize};

/// A geographic sampling point.
///
/// Coordinates are used verbatim as storage keys, so floating-point equality
/// is the de facto identity of a location. The intended matching precision is
/// unspecified upstream; no rounding or canonicalization is applied here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.lat, self.lon)
    }
}
