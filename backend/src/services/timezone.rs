//! Timezone offset lookup from coordinates
//!
//! The offset is sampled from the location's current rule and applied
//! uniformly to the whole collection window; historical daylight-saving
//! transitions are not replayed.

use std::sync::OnceLock;

use chrono::{Duration, Offset, TimeZone, Utc};
use tzf_rs::DefaultFinder;

use shared::types::Location;

use crate::error::{AppError, AppResult};

static FINDER: OnceLock<DefaultFinder> = OnceLock::new();

/// Current UTC offset of the timezone containing `location`.
pub fn utc_offset(location: Location) -> AppResult<Duration> {
    let finder = FINDER.get_or_init(DefaultFinder::new);
    let name = finder.get_tz_name(location.lon, location.lat);
    if name.is_empty() {
        return Err(AppError::Timezone(location));
    }

    let tz: chrono_tz::Tz = name.parse().map_err(|_| AppError::Timezone(location))?;
    let now = Utc::now().naive_utc();
    let seconds = tz.offset_from_utc_datetime(&now).fix().local_minus_utc();
    Ok(Duration::seconds(i64::from(seconds)))
}
