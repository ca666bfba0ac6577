//! Client for the Giovanni time-series API
//!
//! One authenticated GET per (location, window, variable). Any non-success
//! status is a hard failure propagated to the caller; retries are the
//! caller's decision (currently: none, the fan-out drops the variable).

use chrono::{DateTime, Utc};
use reqwest::Client;

use shared::models::observation::TimeSeriesPoint;
use shared::types::Location;
use shared::wire;

use crate::error::{AppError, AppResult};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Time-series API client
#[derive(Clone)]
pub struct GiovanniClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GiovanniClient {
    /// Create a new client against the configured base URL.
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token,
        }
    }

    /// Fetch one variable's series for a location and time window.
    ///
    /// Returns the points together with the short name the provider reports
    /// for the variable.
    pub async fn fetch_series(
        &self,
        location: Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        dataset_id: &str,
    ) -> AppResult<(String, Vec<TimeSeriesPoint>)> {
        let url = format!("{}/timeseries", self.base_url);
        let time = format!(
            "{}/{}",
            start.format(TIME_FORMAT),
            end.format(TIME_FORMAT)
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("data", dataset_id),
                ("location", &location.to_string()),
                ("time", &time),
            ])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("request for {dataset_id} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "{dataset_id}: {status} - {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("reading {dataset_id} body: {e}")))?;

        let parsed = wire::parse_time_series(&body)?;
        Ok((parsed.short_name, parsed.points))
    }
}
