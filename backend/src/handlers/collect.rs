//! Collection endpoint handler
//!
//! `POST /api/collect` drives the whole pipeline for one location: fetch the
//! historical window upstream, transform it, train or reuse cached models and
//! answer with the forecast for the requested timestamp. Validation is
//! deliberately shallow: presence and parseability of the three parameters,
//! nothing else; a syntactically valid but nonsensical coordinate surfaces as
//! a downstream failure.

use axum::{extract::State, Json};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use shared::models::forecast::ForecastResult;
use shared::types::Location;

use crate::error::{AppError, AppResult};
use crate::services::collect::CollectService;
use crate::services::forecast::{ForecastService, PgForecastStore};
use crate::services::timezone;
use crate::AppState;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parameters echoed back to the client.
#[derive(Debug, Serialize)]
pub struct ParametersReceived {
    pub lat: f64,
    pub lon: f64,
    pub datetime: String,
}

/// Success response for the collection endpoint.
#[derive(Debug, Serialize)]
pub struct CollectResponse {
    pub message: String,
    pub parameters_received: ParametersReceived,
    pub data: ForecastResult,
}

fn require_coordinate(body: &Value, field: &'static str) -> AppResult<f64> {
    let value = body.get(field).ok_or(AppError::MissingField(field))?;
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| AppError::InvalidParameter {
            field,
            message: format!("{n} is not a finite number"),
        }),
        Value::String(s) => s.parse::<f64>().map_err(|_| AppError::InvalidParameter {
            field,
            message: format!("cannot parse '{s}' as a number"),
        }),
        other => Err(AppError::InvalidParameter {
            field,
            message: format!("expected a number, got {other}"),
        }),
    }
}

fn require_datetime(body: &Value) -> AppResult<(NaiveDateTime, String)> {
    let raw = body
        .get("datetime")
        .ok_or(AppError::MissingField("datetime"))?
        .as_str()
        .ok_or(AppError::InvalidParameter {
            field: "datetime",
            message: "expected a string".to_string(),
        })?;

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok((parsed, raw.to_string()));
        }
    }
    Err(AppError::InvalidParameter {
        field: "datetime",
        message: format!("cannot parse '{raw}' as a timestamp"),
    })
}

/// Collect history and serve a forecast for one location and timestamp.
pub async fn collect(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<CollectResponse>> {
    let lat = require_coordinate(&body, "lat")?;
    let lon = require_coordinate(&body, "lon")?;
    let (target, datetime_raw) = require_datetime(&body)?;
    let location = Location::new(lat, lon);

    tracing::info!(%location, target = %target, "collect request");

    let forecast_config = &state.config.forecast;
    let window_start = parse_window(&forecast_config.train_window_start, "train_window_start")?;
    let window_end = parse_window(&forecast_config.train_window_end, "train_window_end")?;

    let forecast_service = ForecastService::new(
        PgForecastStore::new(state.db.clone()),
        forecast_config.horizon_steps,
        forecast_config.interval_level,
    );

    // The window is always fetched, even for cached locations: loaded models
    // may need a fallback retrain and that trains on the fresh rows.
    let collector = CollectService::new(
        state.giovanni.clone(),
        forecast_config.fetch_concurrency,
    );
    let (group_a, group_b) = collector
        .collect_location(location, window_start, window_end)
        .await;
    if group_a.is_empty() {
        return Err(AppError::NoData(location));
    }

    let offset = timezone::utc_offset(location)?;
    let rows = shared::transform::transform(
        &group_a,
        &group_b,
        chrono::Duration::minutes(forecast_config.flux_offset_minutes),
        offset,
    )?;

    let data = forecast_service.forecast(location, &rows, target).await?;

    Ok(Json(CollectResponse {
        message: "Data processed successfully!".to_string(),
        parameters_received: ParametersReceived {
            lat,
            lon,
            datetime: datetime_raw,
        },
        data,
    }))
}

fn parse_window(raw: &str, key: &'static str) -> AppResult<chrono::DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|t| t.and_utc())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("config {key} '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::json;

    #[tokio::test]
    async fn missing_lat_is_a_400_naming_the_field() {
        let body = json!({ "lon": -46.88, "datetime": "2024-01-03T15:00:00" });
        let err = require_coordinate(&body, "lat").unwrap_err();
        assert!(matches!(err, AppError::MissingField("lat")));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            payload["error"].as_str(),
            Some("Missing required parameter: lat")
        );
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let body = json!({ "lat": -16.34, "lon": "-46.88" });
        assert_eq!(require_coordinate(&body, "lat").unwrap(), -16.34);
        assert_eq!(require_coordinate(&body, "lon").unwrap(), -46.88);

        let bad = json!({ "lat": "somewhere" });
        assert!(matches!(
            require_coordinate(&bad, "lat").unwrap_err(),
            AppError::InvalidParameter { field: "lat", .. }
        ));
    }

    #[test]
    fn datetime_accepts_the_provider_shapes() {
        for raw in [
            "2024-01-03T15:00:00",
            "2024-01-03 15:00:00",
            "2024-01-03T15:00",
            "2024-01-03 15:00",
        ] {
            let body = json!({ "datetime": raw });
            let (parsed, echoed) = require_datetime(&body).unwrap();
            assert_eq!(echoed, raw);
            assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-01-03 15:00");
        }

        let bad = json!({ "datetime": "January 3rd" });
        assert!(matches!(
            require_datetime(&bad).unwrap_err(),
            AppError::InvalidParameter { field: "datetime", .. }
        ));
        let missing = json!({});
        assert!(matches!(
            require_datetime(&missing).unwrap_err(),
            AppError::MissingField("datetime")
        ));
    }
}
