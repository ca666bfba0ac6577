//! Wire format of the upstream time-series service
//!
//! A response body is 13 metadata lines of `key,value` pairs (the value is
//! taken verbatim after the first comma, so it may itself contain commas),
//! followed by a two-column CSV with its own header row. The value column is
//! named by the metadata entry `param_short_name`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::observation::TimeSeriesPoint;

/// Number of metadata lines preceding the CSV body.
pub const METADATA_LINES: usize = 13;

/// Metadata key naming the value column.
pub const PARAM_SHORT_NAME: &str = "param_short_name";

#[derive(Debug, Error)]
pub enum WireError {
    #[error("metadata block truncated: expected {METADATA_LINES} lines, got {0}")]
    TruncatedMetadata(usize),

    #[error("metadata line has no comma: {0:?}")]
    MalformedMetadata(String),

    #[error("metadata is missing {PARAM_SHORT_NAME}")]
    MissingShortName,

    #[error("unparseable timestamp: {0:?}")]
    BadTimestamp(String),

    #[error("unparseable value: {0:?}")]
    BadValue(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// A parsed upstream response: metadata mapping plus the series itself.
#[derive(Debug, Clone)]
pub struct ParsedSeries {
    pub metadata: HashMap<String, String>,
    pub short_name: String,
    pub points: Vec<TimeSeriesPoint>,
}

/// Parse a complete response body.
pub fn parse_time_series(body: &str) -> Result<ParsedSeries, WireError> {
    let mut lines = body.lines();

    let mut metadata = HashMap::new();
    for i in 0..METADATA_LINES {
        let line = lines.next().ok_or(WireError::TruncatedMetadata(i))?;
        let (key, value) = line
            .split_once(',')
            .ok_or_else(|| WireError::MalformedMetadata(line.to_string()))?;
        metadata.insert(key.to_string(), value.trim().to_string());
    }

    let short_name = metadata
        .get(PARAM_SHORT_NAME)
        .cloned()
        .filter(|s| !s.is_empty())
        .ok_or(WireError::MissingShortName)?;

    let rest: String = lines.collect::<Vec<_>>().join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(rest.as_bytes());

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        let timestamp = record.get(0).unwrap_or_default();
        let value = record.get(1).unwrap_or_default();
        points.push(TimeSeriesPoint {
            timestamp: parse_timestamp(timestamp)?,
            value: value
                .trim()
                .parse::<f64>()
                .map_err(|_| WireError::BadValue(value.to_string()))?,
        });
    }

    Ok(ParsedSeries {
        metadata,
        short_name,
        points,
    })
}

/// Parse the timestamp column. The provider emits UTC wall-clock times in a
/// handful of near-ISO shapes depending on the dataset.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, WireError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(t.and_utc());
        }
    }
    Err(WireError::BadTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(short_name_line: &str) -> String {
        let mut lines = vec![
            "request_time,2024-05-01 10:00:00".to_string(),
            "dataset,M2I1NXLFO_5_12_4_TLML".to_string(),
            "param_name,Surface air temperature".to_string(),
            short_name_line.to_string(),
            "unit,K".to_string(),
            "location,[-16.34, -46.88]".to_string(),
        ];
        for i in lines.len()..METADATA_LINES {
            lines.push(format!("extra_{i},value_{i}"));
        }
        lines.push("Timestamp,TLML".to_string());
        lines.push("2020-01-01 00:00:00,295.12".to_string());
        lines.push("2020-01-01 01:00:00,294.88".to_string());
        lines.join("\n")
    }

    #[test]
    fn parses_metadata_and_points() {
        let parsed = parse_time_series(&body("param_short_name,TLML")).unwrap();
        assert_eq!(parsed.short_name, "TLML");
        assert_eq!(parsed.points.len(), 2);
        assert_eq!(parsed.points[0].value, 295.12);
        assert_eq!(
            parsed.points[1].timestamp,
            NaiveDateTime::parse_from_str("2020-01-01 01:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap()
                .and_utc()
        );
    }

    #[test]
    fn metadata_value_keeps_commas_after_first() {
        let raw = body("param_short_name,TLML");
        let parsed = parse_time_series(&raw).unwrap();
        assert_eq!(parsed.metadata["location"], "[-16.34, -46.88]");
    }

    #[test]
    fn missing_short_name_is_a_hard_failure() {
        let err = parse_time_series(&body("param_other,TLML")).unwrap_err();
        assert!(matches!(err, WireError::MissingShortName));
    }

    #[test]
    fn truncated_metadata_is_rejected() {
        let err = parse_time_series("a,1\nb,2\n").unwrap_err();
        assert!(matches!(err, WireError::TruncatedMetadata(2)));
    }

    #[test]
    fn bad_value_is_rejected() {
        let mut raw = body("param_short_name,TLML");
        raw.push_str("\n2020-01-01 02:00:00,not-a-number");
        let err = parse_time_series(&raw).unwrap_err();
        assert!(matches!(err, WireError::BadValue(_)));
    }
}
