//! Timestamp-keyed series tables
//!
//! A `WideTable` accumulates one column per successfully fetched variable for
//! a single location. Columns are merged by inner join on the timestamp key,
//! so the table's row set is always the intersection of the timestamp sets of
//! every variable joined so far. Join order does not affect the final row
//! set, which is what makes completion-order merging safe.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::observation::TimeSeriesPoint;
use crate::types::Location;

/// A single variable's fetched series, tagged with its column name.
#[derive(Debug, Clone)]
pub struct VariableSeries {
    pub name: String,
    pub points: Vec<TimeSeriesPoint>,
}

/// A wide observation table for one location.
#[derive(Debug, Clone)]
pub struct WideTable {
    location: Location,
    columns: Vec<String>,
    rows: BTreeMap<DateTime<Utc>, Vec<f64>>,
}

impl WideTable {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            columns: Vec::new(),
            rows: BTreeMap::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.rows.len()
        }
    }

    /// Inner-join one variable's series onto the table.
    ///
    /// The first join seeds the table; every later join keeps only timestamps
    /// present both in the table and in the incoming series. Duplicate
    /// timestamps within `series` keep the last value seen.
    pub fn inner_join(&mut self, series: VariableSeries) {
        let incoming: BTreeMap<DateTime<Utc>, f64> = series
            .points
            .into_iter()
            .map(|p| (p.timestamp, p.value))
            .collect();

        if self.columns.is_empty() {
            self.columns.push(series.name);
            self.rows = incoming.into_iter().map(|(t, v)| (t, vec![v])).collect();
            return;
        }

        self.columns.push(series.name);
        let mut joined = BTreeMap::new();
        for (timestamp, mut values) in std::mem::take(&mut self.rows) {
            if let Some(v) = incoming.get(&timestamp) {
                values.push(*v);
                joined.insert(timestamp, values);
            }
        }
        self.rows = joined;
    }

    /// Iterate rows in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, &[f64])> {
        self.rows.iter().map(|(t, v)| (*t, v.as_slice()))
    }

    /// Look up a row's value for a named column.
    pub fn value(&self, timestamp: DateTime<Utc>, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(&timestamp).map(|values| values[idx])
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.rows.keys().copied()
    }
}
