//! Upstream collection fan-out
//!
//! Two nested levels of bounded concurrency: variables within a location and
//! locations within a batch, both gated by a semaphore of the configured
//! degree. Results merge in completion order; the inner join on timestamps
//! makes the final row set independent of that order. A failed fetch is
//! logged and dropped: it shrinks coverage but never aborts the batch, and
//! in-flight siblings are not cancelled.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use shared::models::variable::{UpstreamVariable, GROUP_A, GROUP_B};
use shared::series::{VariableSeries, WideTable};
use shared::types::Location;

use crate::external::giovanni::GiovanniClient;

/// Collects and joins upstream series for locations.
#[derive(Clone)]
pub struct CollectService {
    client: GiovanniClient,
    concurrency: usize,
}

impl CollectService {
    pub fn new(client: GiovanniClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch one variable group for one location and inner-join the series
    /// into a wide table. Output timestamps are the intersection of every
    /// successfully fetched variable's timestamps.
    pub async fn collect_group(
        &self,
        location: Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        group: &[UpstreamVariable],
    ) -> WideTable {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for variable in group {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let dataset_id = variable.dataset_id;
            tasks.spawn(async move {
                // The semaphore lives as long as the JoinSet and is never
                // closed, so acquisition cannot fail.
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed");
                let fetched = client.fetch_series(location, start, end, dataset_id).await;
                (dataset_id, fetched)
            });
        }

        let mut table = WideTable::new(location);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok((short_name, points)))) => {
                    table.inner_join(VariableSeries {
                        name: short_name,
                        points,
                    });
                }
                Ok((dataset_id, Err(error))) => {
                    tracing::warn!(%location, dataset_id, %error, "variable fetch failed, dropping");
                }
                Err(join_error) => {
                    tracing::warn!(%location, %join_error, "fetch task panicked, dropping");
                }
            }
        }
        table
    }

    /// Fetch both variable groups for one location.
    pub async fn collect_location(
        &self,
        location: Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (WideTable, WideTable) {
        let group_a = self.collect_group(location, start, end, &GROUP_A).await;
        let group_b = self.collect_group(location, start, end, &GROUP_B).await;
        (group_a, group_b)
    }

    /// Fetch both groups for many locations concurrently, keeping only
    /// non-empty per-location tables. Table order follows task completion.
    pub async fn collect_batch(
        &self,
        locations: &[Location],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (Vec<WideTable>, Vec<WideTable>) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for &location in locations {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed");
                service.collect_location(location, start, end).await
            });
        }

        let mut group_a_tables = Vec::new();
        let mut group_b_tables = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((group_a, group_b)) => {
                    if !group_a.is_empty() {
                        group_a_tables.push(group_a);
                    }
                    if !group_b.is_empty() {
                        group_b_tables.push(group_b);
                    }
                }
                Err(join_error) => {
                    tracing::warn!(%join_error, "location task panicked, dropping");
                }
            }
        }
        (group_a_tables, group_b_tables)
    }
}
