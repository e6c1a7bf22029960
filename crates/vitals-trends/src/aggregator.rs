//! Trend envelope assembly.

use crate::scale::TimeScale;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;
use vitals_core::VitalParam;
use vitals_store::{StoreResult, TrendRow, VitalsStore};

/// One downsampled series: parallel label/value arrays, bucket-ascending.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TrendSeries {
    pub times: Vec<String>,
    pub values: Vec<f64>,
}

/// All five scales for all parameters.
///
/// Every scale and parameter key is always present; empty series simply
/// carry empty arrays.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendEnvelope {
    pub trends: BTreeMap<&'static str, BTreeMap<&'static str, TrendSeries>>,
}

/// Produces the trend envelope from the store on demand.
#[derive(Clone)]
pub struct TrendAggregator {
    store: VitalsStore,
}

impl TrendAggregator {
    pub fn new(store: VitalsStore) -> Self {
        Self { store }
    }

    /// One series for one (parameter, scale).
    pub async fn series(
        &self,
        param: VitalParam,
        scale: TimeScale,
        now: DateTime<Utc>,
    ) -> StoreResult<TrendSeries> {
        let rows = self
            .store
            .query_bucket_means(param, scale.window(), scale.bucket_secs(), now)
            .await?;
        Ok(series_from_rows(scale, &rows))
    }

    /// The full envelope: every scale, every parameter, queried
    /// concurrently. Any failed query fails the envelope so the API can
    /// surface the storage error instead of serving gaps as data.
    pub async fn collect(&self, now: DateTime<Utc>) -> StoreResult<TrendEnvelope> {
        let tasks = TimeScale::ALL.iter().flat_map(|&scale| {
            VitalParam::ALL.iter().map(move |&param| {
                let aggregator = self.clone();
                async move {
                    let series = aggregator.series(param, scale, now).await.map_err(|e| {
                        warn!(?e, scale = %scale, param = %param, "Trend query failed");
                        e
                    })?;
                    Ok((scale, param, series))
                }
            })
        });

        let results: Vec<(TimeScale, VitalParam, TrendSeries)> =
            join_all(tasks).await.into_iter().collect::<StoreResult<_>>()?;
        Ok(build_envelope(results))
    }
}

fn series_from_rows(scale: TimeScale, rows: &[TrendRow]) -> TrendSeries {
    let mut series = TrendSeries {
        times: Vec::with_capacity(rows.len()),
        values: Vec::with_capacity(rows.len()),
    };
    for row in rows {
        series.times.push(scale.format_bucket(row.bucket_time));
        series.values.push(row.mean_value);
    }
    series
}

fn build_envelope(results: Vec<(TimeScale, VitalParam, TrendSeries)>) -> TrendEnvelope {
    let mut trends: BTreeMap<&'static str, BTreeMap<&'static str, TrendSeries>> = TimeScale::ALL
        .iter()
        .map(|scale| (scale.key(), BTreeMap::new()))
        .collect();

    for (scale, param, series) in results {
        trends
            .entry(scale.key())
            .or_default()
            .insert(param.as_str(), series);
    }

    TrendEnvelope { trends }
}
