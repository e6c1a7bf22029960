//! Connection pool wrapper and queries.
//!
//! Schema bootstrap prefers a TimescaleDB hypertable on `vitals`; when the
//! extension is absent it degrades to a plain time index. Duplicate rows
//! from broker redelivery are acceptable because trend aggregation
//! averages per bucket.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info, warn};
use vitals_core::{Alert, EnrichedSample, VitalParam};

/// Upper bound on alert history page size.
pub const MAX_ALERT_HISTORY: i64 = 1000;

/// One per-bucket mean row from a trend query.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub bucket_time: DateTime<Utc>,
    pub mean_value: f64,
}

/// Database pool wrapper.
#[derive(Clone)]
pub struct VitalsStore {
    pool: PgPool,
}

impl VitalsStore {
    /// Open the connection pool and ensure the schema exists.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password)
            .options([(
                "statement_timeout",
                config.statement_timeout_ms.to_string().as_str(),
            )]);

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        info!(
            host = %config.host,
            db = %config.name,
            pool_size = config.pool_size,
            "Connected to database"
        );

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the tables, the hypertable (or its index fallback), and the
    /// alert history index. Safe to repeat.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vitals (
                time timestamptz NOT NULL,
                user_id text NOT NULL,
                activity double precision,
                heart_rate double precision,
                blood_pressure_systolic double precision,
                blood_pressure_diastolic double precision,
                temperature double precision,
                oxygen_saturation double precision
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Hypertable when TimescaleDB is installed, plain time index otherwise.
        match sqlx::query("SELECT create_hypertable('vitals', 'time', if_not_exists => TRUE)")
            .execute(&self.pool)
            .await
        {
            Ok(_) => info!("vitals hypertable ready"),
            Err(e) => {
                warn!(?e, "TimescaleDB unavailable, falling back to plain index");
                sqlx::query("CREATE INDEX IF NOT EXISTS idx_vitals_time ON vitals (time DESC)")
                    .execute(&self.pool)
                    .await?;
            }
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id bigserial PRIMARY KEY,
                time timestamptz NOT NULL,
                user_id text NOT NULL,
                parameter text NOT NULL,
                value double precision NOT NULL,
                activity_level text NOT NULL,
                normal_low double precision NOT NULL,
                normal_high double precision NOT NULL,
                deviation_percent double precision NOT NULL,
                severity text NOT NULL,
                detector_type text NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_alerts_user_time ON alerts (user_id, time DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert one enriched sample. Absent vitals are stored as NULL.
    pub async fn insert_vitals(&self, sample: &EnrichedSample) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vitals (
                time, user_id, activity, heart_rate, blood_pressure_systolic,
                blood_pressure_diastolic, temperature, oxygen_saturation
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(sample.sample.timestamp)
        .bind(&sample.sample.user_id)
        .bind(sample.sample.activity)
        .bind(sample.sample.heart_rate)
        .bind(sample.sample.blood_pressure_systolic)
        .bind(sample.sample.blood_pressure_diastolic)
        .bind(sample.sample.temperature)
        .bind(sample.sample.oxygen_saturation)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert one alert. The store assigns its own row id.
    pub async fn insert_alert(&self, alert: &Alert) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO alerts (
                time, user_id, parameter, value, activity_level,
                normal_low, normal_high, deviation_percent, severity, detector_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(alert.timestamp)
        .bind(&alert.user_id)
        .bind(alert.parameter.as_str())
        .bind(alert.value)
        .bind(alert.activity_level.as_str())
        .bind(alert.normal_range[0])
        .bind(alert.normal_range[1])
        .bind(alert.deviation_percent)
        .bind(alert.severity.as_str())
        .bind(alert.detector_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Alert history, newest first, optionally scoped to one user.
    pub async fn query_alert_history(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<Alert>> {
        let limit = clamp_limit(limit);

        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"
                    SELECT id, time, user_id, parameter, value, activity_level,
                           normal_low, normal_high, deviation_percent, severity, detector_type
                    FROM alerts
                    WHERE user_id = $1
                    ORDER BY time DESC
                    LIMIT $2
                    "#,
                )
                .bind(user_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, time, user_id, parameter, value, activity_level,
                           normal_low, normal_high, deviation_percent, severity, detector_type
                    FROM alerts
                    ORDER BY time DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut alerts = Vec::with_capacity(rows.len());
        for row in rows {
            match decode_alert_row(&row) {
                Ok(alert) => alerts.push(alert),
                Err(e) => warn!(?e, "Skipping undecodable alert row"),
            }
        }
        Ok(alerts)
    }

    /// Per-bucket mean of one parameter over a trailing window.
    ///
    /// Buckets with no samples produce no row; the chart contract draws
    /// gaps for them.
    pub async fn query_bucket_means(
        &self,
        param: VitalParam,
        window: Duration,
        bucket_secs: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<TrendRow>> {
        let since = now - window;
        let rows = sqlx::query(&trend_sql(param))
            .bind(bucket_secs as f64)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            let bucket_time: DateTime<Utc> = row.try_get("bucket_time").map_err(decode_err)?;
            let mean_value: f64 = row.try_get("mean_value").map_err(decode_err)?;
            points.push(TrendRow {
                bucket_time,
                mean_value,
            });
        }
        debug!(param = %param, points = points.len(), "Trend query");
        Ok(points)
    }
}

fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_ALERT_HISTORY)
}

/// Epoch-floor bucketing keeps the query portable across plain Postgres
/// and TimescaleDB. The column name comes from the parameter enum, never
/// from user input.
fn trend_sql(param: VitalParam) -> String {
    format!(
        r#"
        SELECT to_timestamp(floor(extract(epoch FROM time) / $1) * $1) AS bucket_time,
               AVG({col}) AS mean_value
        FROM vitals
        WHERE time >= $2 AND {col} IS NOT NULL
        GROUP BY bucket_time
        ORDER BY bucket_time ASC
        "#,
        col = param.as_str()
    )
}

fn decode_err(e: sqlx::Error) -> StoreError {
    StoreError::Decode(e.to_string())
}

fn decode_alert_row(row: &sqlx::postgres::PgRow) -> StoreResult<Alert> {
    let parameter: String = row.try_get("parameter").map_err(decode_err)?;
    let activity_level: String = row.try_get("activity_level").map_err(decode_err)?;
    let severity: String = row.try_get("severity").map_err(decode_err)?;
    let detector_type: String = row.try_get("detector_type").map_err(decode_err)?;

    Ok(Alert {
        id: row.try_get::<i64, _>("id").map_err(decode_err)? as u64,
        timestamp: row.try_get("time").map_err(decode_err)?,
        user_id: row.try_get("user_id").map_err(decode_err)?,
        parameter: VitalParam::from_str(&parameter)
            .map_err(|e| StoreError::Decode(e.to_string()))?,
        value: row.try_get("value").map_err(decode_err)?,
        activity_level: activity_level
            .parse()
            .map_err(|e: vitals_core::CoreError| StoreError::Decode(e.to_string()))?,
        normal_range: [
            row.try_get("normal_low").map_err(decode_err)?,
            row.try_get("normal_high").map_err(decode_err)?,
        ],
        deviation_percent: row.try_get("deviation_percent").map_err(decode_err)?,
        severity: severity
            .parse()
            .map_err(|e: vitals_core::CoreError| StoreError::Decode(e.to_string()))?,
        detector_type: detector_type
            .parse()
            .map_err(|e: vitals_core::CoreError| StoreError::Decode(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped_to_bounds() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-5), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(10_000), MAX_ALERT_HISTORY);
    }

    #[test]
    fn test_trend_sql_targets_parameter_column() {
        let sql = trend_sql(VitalParam::HeartRate);
        assert!(sql.contains("AVG(heart_rate)"));
        assert!(sql.contains("heart_rate IS NOT NULL"));
        assert!(sql.contains("ORDER BY bucket_time ASC"));
    }
}
