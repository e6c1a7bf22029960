//! Route table and handlers.

use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};
use crate::llm::TrendAnalysisRequest;
use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;
use vitals_core::{DetectorSelection, DEFAULT_USER_ID};

/// Default alert history page size.
const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Build the API router.
pub fn create_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/detector/current", get(get_detector))
        .route("/api/detector/set", post(set_detector))
        .route("/api/user/baselines", get(get_baselines))
        .route("/api/user/reset_baselines", post(reset_baselines))
        .route("/api/trends", get(get_trends))
        .route("/api/alerts/history", get(get_alert_history))
        .route("/api/trends/llm_analysis", post(llm_analysis))
        .route("/metrics", get(get_metrics))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn get_detector(State(ctx): State<ApiContext>) -> Json<DetectorSelection> {
    Json(ctx.engine.current())
}

/// Loosely-typed switch body so invalid detector names map to 400, not a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
struct SetDetectorBody {
    detector_type: String,
    #[serde(default)]
    user_id: Option<String>,
}

fn parse_selection(body: &SetDetectorBody) -> ApiResult<DetectorSelection> {
    let detector_type = body
        .detector_type
        .parse()
        .map_err(|_| {
            ApiError::Config(format!(
                "detector_type must be range_based or user_baseline, got '{}'",
                body.detector_type
            ))
        })?;
    let user_id = body
        .user_id
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    if user_id.trim().is_empty() {
        return Err(ApiError::Config("user_id must not be empty".to_string()));
    }
    Ok(DetectorSelection {
        detector_type,
        user_id,
    })
}

async fn set_detector(
    State(ctx): State<ApiContext>,
    Json(body): Json<SetDetectorBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let selection = parse_selection(&body)?;
    let installed = ctx
        .engine
        .switch(selection)
        .map_err(|e| ApiError::Config(e.to_string()))?;

    // Echo the new selection on the config topic (best-effort).
    ctx.broker.publish_config(&installed).await;

    info!(
        detector_type = %installed.detector_type,
        user_id = %installed.user_id,
        "Detector switched via API"
    );
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(default)]
    user_id: Option<String>,
}

async fn get_baselines(
    State(ctx): State<ApiContext>,
    Query(query): Query<UserQuery>,
) -> Json<vitals_baseline::UserBaselines> {
    let user_id = query
        .user_id
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());
    Json(ctx.registry.snapshot(&user_id))
}

#[derive(Debug, Deserialize)]
struct ResetBody {
    user_id: String,
}

async fn reset_baselines(
    State(ctx): State<ApiContext>,
    Json(body): Json<ResetBody>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.user_id.trim().is_empty() {
        return Err(ApiError::Config("user_id must not be empty".to_string()));
    }
    let removed = ctx.registry.reset(&body.user_id);
    Ok(Json(json!({ "ok": true, "removed_cells": removed })))
}

async fn get_trends(
    State(ctx): State<ApiContext>,
) -> ApiResult<Json<vitals_trends::TrendEnvelope>> {
    let envelope = ctx.trends.collect(Utc::now()).await?;
    Ok(Json(envelope))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    user_id: Option<String>,
}

async fn get_alert_history(
    State(ctx): State<ApiContext>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<vitals_core::Alert>>> {
    let alerts = ctx
        .store
        .query_alert_history(
            query.user_id.as_deref(),
            query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        )
        .await?;
    Ok(Json(alerts))
}

async fn llm_analysis(
    State(ctx): State<ApiContext>,
    Json(body): Json<TrendAnalysisRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    if body.values.is_empty() {
        return Err(ApiError::Config(
            "values must contain at least one point".to_string(),
        ));
    }
    if body.timestamps.len() != body.values.len() {
        return Err(ApiError::Config(
            "timestamps and values must have the same length".to_string(),
        ));
    }

    let markdown = ctx.llm.analyze_trend(&body).await?;
    Ok(Json(json!({ "markdown": markdown })))
}

async fn get_metrics() -> ([(axum::http::HeaderName, &'static str); 1], String) {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        vitals_telemetry::metrics::gather(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::DetectorKind;

    #[test]
    fn test_parse_selection_valid() {
        let selection = parse_selection(&SetDetectorBody {
            detector_type: "user_baseline".to_string(),
            user_id: Some("u1".to_string()),
        })
        .unwrap();
        assert_eq!(selection.detector_type, DetectorKind::UserBaseline);
        assert_eq!(selection.user_id, "u1");
    }

    #[test]
    fn test_parse_selection_defaults_user() {
        let selection = parse_selection(&SetDetectorBody {
            detector_type: "range_based".to_string(),
            user_id: None,
        })
        .unwrap();
        assert_eq!(selection.user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn test_parse_selection_rejects_unknown_detector() {
        let err = parse_selection(&SetDetectorBody {
            detector_type: "zscore".to_string(),
            user_id: Some("u1".to_string()),
        })
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_selection_rejects_blank_user() {
        let err = parse_selection(&SetDetectorBody {
            detector_type: "range_based".to_string(),
            user_id: Some("   ".to_string()),
        })
        .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
