use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::scheduler::{JobKind, MonitoringConfiguration, SchedulerError, SchedulerStatus};
use crate::settings::{parse_bool, parse_millis};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let status = state.scheduler.get_status();
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        scheduler_initialized: status.initialized,
        timers_live: !status.is_idle(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub scheduler_initialized: bool,
    pub timers_live: bool,
}

/// Run work that reads or writes the settings file on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("settings task failed: {}", e)))?
}

/// Live timers of every monitoring job
pub async fn get_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.get_status())
}

/// Pending settings next to what is running
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<MonitoringConfiguration>> {
    let configuration = blocking(move || Ok(state.scheduler.get_configuration())).await?;
    Ok(Json(configuration))
}

/// Save settings and apply them.
///
/// Accepts a JSON object patch (a `null` value deletes the key), persists
/// it and restarts every monitoring job so new intervals take effect.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> Result<Json<MonitoringConfiguration>> {
    let patch = match patch {
        Value::Object(map) => map,
        _ => {
            return Err(AppError::Validation(
                "settings patch must be a JSON object".to_string(),
            ))
        }
    };
    validate_patch(&patch)?;

    let configuration = blocking(move || {
        let keys: Vec<String> = patch.keys().cloned().collect();
        state.settings.merge(patch)?;
        tracing::info!(keys = ?keys, "Settings saved, restarting monitoring jobs");

        state.scheduler.restart_all();
        Ok(state.scheduler.get_configuration())
    })
    .await?;

    Ok(Json(configuration))
}

/// Reject job values the scheduler would have to replace by defaults
fn validate_patch(patch: &Map<String, Value>) -> Result<()> {
    for kind in JobKind::ALL {
        let key = kind.enable_key();
        if let Some(value) = patch.get(&key).filter(|v| !v.is_null()) {
            if parse_bool(value).is_none() {
                return Err(AppError::Validation(format!(
                    "{} must be a boolean, got {}",
                    key, value
                )));
            }
        }

        let key = kind.interval_key();
        if let Some(value) = patch.get(&key).filter(|v| !v.is_null()) {
            if parse_millis(value).is_none() {
                return Err(AppError::Validation(format!(
                    "{} must be a positive number of milliseconds, got {}",
                    key, value
                )));
            }
        }
    }
    Ok(())
}

/// Restart every monitoring job
pub async fn restart_all(State(state): State<AppState>) -> Result<Json<SchedulerStatus>> {
    let status = blocking(move || {
        state.scheduler.restart_all();
        Ok(state.scheduler.get_status())
    })
    .await?;
    Ok(Json(status))
}

/// Restart one monitoring job
pub async fn restart_job(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<SchedulerStatus>> {
    let status = blocking(move || {
        if !state.scheduler.restart_job_by_name(&kind) {
            return Err(SchedulerError::UnknownJobKind(kind).into());
        }
        Ok(state.scheduler.get_status())
    })
    .await?;
    Ok(Json(status))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> impl IntoResponse {
    let metrics = crate::metrics::gather_metrics();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
}
