use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub upstream_credential: String,
    pub basic_auth: String,
    pub backend: String,
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let settings = &state.settings;

    let key_ok = settings.anthropic_api_key.is_some();
    if !key_ok {
        tracing::error!("Readiness check: ANTHROPIC_API_KEY missing");
    }

    let auth_status = if !settings.require_auth {
        "disabled"
    } else if settings.basic_auth.is_complete() {
        "ok"
    } else {
        tracing::error!("Readiness check: Basic auth enabled without credentials");
        "missing"
    };

    let ready = settings.is_ready();
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "unready" }.to_string(),
            upstream_credential: if key_ok { "ok" } else { "missing" }.to_string(),
            basic_auth: auth_status.to_string(),
            backend: state.backend.name().to_string(),
        }),
    )
}
