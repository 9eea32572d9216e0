use crate::health;
use crate::ingress::{BodyError, Invocation};
use crate::logging::request_id_middleware;
use crate::pipeline::handle_invocation;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Turns the buffered body into text. Rejections are kept for the pipeline so
/// they come back as envelopes, after the auth gate.
fn read_body(
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<String, BodyError> {
    let bytes = match body {
        Ok(b) => b,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!("Request body over the configured limit");
            return Err(BodyError::TooLarge);
        }
        Err(rejection) => return Err(BodyError::Unreadable(rejection.body_text())),
    };
    String::from_utf8(bytes.to_vec()).map_err(|_| BodyError::NotUtf8)
}

/// Body is the quiz request itself (raw text, JSON-decoded by the normalizer).
pub async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let invocation = match read_body(body) {
        Ok(text) => Invocation::from_http(&headers, text),
        Err(e) => Invocation::rejected(&headers, e),
    };
    handle_invocation(&state, invocation).await.into_response()
}

/// Body is a whole invocation event. Headers on the HTTP request fill in any
/// the event does not carry.
pub async fn invoke_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let body = match read_body(body) {
        Ok(text) => text,
        Err(e) => {
            return handle_invocation(&state, Invocation::rejected(&headers, e))
                .await
                .into_response();
        }
    };

    let invocation = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(event) => {
            let mut invocation = Invocation::from_event(event);
            if invocation.headers.is_empty() {
                invocation.headers = (&headers).into();
            }
            invocation
        }
        Err(e) => {
            tracing::debug!("Invocation event is not JSON, treating it as a raw body: {}", e);
            Invocation::from_http(&headers, body)
        }
    };

    handle_invocation(&state, invocation).await.into_response()
}

pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", post(generate_handler))
        .route("/generate", post(generate_handler))
        .route("/invoke", post(invoke_handler))
        .route("/health", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .layer(axum::extract::DefaultBodyLimit::max(max_body_size))
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
