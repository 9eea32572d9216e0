use crate::auth;
use crate::constants::LOG_PREVIEW_CHARS;
use crate::envelope::Envelope;
use crate::extract::{extract_json, parse_cleaned, ExtractionOutcome, UnparseablePolicy};
use crate::ingress::{Invocation, QuizRequest};
use crate::main_helper::AppState;
use crate::prompt::build_user_message;
use crate::redaction::{redacted, RedactionLevel};
use crate::str_utils;
use crate::types::*;
use crate::upstream::ModelRequest;
use futures_util::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;

/// Runs an event-shaped invocation (`{headers?, body?}` or the request itself).
pub async fn handle_event(state: &AppState, event: Value) -> Envelope {
    handle_invocation(state, Invocation::from_event(event)).await
}

/// Gate → normalize → build message → model call → extract → envelope.
/// Never fails: every error, and any panic inside the flow, becomes an envelope.
#[tracing::instrument(
    name = "quiz.invoke",
    skip_all,
    fields(
        auth.user = tracing::field::Empty,
        model.target = tracing::field::Empty,
        tokens.input = tracing::field::Empty,
        tokens.output = tracing::field::Empty,
        http.status = tracing::field::Empty,
        quiz.outcome = tracing::field::Empty,
    )
)]
pub async fn handle_invocation(state: &AppState, invocation: Invocation) -> Envelope {
    let span = tracing::Span::current();

    tracing::debug!(
        event = %redacted(&invocation.payload, RedactionLevel::Normal),
        "Received invocation"
    );

    let envelope = match AssertUnwindSafe(run(state, &invocation)).catch_unwind().await {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(e)) => {
            let kind = e.inner.kind();
            span.record("quiz.outcome", tracing::field::display(kind));
            match kind {
                ErrorKind::Validation | ErrorKind::Auth => {
                    tracing::warn!("Request rejected ({}): {}", kind, e.inner)
                }
                _ => tracing::error!("Request failed ({}): {}", kind, e),
            }
            Envelope::from(e)
        }
        Err(panic_payload) => {
            let message = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                *s
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.as_str()
            } else {
                "Unknown panic"
            };
            tracing::error!(target: "panic", "Invocation panicked: {}", message);
            span.record("quiz.outcome", "internal");
            Envelope::from_error(&QuizError::internal(message))
        }
    };

    span.record("http.status", envelope.status_code);
    envelope
}

async fn run(state: &AppState, invocation: &Invocation) -> Result<Envelope> {
    let span = tracing::Span::current();
    let settings = &state.settings;

    if settings.require_auth {
        let user = auth::authenticate(&invocation.headers, &settings.basic_auth)?;
        span.record("auth.user", user.as_str());
        tracing::debug!("Authenticated user {}", user);
    }

    if let Some(body_error) = &invocation.body_error {
        return Err(body_error.clone().into());
    }

    let request = QuizRequest::from_payload(&invocation.payload)?;
    let api_key = settings.api_key()?;

    span.record("model.target", request.model.as_str());
    tracing::info!("Processing request with model: {}", request.model);
    tracing::info!("Tags provided: {:?}", request.tags);

    let model_request = ModelRequest::new(
        request.model.clone(),
        settings.system_prompt.clone(),
        build_user_message(&request.prompt, &request.tags),
    );

    let result = state
        .retry
        .execute_with_retry(|| state.backend.complete(api_key, &model_request))
        .await?;

    span.record("tokens.input", result.usage.input_tokens);
    span.record("tokens.output", result.usage.output_tokens);
    tracing::info!(
        "Model response via {}: {}",
        state.backend.name(),
        str_utils::preview(&result.text, LOG_PREVIEW_CHARS)
    );

    match extract_json(&result.text) {
        ExtractionOutcome::Parsed(value) => {
            span.record("quiz.outcome", "parsed");
            Ok(Envelope::success(&value, result.usage))
        }
        ExtractionOutcome::Unparseable(raw) => match settings.unparseable {
            UnparseablePolicy::Warn => {
                tracing::warn!("Model response is not valid JSON, returning raw text");
                span.record("quiz.outcome", "unparseable");
                Ok(Envelope::warning(&raw, result.usage))
            }
            UnparseablePolicy::Reject => {
                let reason = match parse_cleaned(&raw) {
                    Err(e) => e.to_string(),
                    Ok(_) => "unexpected content".to_string(),
                };
                Err(QuizError::InvalidJson(reason).into())
            }
        },
    }
}
