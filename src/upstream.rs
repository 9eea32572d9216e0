use crate::constants::{ANTHROPIC_MESSAGES_PATH, ANTHROPIC_VERSION, MAX_TOKENS, TEMPERATURE};
use crate::specs::anthropic::*;
use crate::types::*;
use futures_util::future::{BoxFuture, FutureExt};

/// Parameters of one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub user_message: String,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>, user_message: String) -> Self {
        Self {
            model: model.into(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system_prompt: system_prompt.into(),
            user_message,
        }
    }
}

/// The text-generation call the pipeline depends on.
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        api_key: &'a str,
        request: &'a ModelRequest,
    ) -> BoxFuture<'a, Result<UpstreamResult>>;
}

pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ANTHROPIC_MESSAGES_PATH)
    }

    async fn send(&self, api_key: &str, request: &ModelRequest) -> Result<UpstreamResult> {
        let body = to_wire(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(QuizError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = match response.text().await {
                Ok(text) => text,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(QuizError::Upstream(status, upstream_error_message(&error_body)).into());
        }

        let parsed: AnthropicResponse = response.json().await.map_err(QuizError::Network)?;
        from_wire(parsed)
    }
}

impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn complete<'a>(
        &'a self,
        api_key: &'a str,
        request: &'a ModelRequest,
    ) -> BoxFuture<'a, Result<UpstreamResult>> {
        self.send(api_key, request).boxed()
    }
}

pub fn to_wire(request: &ModelRequest) -> AnthropicRequest {
    AnthropicRequest {
        model: request.model.clone(),
        system: if request.system_prompt.is_empty() {
            None
        } else {
            Some(request.system_prompt.clone())
        },
        messages: vec![AnthropicMessage {
            role: "user".to_string(),
            content: request.user_message.clone(),
        }],
        max_tokens: request.max_tokens,
        temperature: Some(request.temperature),
    }
}

pub fn from_wire(response: AnthropicResponse) -> Result<UpstreamResult> {
    let text = match response.first_text() {
        Some(t) => t.to_string(),
        None => {
            return Err(QuizError::Upstream(
                axum::http::StatusCode::BAD_GATEWAY,
                format!("response {} contained no text content", response.id),
            )
            .into())
        }
    };

    Ok(UpstreamResult {
        text,
        usage: Usage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        },
    })
}

/// Prefers the API's own error message over the raw body.
fn upstream_error_message(body: &str) -> String {
    match serde_json::from_str::<AnthropicErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => {
            format!("{}: {}", parsed.error.kind, parsed.error.message)
        }
        _ => crate::str_utils::prefix_chars(body, 500).to_string(),
    }
}
