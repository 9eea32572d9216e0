use crate::constants::*;
use crate::types::*;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// HTTP-shaped result returned for every invocation, success or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded body.
    pub body: String,
}

#[derive(Serialize)]
struct EnvelopeBody<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

impl<'a> EnvelopeBody<'a> {
    fn empty(success: bool) -> Self {
        Self {
            success,
            data: None,
            warning: None,
            raw_response: None,
            error: None,
            usage: None,
        }
    }
}

impl Envelope {
    fn build(status: StatusCode, body: &EnvelopeBody<'_>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        headers.insert(
            "Access-Control-Allow-Origin".to_string(),
            ALLOW_ANY_ORIGIN.to_string(),
        );
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                "WWW-Authenticate".to_string(),
                BASIC_AUTH_CHALLENGE.to_string(),
            );
        }

        let body = match serde_json::to_string(body) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to serialize envelope body: {}", e);
                r#"{"success":false,"error":"Internal error: response serialization failed"}"#
                    .to_string()
            }
        };

        Self {
            status_code: status.as_u16(),
            headers,
            body,
        }
    }

    pub fn success(data: &Value, usage: Usage) -> Self {
        Self::build(
            StatusCode::OK,
            &EnvelopeBody {
                data: Some(data),
                usage: Some(usage),
                ..EnvelopeBody::empty(true)
            },
        )
    }

    /// 200 carrying model output that did not parse as JSON.
    pub fn warning(raw_response: &str, usage: Usage) -> Self {
        Self::build(
            StatusCode::OK,
            &EnvelopeBody {
                warning: Some(UNPARSEABLE_WARNING),
                raw_response: Some(raw_response),
                usage: Some(usage),
                ..EnvelopeBody::empty(true)
            },
        )
    }

    pub fn failure(status: StatusCode, message: &str) -> Self {
        Self::build(
            status,
            &EnvelopeBody {
                error: Some(message),
                ..EnvelopeBody::empty(false)
            },
        )
    }

    pub fn from_error(err: &QuizError) -> Self {
        Self::failure(err.status_code(), &err.to_string())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

impl From<ObservedError> for Envelope {
    fn from(err: ObservedError) -> Self {
        Envelope::from_error(&err.inner)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = match StatusCode::from_u16(self.status_code) {
            Ok(s) => s,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(n), Ok(v)) => {
                    headers.insert(n, v);
                }
                _ => tracing::warn!("Dropping invalid envelope header {}", name),
            }
        }
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(JSON_CONTENT_TYPE),
            );
        }
        response
    }
}
