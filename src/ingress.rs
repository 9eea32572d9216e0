use crate::constants::DEFAULT_MODEL;
use crate::types::*;
use serde_json::Value;
use std::collections::BTreeMap;

/// Inbound headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag(BTreeMap<String, String>);

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

impl From<&axum::http::HeaderMap> for HeaderBag {
    fn from(headers: &axum::http::HeaderMap) -> Self {
        let mut bag = HeaderBag::new();
        for (name, value) in headers {
            if let Ok(v) = value.to_str() {
                bag.insert(name.as_str(), v);
            }
        }
        bag
    }
}

/// Why an HTTP body could not be turned into text. Reported after the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    NotUtf8,
    TooLarge,
    Unreadable(String),
}

impl From<BodyError> for QuizError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::NotUtf8 => QuizError::BodyNotUtf8,
            BodyError::TooLarge => QuizError::BodyTooLarge,
            BodyError::Unreadable(reason) => QuizError::BodyUnreadable(reason),
        }
    }
}

/// One call into the pipeline: the headers feeding the auth gate plus the payload
/// the request is read from.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub headers: HeaderBag,
    pub payload: Value,
    pub body_error: Option<BodyError>,
}

impl Invocation {
    /// Builds an invocation from an event object. A `headers` object is lifted out
    /// for the gate; the payload keeps everything so an inline request still works.
    pub fn from_event(event: Value) -> Self {
        let mut headers = HeaderBag::new();
        if let Some(map) = event.get("headers").and_then(|h| h.as_object()) {
            for (k, v) in map {
                if let Some(s) = v.as_str() {
                    headers.insert(k.clone(), s);
                }
            }
        }
        Self {
            headers,
            payload: event,
            body_error: None,
        }
    }

    /// Builds an invocation from a plain HTTP request. The raw body goes through
    /// the same string-body decoding as an event's `body` field.
    pub fn from_http(headers: &axum::http::HeaderMap, body: String) -> Self {
        Self {
            headers: HeaderBag::from(headers),
            payload: serde_json::json!({ "body": body }),
            body_error: None,
        }
    }

    /// An HTTP request whose body could not be read. The headers still go
    /// through the gate before the body error is reported.
    pub fn rejected(headers: &axum::http::HeaderMap, error: BodyError) -> Self {
        Self {
            headers: HeaderBag::from(headers),
            payload: Value::Object(Default::default()),
            body_error: Some(error),
        }
    }
}

/// A validated quiz generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub prompt: String,
    pub tags: Vec<String>,
    pub model: String,
}

impl QuizRequest {
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let body = request_body(payload);

        let prompt = match body.get("prompt") {
            None | Some(Value::Null) => return Err(QuizError::MissingPrompt.into()),
            Some(Value::String(s)) if s.is_empty() => return Err(QuizError::MissingPrompt.into()),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(QuizError::InvalidPrompt.into()),
        };

        let tags = match body.get("tags") {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(tag_to_string).collect(),
            Some(_) => return Err(QuizError::InvalidTags.into()),
        };

        let model = match body.get("model") {
            None | Some(Value::Null) => DEFAULT_MODEL.to_string(),
            Some(Value::String(s)) if s.is_empty() => DEFAULT_MODEL.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(QuizError::InvalidModel.into()),
        };

        Ok(Self {
            prompt,
            tags,
            model,
        })
    }
}

/// Resolves the value the request fields are read from. A string `body` is
/// JSON-decoded when possible and otherwise kept as the raw string.
fn request_body(payload: &Value) -> Value {
    match payload.get("body") {
        None => payload.clone(),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!("Body is not JSON, keeping raw string: {}", e);
                Value::String(raw.clone())
            }
        },
        Some(other) => other.clone(),
    }
}

fn tag_to_string(tag: &Value) -> String {
    match tag {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
