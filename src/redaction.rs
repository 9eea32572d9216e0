use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedactionLevel {
    /// Secrets plus prompt text
    Strict,
    /// Secrets only
    #[default]
    Normal,
}

const SECRET_KEY_MARKERS: &[&str] = &["key", "auth", "token", "secret", "password", "cookie"];

fn is_secret_key(key: &str) -> bool {
    let k = key.to_lowercase();
    SECRET_KEY_MARKERS.iter().any(|m| k.contains(m))
}

pub fn redact_value(v: &mut Value, level: RedactionLevel) {
    match v {
        Value::Object(map) => {
            for (k, val) in map.iter_mut() {
                if is_secret_key(k) {
                    *val = Value::String("[REDACTED]".to_string());
                    continue;
                }
                if level == RedactionLevel::Strict && (k == "prompt" || k == "body") {
                    *val = Value::String("[REDACTED-STRICT]".to_string());
                    continue;
                }
                redact_value(val, level);
            }
        }
        Value::Array(arr) => {
            for val in arr {
                redact_value(val, level);
            }
        }
        _ => {}
    }
}

/// Copy of `v` that is safe to log.
pub fn redacted(v: &Value, level: RedactionLevel) -> Value {
    let mut copy = v.clone();
    redact_value(&mut copy, level);
    copy
}
