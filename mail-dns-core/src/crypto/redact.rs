//! Secret masking for logs and display

use serde::Serialize;
use serde_json::Value;

const MASK: &str = "****";

/// Display-safe form of a secret: first and last four characters around `****`.
///
/// Values of eight characters or fewer are masked entirely.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return MASK.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{MASK}{tail}")
}

fn is_secret_key(key: &str) -> bool {
    let k: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase();
    k.contains("token")
        || k.contains("secret")
        || k.contains("password")
        || k.ends_with("key")
        || k.ends_with("keyid")
}

/// Recursively mask every field whose name looks secret-like
/// (`apiKey`, `token`, `secret`, `password`, `*key`).
pub fn redact_secrets(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = if is_secret_key(&k) {
                        match v {
                            Value::Null => Value::Null,
                            Value::String(s) => Value::String(mask_secret(&s)),
                            _ => Value::String(MASK.to_string()),
                        }
                    } else {
                        redact_secrets(v)
                    };
                    (k, v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_secrets).collect()),
        other => other,
    }
}

/// Redacted JSON rendering of `value` for log lines.
pub fn sanitize_for_log<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(v) => redact_secrets(v).to_string(),
        Err(_) => "<unserializable>".to_string(),
    }
}
