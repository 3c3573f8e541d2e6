use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "secret",
    "token",
    "client_secret",
    "access_token",
    "refresh_token",
    "authorization",
];

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{8,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#"("(?:access_token|refresh_token|client_secret)"\s*:\s*)"[^"]*""#)
                .expect("inline redaction regex"),
            "$1\"***REDACTED***\"",
        ),
        (
            Regex::new(r"\b(client_secret|access_token|refresh_token)=([^&\s]+)")
                .expect("inline redaction regex"),
            "$1=***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_KEYS.contains(&normalized.as_str())
        || normalized.contains("secret")
        || normalized.ends_with("token")
}

/// Scrubs credentials from free text and caps it at `max_bytes`.
pub fn redact_text(value: &str, max_bytes: usize) -> String {
    let mut out = value.to_string();
    for (pattern, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    if out.len() > max_bytes {
        let mut capped = truncate_utf8_prefix(&out, max_bytes);
        capped.push_str("...");
        return capped;
    }
    out
}

pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(redact_text(text, usize::MAX)),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                } else {
                    out.insert(key.clone(), redact_value(val));
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

/// Keeps the first four characters of an identifier for log correlation.
pub fn mask_secret(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "(unset)".to_string();
    }
    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() <= 4 {
        return "****".to_string();
    }
    format!("{}****", visible)
}
