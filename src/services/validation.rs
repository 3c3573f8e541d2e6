use crate::errors::ToolError;
use serde_json::Value;

/// Argument accessors for tool handlers. Values reaching these have already
/// passed the catalog schema; the checks here cover what a schema cannot
/// express and give handler-level messages.
#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, value: &Value, label: &str) -> Result<String, ToolError> {
        let text = value.as_str().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(normalized.to_string())
    }

    /// Absent, null and blank strings all count as "not given".
    pub fn optional_string(&self, args: &Value, key: &str) -> Result<Option<String>, ToolError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value) => self.ensure_string(value, key).map(Some),
        }
    }

    pub fn require_string(&self, args: &Value, key: &str) -> Result<String, ToolError> {
        self.optional_string(args, key)?
            .ok_or_else(|| ToolError::missing_argument(key))
    }

    /// An id that is interpolated into a URL path segment.
    pub fn ensure_identifier(&self, value: &str, label: &str) -> Result<String, ToolError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'))
        {
            return Err(ToolError::invalid_params(format!(
                "{} must not contain whitespace or any of / ? # %",
                label
            ))
            .with_details(serde_json::json!({ "argument": label })));
        }
        Ok(trimmed.to_string())
    }

    pub fn require_identifier(&self, args: &Value, key: &str) -> Result<String, ToolError> {
        let raw = self.require_string(args, key)?;
        self.ensure_identifier(&raw, key)
    }

    pub fn optional_identifier(&self, args: &Value, key: &str) -> Result<Option<String>, ToolError> {
        match self.optional_string(args, key)? {
            Some(raw) => self.ensure_identifier(&raw, key).map(Some),
            None => Ok(None),
        }
    }

    /// Positive integer with a default. Numeric strings are accepted.
    pub fn positive_integer(
        &self,
        args: &Value,
        key: &str,
        fallback: usize,
    ) -> Result<usize, ToolError> {
        let value = match args.get(key) {
            None | Some(Value::Null) => return Ok(fallback),
            Some(value) => value,
        };
        let numeric = value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ToolError::invalid_params(format!("{} must be a positive integer", key))
            })?;
        Ok(usize::try_from(numeric).unwrap_or(usize::MAX))
    }

    pub fn optional_bool(&self, args: &Value, key: &str, fallback: bool) -> Result<bool, ToolError> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ToolError::invalid_params(format!("{} must be a boolean", key))),
        }
    }

    pub fn optional_string_list(
        &self,
        args: &Value,
        key: &str,
    ) -> Result<Option<Vec<String>>, ToolError> {
        let items = match args.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ToolError::invalid_params(format!(
                    "{} must be an array of strings",
                    key
                )))
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.ensure_string(item, key)?);
        }
        Ok(Some(out))
    }

    pub fn choice(
        &self,
        args: &Value,
        key: &str,
        allowed: &[&str],
        fallback: &str,
    ) -> Result<String, ToolError> {
        let Some(value) = self.optional_string(args, key)? else {
            return Ok(fallback.to_string());
        };
        if allowed.contains(&value.as_str()) {
            Ok(value)
        } else {
            Err(ToolError::invalid_params(format!(
                "{} must be one of: {}",
                key,
                allowed.join(", ")
            ))
            .with_details(serde_json::json!({ "argument": key, "allowed": allowed })))
        }
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
