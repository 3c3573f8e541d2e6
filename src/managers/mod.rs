pub mod access;
pub mod events;
pub mod identities;
pub mod profiles;

use crate::errors::{IdentityNowError, ToolError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Records a failed sub-fetch under `errors.<key>` and yields an empty list.
pub(crate) fn partial<T: Serialize>(
    key: &str,
    result: Result<Vec<T>, IdentityNowError>,
    errors: &mut Map<String, Value>,
) -> Result<Value, ToolError> {
    match result {
        Ok(items) => serde_json::to_value(items)
            .map_err(|err| ToolError::internal(format!("Failed to serialize {}: {}", key, err))),
        Err(err) => {
            errors.insert(key.to_string(), Value::String(err.to_string()));
            Ok(Value::Array(Vec::new()))
        }
    }
}
