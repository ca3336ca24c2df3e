//! Typed access to tool call arguments.

use crate::error::TwinError;

/// Wrapper around parsed tool call arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse the raw JSON text the model sent. Blank text means "no arguments".
    pub fn parse(raw: &str) -> Result<Self, TwinError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        let value: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| TwinError::InvalidArgument(format!("arguments are not valid JSON: {e}")))?;
        if !value.is_object() {
            return Err(TwinError::InvalidArgument(
                "arguments must be a JSON object".to_string(),
            ));
        }
        Ok(Self::new(value))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, TwinError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| TwinError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Remove the given keys, returning the pruned arguments.
    pub(crate) fn without(mut self, keys: &[String]) -> Self {
        if let Some(obj) = self.value.as_object_mut() {
            for key in keys {
                obj.remove(key);
            }
        }
        self
    }

    /// Deserialize the arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, TwinError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            TwinError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
