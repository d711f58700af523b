//! JSON Schema validation.
//!
//! The VM treats schemas as opaque: it only needs a compiled validator and a
//! way to enumerate the properties an object schema declares.

use crate::types::Value;
use anyhow::Result;

/// A compiled JSON Schema validator.
pub struct JsonSchema {
    schema: serde_json::Value,
    validator: jsonschema::JSONSchema,
}

impl std::fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchema")
            .field("schema", &self.schema)
            .finish()
    }
}

impl JsonSchema {
    /// Compiles a schema from a JSON value.
    pub fn from_value(schema: serde_json::Value) -> Result<Self> {
        let validator = jsonschema::JSONSchema::compile(&schema)
            .map_err(|e| anyhow::anyhow!("Invalid JSON schema: {}", e))?;

        Ok(JsonSchema { schema, validator })
    }

    /// Validates a value against the schema, collecting every violation into
    /// one message.
    pub fn validate(&self, value: &serde_json::Value) -> Result<()> {
        self.validator.validate(value).map_err(|errors| {
            let error_messages: Vec<String> = errors
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();

            anyhow::anyhow!(error_messages.join("; "))
        })
    }

    /// Checks a value against the schema.
    pub fn is_valid(&self, value: &serde_json::Value) -> bool {
        self.validator.is_valid(value)
    }

    /// Get the underlying schema.
    pub fn schema(&self) -> &serde_json::Value {
        &self.schema
    }
}

/// Enumerates the property names an object schema declares, sorted for
/// deterministic iteration. Non-object schemas declare no properties.
pub fn object_properties(schema: &Value) -> Vec<String> {
    let mut names: Vec<String> = schema
        .as_object()
        .and_then(|map| map.get("properties"))
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate() {
        let schema = JsonSchema::from_value(json!({
            "type": "object",
            "properties": {
                "key": {"type": "string"}
            },
            "required": ["key"]
        }))
        .unwrap();

        assert!(schema.validate(&json!({"key": "x"})).is_ok());
        assert!(schema.validate(&json!({})).is_err());
        assert!(schema.validate(&json!({"key": 1})).is_err());
    }

    #[test]
    fn test_is_valid() {
        let schema = JsonSchema::from_value(json!({"type": "array"})).unwrap();
        assert!(schema.is_valid(&json!([1, 2])));
        assert!(!schema.is_valid(&json!("nope")));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        assert!(JsonSchema::from_value(json!({"type": "not-a-type"})).is_err());
    }

    #[test]
    fn test_object_properties() {
        let schema = Value::from_json(&json!({
            "type": "object",
            "properties": {"b": {}, "a": {"type": "string"}}
        }));
        assert_eq!(object_properties(&schema), vec!["a", "b"]);
    }

    #[test]
    fn test_object_properties_empty_cases() {
        assert!(object_properties(&Value::from_json(&json!({}))).is_empty());
        assert!(object_properties(&Value::from_json(&json!("string"))).is_empty());
        assert!(object_properties(&Value::Null).is_empty());
    }
}
