//! AST node type for agent programs.
//!
//! A program travels as a tree of JSON objects. Every node carries a required
//! `op` field naming the atom to dispatch, an optional `result` field naming
//! the variable the atom's return value binds to, and atom-specific input
//! fields. Nested step arrays stay as plain values until a flow atom reifies
//! them.

use crate::error::{VmError, VmResult};
use crate::types::Value;
use std::collections::HashMap;

/// Reserved field naming the atom to dispatch.
pub const OP_FIELD: &str = "op";
/// Reserved field naming the variable a result binds to.
pub const RESULT_FIELD: &str = "result";

/// One node of an agent program.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Op code of the atom to dispatch.
    pub op: String,
    /// Variable name the atom's return value is bound to, if any.
    pub result: Option<String>,
    /// Atom-specific input fields, with `op` and `result` stripped.
    pub fields: HashMap<String, Value>,
}

impl Step {
    /// Parses a step from a JSON node.
    pub fn from_json(node: &serde_json::Value) -> VmResult<Step> {
        Step::from_value(&Value::from_json(node))
    }

    /// Parses a step from a runtime value.
    pub fn from_value(value: &Value) -> VmResult<Step> {
        let map = value
            .as_object()
            .ok_or_else(|| VmError::MalformedStep(format!("expected an object, got {value}")))?;

        let op = map
            .get(OP_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| VmError::MalformedStep("missing string field 'op'".to_string()))?
            .to_string();

        let result = match map.get(RESULT_FIELD) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(VmError::MalformedStep(format!(
                    "field 'result' must be a string, got {other}"
                )));
            }
        };

        let fields = map
            .iter()
            .filter(|(k, _)| k.as_str() != OP_FIELD && k.as_str() != RESULT_FIELD)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Step { op, result, fields })
    }

    /// Reifies a value into a list of steps.
    pub fn steps_from(value: &Value) -> VmResult<Vec<Step>> {
        let items = value
            .as_array()
            .ok_or_else(|| VmError::MalformedStep(format!("expected a step array, got {value}")))?;
        items.iter().map(Step::from_value).collect()
    }

    /// Looks up an input field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Looks up a required input field.
    pub fn require(&self, key: &str) -> VmResult<&Value> {
        self.fields.get(key).ok_or_else(|| VmError::Validation {
            op: self.op.clone(),
            detail: format!("missing required field '{key}'"),
        })
    }

    /// Looks up a required string input field.
    pub fn string_field(&self, key: &str) -> VmResult<&str> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| VmError::Validation {
                op: self.op.clone(),
                detail: format!("field '{key}' must be a string"),
            })
    }

    /// Reifies a required field into a list of child steps.
    pub fn steps_field(&self, key: &str) -> VmResult<Vec<Step>> {
        Step::steps_from(self.require(key)?)
    }

    /// Reifies an optional field into a list of child steps.
    pub fn opt_steps_field(&self, key: &str) -> VmResult<Option<Vec<Step>>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Step::steps_from(value).map(Some),
        }
    }

    /// Renders the input fields as a JSON object for schema validation.
    pub fn input_json(&self) -> VmResult<serde_json::Value> {
        let mut map = serde_json::Map::with_capacity(self.fields.len());
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.to_json()?);
        }
        Ok(serde_json::Value::Object(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_basic_step() {
        let step = Step::from_json(&json!({
            "op": "var.set",
            "key": "x",
            "value": 1
        }))
        .unwrap();

        assert_eq!(step.op, "var.set");
        assert_eq!(step.result, None);
        assert_eq!(step.field("key"), Some(&Value::from("x")));
        assert_eq!(step.field("value"), Some(&Value::from(1i64)));
        assert!(!step.fields.contains_key("op"));
    }

    #[test]
    fn test_parse_result_binding() {
        let step = Step::from_json(&json!({"op": "len", "list": "xs", "result": "n"})).unwrap();
        assert_eq!(step.result.as_deref(), Some("n"));
        assert!(!step.fields.contains_key("result"));
    }

    #[test]
    fn test_rejects_missing_op() {
        let err = Step::from_json(&json!({"key": "x"})).unwrap_err();
        assert!(matches!(err, VmError::MalformedStep(_)));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(Step::from_json(&json!([1, 2])).is_err());
        assert!(Step::from_json(&json!("seq")).is_err());
    }

    #[test]
    fn test_rejects_non_string_result() {
        let err = Step::from_json(&json!({"op": "len", "result": 3})).unwrap_err();
        assert!(matches!(err, VmError::MalformedStep(_)));
    }

    #[test]
    fn test_nested_steps_reify() {
        let step = Step::from_json(&json!({
            "op": "seq",
            "steps": [
                {"op": "var.set", "key": "x", "value": 1},
                {"op": "var.get", "key": "x", "result": "y"}
            ]
        }))
        .unwrap();

        let children = step.steps_field("steps").unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].op, "var.set");
        assert_eq!(children[1].result.as_deref(), Some("y"));
    }

    #[test]
    fn test_opt_steps_field() {
        let step = Step::from_json(&json!({"op": "try", "try": []})).unwrap();
        assert!(step.opt_steps_field("catch").unwrap().is_none());

        let step = Step::from_json(&json!({"op": "try", "try": [], "catch": []})).unwrap();
        assert_eq!(step.opt_steps_field("catch").unwrap(), Some(vec![]));
    }

    #[test]
    fn test_input_json_strips_reserved_fields() {
        let step = Step::from_json(&json!({
            "op": "split",
            "result": "parts",
            "str": "a,b",
            "sep": ","
        }))
        .unwrap();

        let input = step.input_json().unwrap();
        assert_eq!(input, json!({"str": "a,b", "sep": ","}));
    }

    #[test]
    fn test_require_names_op() {
        let step = Step::from_json(&json!({"op": "split"})).unwrap();
        let err = step.require("sep").unwrap_err();
        assert!(err.to_string().contains("split"));
        assert!(err.to_string().contains("sep"));
    }
}
