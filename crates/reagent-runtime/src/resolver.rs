//! Value resolution.
//!
//! Converts an AST-embedded value into a runtime value. Two shapes reference
//! the caller's arguments: the tagged object `{"$kind": "arg", "path": P}`
//! and the string shorthand `"args.P"`. A bare string that matches a bound
//! variable reads that binding; anything else passes through as a literal,
//! including the original string. Plain string literals can therefore act as
//! variable references by convention, which keeps the AST compact at the
//! cost of a collision hazard covered in the tests.

use crate::context::RuntimeContext;
use reagent_core::Value;

/// Tag field marking an argument reference.
const KIND_FIELD: &str = "$kind";
/// Tag value marking an argument reference.
const ARG_KIND: &str = "arg";
/// Field carrying the argument name.
const PATH_FIELD: &str = "path";
/// String shorthand prefix for argument references.
const ARG_PREFIX: &str = "args.";

/// Resolves a step-argument value against `args`, scoped state, or literal.
pub fn resolve_value(value: &Value, ctx: &RuntimeContext) -> Value {
    if let Some(path) = arg_reference(value) {
        return ctx.args.get(path).cloned().unwrap_or(Value::Null);
    }

    if let Value::String(s) = value {
        if let Some(path) = s.strip_prefix(ARG_PREFIX) {
            return ctx.args.get(path).cloned().unwrap_or(Value::Null);
        }
        if let Some(bound) = ctx.get(s) {
            return bound.clone();
        }
    }

    value.clone()
}

/// Extracts the argument name from a tagged reference object.
fn arg_reference(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.get(KIND_FIELD)?.as_str()? != ARG_KIND {
        return None;
    }
    map.get(PATH_FIELD)?.as_str()
}
