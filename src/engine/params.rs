// Parameter merging: caller inputs over declared defaults

//! # Parameter Merger
//!
//! Builds the input scope for one component. Total over the declared
//! parameters: every declared key is present in the output, taken from the
//! caller when supplied and non-null, from the declared default otherwise.

use serde_json::Value;

use super::Context;
use crate::models::Component;

/// Combine caller-supplied inputs with a component's parameter defaults
///
/// For each declared parameter: the caller value wins when present and
/// non-null (any JSON type is kept as-is); otherwise the declared default
/// string is used; a missing default yields `""`. Caller keys that are not
/// declared on the component are ignored.
pub fn merge_parameters(component: &Component, user_inputs: &Context) -> Context {
    let mut merged = Context::new();
    for param in &component.parameters {
        let value = match user_inputs.get(&param.key) {
            Some(v) if !v.is_null() => v.clone(),
            _ => Value::String(param.value.clone()),
        };
        merged.insert(param.key.clone(), value);
    }
    merged
}
