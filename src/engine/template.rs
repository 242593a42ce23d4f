// Template interpolation: dotted-path resolution and {{path}} substitution

//! # Template Subsystem
//!
//! Substitutes `{{path}}` references against a [`Context`] of JSON values.
//! Three layers, each building on the previous:
//!
//! - [`resolve_path`] / [`resolve`]: walk a dotted path through objects and
//!   arrays; missing paths yield `None`, never an error.
//! - [`interpolate_string`]: replace every embedded `{{ path }}` token in a
//!   text template. Unresolvable references are left verbatim so a half-built
//!   pipeline stays diagnosable instead of crashing.
//! - [`interpolate_json`]: walk a parsed JSON document. A string node that is
//!   *exactly* one reference substitutes the raw resolved value, preserving
//!   its JSON type; this is how a step passes a whole prior-step object or a
//!   chat message array onward without re-encoding.

use serde_json::Value;
use tracing::warn;

use super::Context;

/// Characters allowed inside a `{{...}}` reference path
///
/// `$` covers system variables, `.` the path separator, `-` keys such as
/// UUID-derived component ids.
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '-')
}

fn is_path(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_path_char)
}

/// Resolve a dotted path against a value tree
///
/// Splits on `.` and walks successive object-key / array-index accesses.
/// Returns `None` when the path is empty, a segment is missing, an index is
/// out of range, or traversal hits a scalar or null.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = root;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve a dotted path against a context map
///
/// The first segment selects the scope entry, the rest walk into its value.
pub fn resolve<'a>(scope: &'a Context, path: &str) -> Option<&'a Value> {
    let mut parts = path.splitn(2, '.');
    let first = parts.next()?;
    if first.is_empty() {
        return None;
    }
    let entry = scope.get(first)?;
    match parts.next() {
        Some(rest) => resolve_path(entry, rest),
        None => Some(entry),
    }
}

/// Render a resolved value for embedding into a text template
///
/// Objects and arrays are JSON-stringified; strings are inserted bare;
/// numbers and booleans use their canonical form.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace every `{{ path }}` occurrence in a template string
///
/// Each occurrence is resolved independently against `scope`. A reference
/// that resolves to nothing (or to JSON `null`) is left untouched,
/// `{{...}}` included.
pub fn interpolate_string(template: &str, scope: &Context) -> String {
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(close) = template[i + 2..].find("}}") {
                let token_end = i + 2 + close + 2;
                let inner = &template[i + 2..i + 2 + close];
                let path = inner.trim();
                if is_path(path) {
                    match resolve(scope, path) {
                        Some(value) if !value.is_null() => {
                            out.push_str(&value_to_string(value));
                        }
                        // Unresolved or null: keep the token verbatim
                        _ => out.push_str(&template[i..token_end]),
                    }
                    i = token_end;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// If the whole string is a single `{{path}}` reference (nothing but
/// optional whitespace around it), return the inner path.
fn exact_reference(s: &str) -> Option<&str> {
    let inner = s.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    let path = inner.trim();
    if is_path(path) {
        Some(path)
    } else {
        None
    }
}

fn walk(node: Value, scope: &Context) -> Value {
    match node {
        Value::String(s) => {
            // Exact-match substitution preserves the resolved value's JSON
            // type (array/object/number/boolean), including a resolved null.
            if let Some(path) = exact_reference(&s) {
                if let Some(value) = resolve(scope, path) {
                    return value.clone();
                }
            }
            Value::String(interpolate_string(&s, scope))
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| walk(v, scope)).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, walk(v, scope))).collect())
        }
        other => other,
    }
}

/// Interpolate a JSON document template and return it re-serialized
///
/// The input is the *unparsed* document string. If it fails to parse, the
/// whole document is treated as a plain text template instead of failing
/// the step; malformed templates degrade, they do not crash.
pub fn interpolate_json(template: &str, scope: &Context) -> String {
    match serde_json::from_str::<Value>(template) {
        Ok(root) => {
            let processed = walk(root, scope);
            serde_json::to_string(&processed)
                .unwrap_or_else(|_| interpolate_string(template, scope))
        }
        Err(e) => {
            warn!("body template is not valid JSON, falling back to string interpolation: {e}");
            interpolate_string(template, scope)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(value: Value) -> Context {
        match value {
            Value::Object(map) => map,
            _ => panic!("scope must be an object"),
        }
    }

    #[test]
    fn test_resolve_path_walks_objects_and_arrays() {
        let root = json!({"step1": {"data": {"items": [{"id": 7}]}}});
        assert_eq!(
            resolve_path(&root, "step1.data.items.0.id"),
            Some(&json!(7))
        );
    }

    #[test]
    fn test_resolve_path_empty_and_missing() {
        let root = json!({"a": {"b": 1}});
        assert_eq!(resolve_path(&root, ""), None);
        assert_eq!(resolve_path(&root, "a.c"), None);
        assert_eq!(resolve_path(&root, "a.b.c"), None);
        assert_eq!(resolve_path(&root, "missing.deep.path"), None);
    }

    #[test]
    fn test_resolve_through_null_is_none() {
        let root = json!({"a": null});
        assert_eq!(resolve_path(&root, "a.b"), None);
        assert_eq!(resolve_path(&root, "a"), Some(&Value::Null));
    }

    #[test]
    fn test_interpolate_basic() {
        let ctx = scope(json!({"a": "x", "b": "y"}));
        assert_eq!(interpolate_string("{{a}}-{{b}}", &ctx), "x-y");
    }

    #[test]
    fn test_interpolate_unresolved_left_verbatim() {
        let ctx = scope(json!({}));
        assert_eq!(
            interpolate_string("pre {{missing}} post", &ctx),
            "pre {{missing}} post"
        );
    }

    #[test]
    fn test_interpolate_null_left_verbatim() {
        let ctx = scope(json!({"gone": null}));
        assert_eq!(interpolate_string("x {{gone}} y", &ctx), "x {{gone}} y");
    }

    #[test]
    fn test_interpolate_whitespace_and_dotted_paths() {
        let ctx = scope(json!({"env": {"API_KEY": "sk-123"}}));
        assert_eq!(
            interpolate_string("Bearer {{ env.API_KEY }}", &ctx),
            "Bearer sk-123"
        );
    }

    #[test]
    fn test_interpolate_hyphenated_keys() {
        // Component ids are UUIDs, so '-' must be a valid path character
        let ctx = scope(json!({"f47ac10b-58cc": {"data": "ok"}}));
        assert_eq!(interpolate_string("{{f47ac10b-58cc.data}}", &ctx), "ok");
    }

    #[test]
    fn test_interpolate_stringifies_objects() {
        let ctx = scope(json!({"obj": {"k": 1}, "arr": [1, 2], "n": 42, "b": true}));
        assert_eq!(
            interpolate_string("{{obj}}|{{arr}}|{{n}}|{{b}}", &ctx),
            r#"{"k":1}|[1,2]|42|true"#
        );
    }

    #[test]
    fn test_interpolate_invalid_token_untouched() {
        let ctx = scope(json!({"a": "x"}));
        assert_eq!(interpolate_string("{{a b}} {{}} {{a}}", &ctx), "{{a b}} {{}} x");
    }

    #[test]
    fn test_interpolate_json_preserves_array_type() {
        let ctx = scope(json!({"$messages": [{"role": "user", "content": "hi"}]}));
        let out = interpolate_json(r#"{"items": "{{$messages}}"}"#, &ctx);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["items"].is_array());
        assert_eq!(parsed["items"][0]["content"], "hi");
    }

    #[test]
    fn test_interpolate_json_preserves_numbers_and_booleans() {
        let ctx = scope(json!({"t": 0.7, "s": true}));
        let out = interpolate_json(r#"{"temperature": "{{t}}", "stream": "{{s}}"}"#, &ctx);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["temperature"], json!(0.7));
        assert_eq!(parsed["stream"], json!(true));
    }

    #[test]
    fn test_interpolate_json_exact_null_substitutes() {
        // An exact reference that resolves to JSON null becomes null, unlike
        // embedded tokens which stay verbatim
        let ctx = scope(json!({"maybe": null}));
        let out = interpolate_json(r#"{"v": "{{maybe}}"}"#, &ctx);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert!(parsed["v"].is_null());
    }

    #[test]
    fn test_interpolate_json_embedded_tokens_stringify() {
        let ctx = scope(json!({"user": "Bob", "step1": {"count": 3}}));
        let out = interpolate_json(
            r#"{"prompt": "Hello {{user}}, you have {{step1.count}} results"}"#,
            &ctx,
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["prompt"], "Hello Bob, you have 3 results");
    }

    #[test]
    fn test_interpolate_json_form_entries() {
        let ctx = scope(json!({"user": "Bob"}));
        let out = interpolate_json(r#"[{"key":"name","value":"{{user}}"}]"#, &ctx);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!([{"key": "name", "value": "Bob"}]));
    }

    #[test]
    fn test_interpolate_json_malformed_degrades_to_string_mode() {
        let ctx = scope(json!({"a": "x"}));
        assert_eq!(interpolate_json("not json {{a}}", &ctx), "not json x");
    }

    #[test]
    fn test_interpolate_json_nested_recursion() {
        let ctx = scope(json!({"inner": {"deep": [1, 2, 3]}}));
        let out = interpolate_json(
            r#"{"wrap": {"list": ["{{inner.deep}}", "plain"]}}"#,
            &ctx,
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["wrap"]["list"][0], json!([1, 2, 3]));
        assert_eq!(parsed["wrap"]["list"][1], "plain");
    }
}
