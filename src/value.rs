//! Field-path resolution over structured argument values
//!
//! Call arguments are carried as [`serde_json::Value`], which gives every
//! argument the same shape regardless of its Rust type:
//! - scalars (strings, numbers, bools)
//! - field maps (objects)
//! - sequences (arrays)
//!
//! A field path is a dot-separated list of segments walked from the root.

use serde::Serialize;
use serde_json::Value;

use crate::KeyError;

/// Convert a call's argument tuple into the ordered candidate list used for keys.
///
/// Arguments are expected as a tuple: `(user,)` yields one candidate, `(a, b)`
/// yields two and `()` yields none. Any other serialized shape becomes a
/// single candidate.
pub fn to_arguments<A: Serialize + ?Sized>(args: &A) -> Result<Vec<Value>, serde_json::Error> {
    Ok(match serde_json::to_value(args)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

/// Resolve a dotted field path against a structured value.
///
/// A scalar root resolves to itself whatever the path is. An empty path
/// returns the root. Numeric segments index into sequences.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Result<&'a Value, KeyError> {
    let path = path.trim();

    if is_scalar(value) {
        return Ok(value);
    }

    let mut node = value;
    if !path.is_empty() {
        for segment in path.split('.') {
            node = match node {
                Value::Null => return Err(null_traversal(path, segment)),
                Value::Object(fields) => fields
                    .get(segment)
                    .ok_or_else(|| field_not_found(path, segment))?,
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(|| field_not_found(path, segment))?,
                _ => return Err(field_not_found(path, segment)),
            };
        }
    }

    if node.is_null() {
        let last = path.rsplit('.').next().unwrap_or_default();
        return Err(null_traversal(path, last));
    }

    Ok(node)
}

/// Canonical text form of a resolved value as it appears inside a key.
///
/// Composites render as compact JSON with object keys sorted at every depth,
/// so equal maps give equal keys whatever order their entries were built in.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_owned(),
        composite => canonical(composite).to_string(),
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<_> = fields.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(name, field)| (name.clone(), canonical(field)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        scalar => scalar.clone(),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn field_not_found(path: &str, segment: &str) -> KeyError {
    KeyError::FieldNotFound {
        path: path.to_owned(),
        segment: segment.to_owned(),
    }
}

fn null_traversal(path: &str, segment: &str) -> KeyError {
    KeyError::NullTraversal {
        path: path.to_owned(),
        segment: segment.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_object() {
        let product = json!({ "id": 1, "detail": { "id": 2, "sku": "A-7" } });

        assert_eq!(resolve(&product, "id").map(render), Ok("1".to_owned()));
        assert_eq!(resolve(&product, "detail.id").map(render), Ok("2".to_owned()));
        assert_eq!(
            resolve(&product, " detail.sku ").map(render),
            Ok("A-7".to_owned())
        );
    }

    #[test]
    fn test_scalar_root_resolves_to_itself() {
        assert_eq!(resolve(&json!(42), ""), Ok(&json!(42)));
        assert_eq!(resolve(&json!("abc"), "b"), Ok(&json!("abc")));
        assert_eq!(resolve(&json!(true), "x.y"), Ok(&json!(true)));
    }

    #[test]
    fn test_sequence_index_segment() {
        let order = json!({ "lines": [{ "sku": "first" }, { "sku": "second" }] });
        assert_eq!(
            resolve(&order, "lines.1.sku").map(render),
            Ok("second".to_owned())
        );
        assert!(matches!(
            resolve(&order, "lines.2.sku"),
            Err(KeyError::FieldNotFound { segment, .. }) if segment == "2"
        ));
    }

    #[test]
    fn test_missing_field() {
        let user = json!({ "id": 7 });
        assert_eq!(
            resolve(&user, "name"),
            Err(KeyError::FieldNotFound {
                path: "name".to_owned(),
                segment: "name".to_owned(),
            })
        );

        // Descending into a scalar below the root is a missing field
        assert!(matches!(
            resolve(&user, "id.value"),
            Err(KeyError::FieldNotFound { segment, .. }) if segment == "value"
        ));
    }

    #[test]
    fn test_null_traversal() {
        let user = json!({ "profile": null, "nickname": null });

        assert_eq!(
            resolve(&user, "profile.email"),
            Err(KeyError::NullTraversal {
                path: "profile.email".to_owned(),
                segment: "email".to_owned(),
            })
        );
        assert!(matches!(
            resolve(&user, "nickname"),
            Err(KeyError::NullTraversal { .. })
        ));
        assert!(matches!(
            resolve(&Value::Null, "id"),
            Err(KeyError::NullTraversal { .. })
        ));
    }

    #[test]
    fn test_render_composites_as_compact_json() {
        assert_eq!(render(&json!({ "a": 1, "b": [1, 2] })), r#"{"a":1,"b":[1,2]}"#);
        assert_eq!(render(&json!("plain")), "plain");
        assert_eq!(render(&json!(2.5)), "2.5");
    }

    #[test]
    fn test_render_sorts_object_keys() {
        assert_eq!(
            render(&json!({ "z": 1, "a": { "y": 2, "b": 3 }, "m": [{ "k": 1, "c": 2 }] })),
            r#"{"a":{"b":3,"y":2},"m":[{"c":2,"k":1}],"z":1}"#
        );
    }

    #[test]
    fn test_equal_maps_render_identically() {
        use std::collections::HashMap;

        let forward: HashMap<String, u32> = (0..6).map(|i| (format!("f{i}"), i)).collect();
        let backward: HashMap<String, u32> = (0..6).rev().map(|i| (format!("f{i}"), i)).collect();
        assert_eq!(forward, backward);

        let forward = to_arguments(&(forward,)).expect("serializable");
        let backward = to_arguments(&(backward,)).expect("serializable");
        assert_eq!(render(&forward[0]), render(&backward[0]));
        assert_eq!(render(&forward[0]), r#"{"f0":0,"f1":1,"f2":2,"f3":3,"f4":4,"f5":5}"#);
    }

    #[test]
    fn test_to_arguments_from_tuples() {
        #[derive(Serialize)]
        struct User {
            id: u64,
        }

        assert_eq!(
            to_arguments(&(User { id: 42 },)).ok(),
            Some(vec![json!({ "id": 42 })])
        );
        assert_eq!(
            to_arguments(&("tenant", 3)).ok(),
            Some(vec![json!("tenant"), json!(3)])
        );
        assert_eq!(to_arguments(&()).ok(), Some(Vec::new()));
        assert_eq!(to_arguments(&"solo").ok(), Some(vec![json!("solo")]));
    }
}
