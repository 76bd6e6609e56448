//! Deep-partial subset matching
//!
//! Expected fields assert a subset of the response body: objects match
//! recursively on the declared keys only, arrays match element-wise with
//! equal length, scalars match on equality. Every mismatch is reported with
//! its instance path.

use serde_json::Value;

/// One expected-field mismatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    /// JSON pointer into the response body
    pub path: String,
    /// What went wrong
    pub detail: String,
}

/// Collect every place `expected` is not a deep-partial subset of `actual`
#[must_use]
pub fn partial_mismatches(expected: &Value, actual: &Value) -> Vec<FieldMismatch> {
    let mut mismatches = Vec::new();
    walk(expected, actual, "", &mut mismatches);
    mismatches
}

fn walk(expected: &Value, actual: &Value, path: &str, out: &mut Vec<FieldMismatch>) {
    match expected {
        Value::Object(exp) => {
            let Some(act) = actual.as_object() else {
                out.push(FieldMismatch {
                    path: root_or(path),
                    detail: format!("expected an object, got {}", type_name(actual)),
                });
                return;
            };
            for (key, exp_value) in exp {
                let child = format!("{path}/{key}");
                match act.get(key) {
                    Some(act_value) => walk(exp_value, act_value, &child, out),
                    None => out.push(FieldMismatch {
                        path: child,
                        detail: "missing field".to_string(),
                    }),
                }
            }
        }
        Value::Array(exp) => {
            let Some(act) = actual.as_array() else {
                out.push(FieldMismatch {
                    path: root_or(path),
                    detail: format!("expected an array, got {}", type_name(actual)),
                });
                return;
            };
            if exp.len() != act.len() {
                out.push(FieldMismatch {
                    path: root_or(path),
                    detail: format!("expected {} elements, got {}", exp.len(), act.len()),
                });
                return;
            }
            for (i, (e, a)) in exp.iter().zip(act).enumerate() {
                walk(e, a, &format!("{path}/{i}"), out);
            }
        }
        _ => {
            if expected != actual {
                out.push(FieldMismatch {
                    path: root_or(path),
                    detail: format!("expected {expected}, got {actual}"),
                });
            }
        }
    }
}

fn root_or(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render mismatches as one newline-joined block
#[must_use]
pub fn format_mismatches(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("{}: {}", m.path, m.detail))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn subset_of_larger_object_matches() {
        let expected = json!({"name": "s1", "config": {"enabled": true}});
        let actual = json!({
            "id": "abc",
            "name": "s1",
            "config": {"enabled": true, "interval": 30},
            "createdAt": "2026-01-01"
        });
        assert!(partial_mismatches(&expected, &actual).is_empty());
    }

    #[test]
    fn missing_field_is_reported_with_path() {
        let expected = json!({"config": {"enabled": true}});
        let actual = json!({"config": {}});
        let mismatches = partial_mismatches(&expected, &actual);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].path, "/config/enabled");
        assert_eq!(mismatches[0].detail, "missing field");
    }

    #[test]
    fn scalar_mismatch_shows_both_values() {
        let mismatches = partial_mismatches(&json!({"n": 1}), &json!({"n": 2}));
        assert_eq!(mismatches[0].detail, "expected 1, got 2");
    }

    #[test]
    fn array_length_must_match() {
        let mismatches = partial_mismatches(&json!([1, 2, 3]), &json!([1, 2]));
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].detail.contains("expected 3 elements"));
    }

    #[test]
    fn array_elements_match_partially() {
        let expected = json!([{"id": "a"}, {"id": "b"}]);
        let actual = json!([{"id": "a", "x": 1}, {"id": "b", "y": 2}]);
        assert!(partial_mismatches(&expected, &actual).is_empty());
    }

    #[test]
    fn type_mismatch_at_root() {
        let mismatches = partial_mismatches(&json!({"a": 1}), &json!([1]));
        assert_eq!(mismatches[0].path, "(root)");
        assert!(mismatches[0].detail.contains("expected an object"));
    }

    #[test]
    fn multiple_mismatches_all_collected() {
        let expected = json!({"a": 1, "b": {"c": "x"}});
        let actual = json!({"a": 2, "b": {}});
        let mismatches = partial_mismatches(&expected, &actual);
        assert_eq!(mismatches.len(), 2);

        let formatted = format_mismatches(&mismatches);
        assert!(formatted.contains("/a: expected 1, got 2"));
        assert!(formatted.contains("/b/c: missing field"));
    }

    #[test]
    fn null_expected_matches_only_null() {
        assert!(partial_mismatches(&json!({"a": null}), &json!({"a": null})).is_empty());
        assert_eq!(
            partial_mismatches(&json!({"a": null}), &json!({"a": 1})).len(),
            1
        );
    }
}
