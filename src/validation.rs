// src/validation.rs
// The request validation pipeline (§4.3). Pure: given the same
// (schema, raw_args) it produces the same args or the same structured
// error (P3); never touches the database.
//
// Grounded structurally on the layered-fallback style of
// crates/mira-server/src/utils/json.rs (try something, fall back, then
// fail with a clear message), adapted here to produce typed errors rather
// than best-effort recovery.

use serde_json::{Map, Value};

use crate::catalog::schema::{ArgSchema, FieldType};
use crate::error::{AidisError, Result};

/// Run the full pipeline: normalize synonyms, then shape/required/type/
/// bounds checks, then apply defaults. Returns the validated argument
/// object.
pub fn validate(schema: &ArgSchema, raw_args: &Value) -> Result<Map<String, Value>> {
    let object = shape_check(raw_args)?;
    let normalized = normalize_synonyms(schema, object);
    required_field_check(schema, &normalized)?;
    type_check(schema, &normalized)?;
    bounds_check(schema, &normalized)?;
    Ok(apply_defaults(schema, normalized))
}

/// §4.3 step 2: the top-level value must be an object. Extra fields are
/// preserved, not rejected.
fn shape_check(raw_args: &Value) -> Result<Map<String, Value>> {
    match raw_args {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(AidisError::type_mismatch(
            "<root>",
            "object",
            value_type_name(other),
        )),
    }
}

/// §4.3 step 1: rewrite known aliases to canonical names. Never overwrites
/// an already-canonical field; if both are present, canonical wins and the
/// alias is discarded. Shallow (top-level only).
fn normalize_synonyms(schema: &ArgSchema, mut object: Map<String, Value>) -> Map<String, Value> {
    let mut renames = Vec::new();
    for key in object.keys() {
        if schema.field(key).is_some() {
            continue; // already canonical
        }
        if let Some(canonical) = schema.canonicalize(key) {
            renames.push((key.clone(), canonical));
        }
    }

    for (alias_key, canonical) in renames {
        let value = object.remove(&alias_key);
        if let Some(value) = value {
            if !object.contains_key(canonical) {
                object.insert(canonical.to_string(), value);
            }
            // else: canonical already present and wins; alias is discarded.
        }
    }

    object
}

/// §4.3 step 3.
fn required_field_check(schema: &ArgSchema, object: &Map<String, Value>) -> Result<()> {
    for field in &schema.fields {
        if field.required && !object.contains_key(field.name) {
            return Err(AidisError::validation(field.name, "missing"));
        }
    }
    Ok(())
}

/// §4.3 step 4: each present field is checked against its declared type.
fn type_check(schema: &ArgSchema, object: &Map<String, Value>) -> Result<()> {
    for field in &schema.fields {
        let Some(value) = object.get(field.name) else {
            continue;
        };
        check_field_type(field.name, &field.field_type, value)?;
    }
    Ok(())
}

fn check_field_type(name: &str, field_type: &FieldType, value: &Value) -> Result<()> {
    match field_type {
        FieldType::String { .. } => {
            if !value.is_string() {
                return Err(AidisError::type_mismatch(name, "string", value_type_name(value)));
            }
        }
        FieldType::Integer { .. } => {
            if !value.is_i64() && !value.is_u64() {
                return Err(AidisError::type_mismatch(name, "integer", value_type_name(value)));
            }
        }
        FieldType::Number { .. } => {
            if !value.is_number() {
                return Err(AidisError::type_mismatch(name, "number", value_type_name(value)));
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                return Err(AidisError::type_mismatch(name, "boolean", value_type_name(value)));
            }
        }
        FieldType::Enum { values } => {
            let Some(s) = value.as_str() else {
                return Err(AidisError::type_mismatch(name, "enum", value_type_name(value)));
            };
            if !values.contains(&s) {
                return Err(AidisError::type_mismatch(
                    name,
                    format!("one of {:?}", values),
                    s.to_string(),
                ));
            }
        }
        FieldType::Array { item, .. } => {
            let Some(arr) = value.as_array() else {
                return Err(AidisError::type_mismatch(name, "array", value_type_name(value)));
            };
            for (i, element) in arr.iter().enumerate() {
                check_field_type(&format!("{}[{}]", name, i), item, element)?;
            }
        }
        FieldType::Object => {
            if !value.is_object() {
                return Err(AidisError::type_mismatch(name, "object", value_type_name(value)));
            }
        }
    }
    Ok(())
}

/// §4.3 step 5: lengths, numeric ranges, array cardinalities.
fn bounds_check(schema: &ArgSchema, object: &Map<String, Value>) -> Result<()> {
    for field in &schema.fields {
        let Some(value) = object.get(field.name) else {
            continue;
        };
        check_field_bounds(field.name, &field.field_type, value)?;
    }
    Ok(())
}

fn check_field_bounds(name: &str, field_type: &FieldType, value: &Value) -> Result<()> {
    match field_type {
        FieldType::String { min_length, max_length } => {
            let s = value.as_str().unwrap_or_default();
            let len = s.chars().count();
            if let Some(min) = min_length {
                if len < *min {
                    return Err(bound_error(name, format!("length >= {}", min), len));
                }
            }
            if let Some(max) = max_length {
                if len > *max {
                    return Err(bound_error(name, format!("length <= {}", max), len));
                }
            }
        }
        FieldType::Integer { min, max } => {
            let n = value.as_i64().unwrap_or_default();
            if let Some(min) = min {
                if n < *min {
                    return Err(bound_error(name, format!(">= {}", min), n));
                }
            }
            if let Some(max) = max {
                if n > *max {
                    return Err(bound_error(name, format!("<= {}", max), n));
                }
            }
        }
        FieldType::Number { min, max } => {
            let n = value.as_f64().unwrap_or_default();
            if let Some(min) = min {
                if n < *min {
                    return Err(bound_error(name, format!(">= {}", min), n));
                }
            }
            if let Some(max) = max {
                if n > *max {
                    return Err(bound_error(name, format!("<= {}", max), n));
                }
            }
        }
        FieldType::Array { item, min_items, max_items } => {
            let arr = value.as_array().cloned().unwrap_or_default();
            if let Some(min) = min_items {
                if arr.len() < *min {
                    return Err(bound_error(name, format!(">= {} items", min), arr.len()));
                }
            }
            if let Some(max) = max_items {
                if arr.len() > *max {
                    return Err(bound_error(name, format!("<= {} items", max), arr.len()));
                }
            }
            for (i, element) in arr.iter().enumerate() {
                check_field_bounds(&format!("{}[{}]", name, i), item, element)?;
            }
        }
        FieldType::Boolean | FieldType::Enum { .. } | FieldType::Object => {}
    }
    Ok(())
}

fn bound_error(field: &str, bound: impl std::fmt::Display, got: impl std::fmt::Display) -> AidisError {
    AidisError::Validation {
        field: field.to_string(),
        reason: "out_of_bounds".to_string(),
        expected: Some(bound.to_string()),
        got: Some(got.to_string()),
    }
}

/// §4.3 step 6: defaults are applied last, after all checks pass.
fn apply_defaults(schema: &ArgSchema, mut object: Map<String, Value>) -> Map<String, Value> {
    for field in &schema.fields {
        if !object.contains_key(field.name) {
            if let Some(default) = &field.default {
                object.insert(field.name.to_string(), default.clone());
            }
        }
    }
    object
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn missing_required_field_fails_with_reason_missing() {
        let entry = catalog::lookup("context_store").expect("present");
        let raw = serde_json::json!({"content": "abc"});
        let err = validate(&entry.schema, &raw).unwrap_err();
        match err {
            AidisError::Validation { field, reason, .. } => {
                assert_eq!(field, "type");
                assert_eq!(reason, "missing");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn synonym_normalization_rewrites_aliases_to_canonical_names() {
        let entry = catalog::lookup("decision_record").expect("present");
        let raw = serde_json::json!({
            "title": "X",
            "problem": "Y",
            "decision": "Z",
            "reasoning": "because",
            "impact": "high",
            "decisionType": "architecture",
        });
        let args = validate(&entry.schema, &raw).expect("should validate");
        assert_eq!(args.get("rationale").and_then(|v| v.as_str()), Some("because"));
        assert_eq!(args.get("impactLevel").and_then(|v| v.as_str()), Some("high"));
        assert!(args.get("reasoning").is_none());
        assert!(args.get("impact").is_none());
    }

    #[test]
    fn canonical_field_wins_over_alias_when_both_present() {
        let entry = catalog::lookup("decision_record").expect("present");
        let raw = serde_json::json!({
            "title": "X",
            "problem": "Y",
            "decision": "Z",
            "rationale": "canonical-wins",
            "reasoning": "alias-loses",
            "impactLevel": "low",
            "decisionType": "architecture",
        });
        let args = validate(&entry.schema, &raw).expect("should validate");
        assert_eq!(
            args.get("rationale").and_then(|v| v.as_str()),
            Some("canonical-wins")
        );
    }

    #[test]
    fn running_validation_twice_yields_the_same_outcome() {
        let entry = catalog::lookup("context_search").expect("present");
        let raw = serde_json::json!({"query": "hello"});
        let first = validate(&entry.schema, &raw);
        let second = validate(&entry.schema, &raw);
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            _ => panic!("expected both to validate identically"),
        }
    }

    #[test]
    fn default_limit_applies_when_absent() {
        let entry = catalog::lookup("context_search").expect("present");
        let raw = serde_json::json!({"query": "hello"});
        let args = validate(&entry.schema, &raw).expect("should validate");
        assert_eq!(args.get("limit").and_then(|v| v.as_i64()), Some(10));
    }

    #[test]
    fn enum_mismatch_fails_type_check() {
        let entry = catalog::lookup("context_store").expect("present");
        let raw = serde_json::json!({"type": "not-a-real-type", "content": "abc"});
        let err = validate(&entry.schema, &raw).unwrap_err();
        assert!(matches!(err, AidisError::Validation { reason, .. } if reason == "type_mismatch"));
    }

    #[test]
    fn extra_fields_are_preserved_not_rejected() {
        let entry = catalog::lookup("aidis_ping").expect("present");
        let raw = serde_json::json!({"message": "hi", "extra": "metadata"});
        let args = validate(&entry.schema, &raw).expect("should validate");
        assert_eq!(args.get("extra").and_then(|v| v.as_str()), Some("metadata"));
    }
}
