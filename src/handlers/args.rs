// src/handlers/args.rs
// Small accessors over an already-validated argument map. The pipeline in
// validation.rs has already checked presence, type, and bounds by the
// time a handler runs; these just do the final serde_json::Value -> typed
// conversion, turning an impossible-after-validation mismatch into an
// error rather than unwrap()ing.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AidisError, Result};

pub fn get_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AidisError::validation(key, "missing"))
}

pub fn get_opt_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

pub fn get_i64(args: &Map<String, Value>, key: &str, default: i64) -> i64 {
    args.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

pub fn get_opt_string_vec(args: &Map<String, Value>, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

pub fn get_uuid(args: &Map<String, Value>, key: &str) -> Result<Uuid> {
    let s = get_str(args, key)?;
    Uuid::parse_str(s).map_err(|_| AidisError::validation(key, "not a valid uuid"))
}

pub fn get_opt_uuid(args: &Map<String, Value>, key: &str) -> Result<Option<Uuid>> {
    match get_opt_str(args, key) {
        Some(s) => Ok(Some(
            Uuid::parse_str(s).map_err(|_| AidisError::validation(key, "not a valid uuid"))?,
        )),
        None => Ok(None),
    }
}

pub fn get_uuid_vec(args: &Map<String, Value>, key: &str) -> Result<Vec<Uuid>> {
    let Some(arr) = args.get(key).and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };
    arr.iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| AidisError::type_mismatch(key, "string", "non-string array element"))
                .and_then(|s| Uuid::parse_str(s).map_err(|_| AidisError::validation(key, "not a valid uuid")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_uuid_vec_is_empty_when_field_absent() {
        let args = Map::new();
        assert_eq!(get_uuid_vec(&args, "dependsOn").unwrap(), Vec::new());
    }

    #[test]
    fn get_uuid_rejects_malformed_strings() {
        let mut args = Map::new();
        args.insert("decisionId".to_string(), Value::String("not-a-uuid".to_string()));
        assert!(get_uuid(&args, "decisionId").is_err());
    }
}
