// src/catalog/schema.rs
// The structured argument schema type from §4.3: each field's canonical
// name, type, required-ness, and an optional description for
// introspection.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Enum {
        values: Vec<&'static str>,
    },
    Array {
        item: Box<FieldType>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object,
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::String {
            min_length: None,
            max_length: None,
        }
    }

    pub fn bounded_string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        FieldType::String {
            min_length,
            max_length,
        }
    }

    pub fn integer() -> Self {
        FieldType::Integer { min: None, max: None }
    }

    pub fn bounded_integer(min: Option<i64>, max: Option<i64>) -> Self {
        FieldType::Integer { min, max }
    }

    pub fn string_array() -> Self {
        FieldType::Array {
            item: Box::new(FieldType::string()),
            min_items: None,
            max_items: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Integer { .. } => "integer",
            FieldType::Number { .. } => "number",
            FieldType::Boolean => "boolean",
            FieldType::Enum { .. } => "enum",
            FieldType::Array { .. } => "array",
            FieldType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub description: &'static str,
    /// Aliases that normalize to this field's canonical name (§4.3 step 1).
    pub aliases: &'static [&'static str],
    /// A default JSON value applied when the field is absent (§4.3 step 6).
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArgSchema {
    pub fields: Vec<FieldSpec>,
}

impl ArgSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, canonical_name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == canonical_name)
    }

    /// Resolve an alias (or canonical name) to its canonical field name.
    pub fn canonicalize(&self, key: &str) -> Option<&'static str> {
        for field in &self.fields {
            if field.name == key {
                return Some(field.name);
            }
        }
        for field in &self.fields {
            if field.aliases.contains(&key) {
                return Some(field.name);
            }
        }
        None
    }
}
