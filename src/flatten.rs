//! Flattening of nested source payloads into dotted attribute maps
//!
//! Every raw device object returned by a source becomes one [`FlatRecord`]
//! whose keys carry the source prefix, e.g. `Sophos.health.overall`.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::constants::LIST_SEPARATOR;
use crate::models::{FieldValue, FlatRecord, Source};

/// Options controlling how payloads are flattened
#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    /// Property names treated as string-keyed dictionaries: their entries are
    /// emitted one level deep and never recursed into
    pub dictionary_properties: Vec<String>,
}

impl FlattenOptions {
    fn is_dictionary(&self, name: &str) -> bool {
        self.dictionary_properties
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
    }
}

/// Flatten one raw payload under the source's prefix
pub fn flatten(raw: &Value, source: Source, options: &FlattenOptions) -> FlatRecord {
    let mut fields = HashMap::new();

    match raw {
        Value::Object(map) => flatten_object(map, source.prefix(), options, &mut fields),
        Value::Array(items) => {
            fields.insert(source.prefix().to_string(), join_sequence(items));
        }
        scalar => {
            fields.insert(source.prefix().to_string(), FieldValue::from(scalar));
        }
    }

    FlatRecord::new(source, fields)
}

fn flatten_object(
    map: &Map<String, Value>,
    prefix: &str,
    options: &FlattenOptions,
    out: &mut HashMap<String, FieldValue>,
) {
    for (name, value) in map {
        let key = format!("{}.{}", prefix, name);
        match value {
            Value::Null => {
                out.insert(key, FieldValue::Null);
            }
            Value::Object(entries) if options.is_dictionary(name) => {
                for (entry_key, entry_value) in entries {
                    out.insert(format!("{}.{}", key, entry_key), FieldValue::from(entry_value));
                }
            }
            Value::Object(inner) => flatten_object(inner, &key, options, out),
            Value::Array(items) => {
                out.insert(key, join_sequence(items));
            }
            scalar => {
                out.insert(key, FieldValue::from(scalar));
            }
        }
    }
}

/// Join a sequence into one string. Elements that are themselves objects or
/// arrays have no scalar form, in which case the whole sequence falls back
/// to its raw JSON text.
fn join_sequence(items: &[Value]) -> FieldValue {
    let parts: Option<Vec<String>> = items.iter().map(element_text).collect();
    match parts {
        Some(parts) => FieldValue::Text(parts.join(LIST_SEPARATOR)),
        None => FieldValue::Text(Value::Array(items.to_vec()).to_string()),
    }
}

fn element_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
