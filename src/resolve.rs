//! Attribute resolution across sources
//!
//! Walks candidate records in priority order and returns the first field
//! value that renders to non-empty display text.

use std::collections::BTreeMap;

use crate::constants::{DISPLAY_PROBE_KEYS, LIST_SEPARATOR};
use crate::models::{FieldValue, FlatRecord, MergeError};

/// Render a value as human-readable text, or `None` when it is empty.
///
/// Lists render element-wise and join with `"; "`. Maps are probed for the
/// usual display properties (`displayName`, `name`, ...) before falling
/// back to their JSON text.
pub fn display_text(value: &FieldValue) -> Option<String> {
    let text = match value {
        FieldValue::Null => return None,
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => items
            .iter()
            .filter_map(display_text)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        FieldValue::Map(map) if map.is_empty() => return None,
        FieldValue::Map(map) => match probe_display_property(map) {
            Some(text) => text,
            None => value.to_string(),
        },
        FieldValue::Bool(_) | FieldValue::Number(_) => value.to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn probe_display_property(map: &BTreeMap<String, FieldValue>) -> Option<String> {
    DISPLAY_PROBE_KEYS.iter().find_map(|probe| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(probe))
            .and_then(|(_, value)| display_text(value))
    })
}

/// Return the first non-empty display value found by walking `sources` in
/// order and, for each, `fields` in order.
///
/// Absent sources (`None`) are skipped. Calling this without any candidate
/// field is a programming error and is reported as
/// [`MergeError::EmptyCandidateList`].
pub fn resolve(
    sources: &[Option<&FlatRecord>],
    fields: &[&str],
) -> Result<Option<String>, MergeError> {
    if fields.is_empty() {
        return Err(MergeError::EmptyCandidateList);
    }

    let found = sources.iter().flatten().find_map(|record| {
        fields
            .iter()
            .find_map(|field| record.get(field).and_then(display_text))
    });

    Ok(found)
}
