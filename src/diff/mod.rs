//! Configuration diff and merge.
//!
//! Two pure functions back the edit and duplicate flows:
//!
//! - [`diff`] - top-level keys of the current configuration that changed
//!   against the baseline (the PATCH payload of an edit)
//! - [`merge_for_duplicate`] - source connector values overlaid with the
//!   non-empty values the user entered
//!
//! Neither function fails. A missing baseline or source is an empty mapping.

use crate::connector::Configuration;
use serde_json::Value;


/// Returns true for values that mean "unset": `null`, `""`, `{}` and `[]`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(m) => m.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(m) if m.is_empty())
}

fn is_empty_string(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

/// Keys of `current` that must be sent in an update.
///
/// A key is included when the baseline lacks it or holds a different value,
/// except when the current value is `""` (explicitly blanked) or the baseline
/// value is `{}` (no prior value). A `null` on both sides is unchanged. Keys
/// only present in the baseline are never returned: deletions are not sent.
///
/// Keys are returned in the iteration order of `current`.
pub fn changed_keys<'a>(
    current: &'a Configuration,
    baseline: Option<&Configuration>,
) -> Vec<&'a str> {
    current
        .iter()
        .filter(|(key, value)| {
            if is_empty_string(value) {
                return false;
            }
            match baseline.and_then(|b| b.get(key.as_str())) {
                None => true,
                Some(old) if is_empty_object(old) => false,
                Some(old) => old != *value,
            }
        })
        .map(|(key, _)| key.as_str())
        .collect()
}

/// Partial payload holding only the changed keys of `current`.
pub fn diff(current: &Configuration, baseline: Option<&Configuration>) -> Configuration {
    changed_keys(current, baseline)
        .into_iter()
        .filter_map(|key| current.get(key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Overlays the user's non-empty values onto the duplicate source.
///
/// Empty top-level user values fall back to the source. Nested objects are
/// merged key by key; arrays and scalars from the user replace the source
/// value wholesale.
pub fn merge_for_duplicate(
    user_entered: &Configuration,
    source_defaults: Option<&Configuration>,
) -> Configuration {
    let mut merged = source_defaults.cloned().unwrap_or_default();
    for (key, value) in user_entered {
        if is_empty_value(value) {
            continue;
        }
        match merged.get_mut(key) {
            Some(base) => deep_merge(base, value),
            None => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Merges `overlay` into `base` in place.
///
/// Objects merge recursively; any other overlay value replaces `base`.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}
