//! Raw form state and the shapes values take inside it.
//!
//! Form values are untyped JSON: text inputs hold strings, checkboxes hold
//! booleans, selects hold `{label, value}` options whose `value` is an
//! [`AttributeContent`], and multi-selects hold an ordered array of
//! options. The helpers here normalize between those shapes.

use attrform_interchange::AttributeContent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::paths::{FieldPath, ATTRIBUTE_PREFIX};

/// Raw form state keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<String, Value>);

impl FormState {
    pub fn new() -> Self {
        FormState::default()
    }

    /// Build form state from a JSON object.
    ///
    /// Keys may be flat (`__attributes__ns__.name`) or grouped one level
    /// under the namespace key (`{"__attributes__ns__": {"name": …}}`).
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut state = FormState::new();
        for (key, v) in obj {
            let grouped = key.starts_with(ATTRIBUTE_PREFIX) && key.ends_with("__") && !key.contains("__.");
            match (grouped, v) {
                (true, Value::Object(fields)) => {
                    for (field, fv) in fields {
                        state.set(format!("{}.{}", key, field), fv.clone());
                    }
                }
                _ => state.set(key.clone(), v.clone()),
            }
        }
        Some(state)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Remove a field and every sub-field it owns.
    pub fn remove_field(&mut self, path: &FieldPath) -> usize {
        let before = self.0.len();
        self.0.retain(|k, _| !path.owns(k));
        before - self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Select option wrapping one content entry.
pub fn option_value(content: &AttributeContent) -> Value {
    serde_json::json!({
        "label": content.display_label(),
        "value": content,
    })
}

/// Whether an object is a select option `{label, value}`.
pub fn is_option(obj: &serde_json::Map<String, Value>) -> bool {
    obj.contains_key("label") && obj.contains_key("value")
}

/// Content carried by a select option, a bare content object, or a raw value.
pub fn content_from_value(value: &Value) -> Option<AttributeContent> {
    match value {
        Value::Null => None,
        Value::Object(obj) if is_option(obj) => content_from_value(&obj["value"]),
        Value::Object(obj) if obj.contains_key("data") => {
            serde_json::from_value(value.clone()).ok()
        }
        other => Some(AttributeContent::new(other.clone())),
    }
}

/// Ordered contents of a single- or multi-select value.
pub fn selected_contents(value: &Value) -> Vec<AttributeContent> {
    match value {
        Value::Array(items) => items.iter().filter_map(content_from_value).collect(),
        other => content_from_value(other).into_iter().collect(),
    }
}

/// Canonical scalars inside a raw value.
///
/// Accepts a bare scalar, a content object `{data}`, a select option
/// `{label, value}`, or arrays of those. Empty strings and nulls count as
/// absent. Objects without a recognised wrapper are returned whole.
pub fn unwrap_scalars(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => vec![],
        Value::String(s) if s.is_empty() => vec![],
        Value::Array(items) => items.iter().flat_map(unwrap_scalars).collect(),
        Value::Object(obj) if is_option(obj) => unwrap_scalars(&obj["value"]),
        Value::Object(obj) if obj.contains_key("data") => unwrap_scalars(&obj["data"]),
        other => vec![other.clone()],
    }
}

/// Text form of a scalar.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First scalar of a raw value as text.
pub fn first_text(value: Option<&Value>) -> Option<String> {
    value
        .map(unwrap_scalars)
        .and_then(|s| s.into_iter().next())
        .and_then(|s| scalar_text(&s))
        .filter(|s| !s.is_empty())
}
