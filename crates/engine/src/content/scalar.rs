//! String, Text, Integer, Float and Boolean content.

use attrform_interchange::{AttributeContent, AttributeDescriptor, ContentType};
use serde_json::Value;

use super::{carry_reference, list_initial, list_serialize, ContentContext, ContentHandler, Control};
use crate::constraints::Validator;
use crate::error::CollectError;
use crate::paths::FieldPath;
use crate::values::{first_text, scalar_text, unwrap_scalars, FormState};

pub(crate) struct TextHandler {
    pub(crate) multiline: bool,
}

impl ContentHandler for TextHandler {
    fn content_type(&self) -> ContentType {
        if self.multiline {
            ContentType::Text
        } else {
            ContentType::String
        }
    }

    fn control(&self, descriptor: &AttributeDescriptor) -> Control {
        if descriptor.is_list() {
            Control::Select {
                multi: descriptor.properties.multi_select,
            }
        } else if self.multiline {
            Control::TextArea
        } else {
            Control::TextInput
        }
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        if descriptor.is_list() {
            return list_initial(descriptor, path, content);
        }
        content
            .first()
            .and_then(|c| scalar_text(&c.data))
            .map(|text| vec![(path.to_string(), Value::String(text))])
            .unwrap_or_default()
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        if descriptor.is_list() {
            return Ok(list_serialize(path, state));
        }
        Ok(first_text(state.get(path.as_str()))
            .map(|text| vec![carry_reference(descriptor, AttributeContent::new(text))]))
    }
}

pub(crate) struct NumberHandler {
    pub(crate) integer: bool,
}

impl NumberHandler {
    /// Validated text of the field, trimmed.
    fn check<'a>(&self, name: &str, text: &'a str) -> Result<&'a str, CollectError> {
        let text = text.trim();
        let valid = if self.integer {
            text.parse::<i64>().is_ok()
        } else {
            text.parse::<f64>().is_ok_and(f64::is_finite)
        };
        if valid {
            Ok(text)
        } else {
            Err(CollectError::TypeMismatch {
                name: name.to_string(),
                expected: self.content_type().to_string(),
                got: text.to_string(),
            })
        }
    }

    /// Content data for validated text.
    ///
    /// Numbers travel as strings; a JSON number is emitted only when the
    /// descriptor's own default content holds one.
    fn data(&self, descriptor: &AttributeDescriptor, text: &str) -> Value {
        let numeric_default = descriptor
            .default_content()
            .first()
            .is_some_and(|c| c.data.is_number());
        if numeric_default {
            if let Ok(number) = text.parse::<serde_json::Number>() {
                return Value::Number(number);
            }
        }
        Value::String(text.to_string())
    }
}

impl ContentHandler for NumberHandler {
    fn content_type(&self) -> ContentType {
        if self.integer {
            ContentType::Integer
        } else {
            ContentType::Float
        }
    }

    fn control(&self, descriptor: &AttributeDescriptor) -> Control {
        if descriptor.is_list() {
            Control::Select {
                multi: descriptor.properties.multi_select,
            }
        } else {
            Control::NumberInput {
                integer: self.integer,
            }
        }
    }

    fn input_validator(&self, descriptor: &AttributeDescriptor) -> Option<Validator> {
        if descriptor.is_list() {
            return None;
        }
        Some(if self.integer {
            Validator::Integer
        } else {
            Validator::Float
        })
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        if descriptor.is_list() {
            return list_initial(descriptor, path, content);
        }
        content
            .first()
            .and_then(|c| scalar_text(&c.data))
            .map(|text| vec![(path.to_string(), Value::String(text))])
            .unwrap_or_default()
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        if descriptor.is_list() {
            return Ok(list_serialize(path, state));
        }
        let Some(text) = first_text(state.get(path.as_str())) else {
            return Ok(None);
        };
        let text = self.check(&descriptor.name, &text)?;
        Ok(Some(vec![carry_reference(
            descriptor,
            AttributeContent::new(self.data(descriptor, text)),
        )]))
    }
}

pub(crate) struct BooleanHandler;

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

impl ContentHandler for BooleanHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Boolean
    }

    fn control(&self, _descriptor: &AttributeDescriptor) -> Control {
        Control::Checkbox
    }

    fn always_present(&self) -> bool {
        true
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        _descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        content
            .first()
            .and_then(|c| as_bool(&c.data))
            .map(|b| vec![(path.to_string(), Value::Bool(b))])
            .unwrap_or_default()
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        let checked = state
            .get(path.as_str())
            .map(unwrap_scalars)
            .and_then(|s| s.first().and_then(as_bool))
            .unwrap_or(false);
        Ok(Some(vec![carry_reference(
            descriptor,
            AttributeContent::new(checked),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(content_type: &str, extra: Value) -> AttributeDescriptor {
        let mut base = json!({
            "uuid": "u",
            "name": "field",
            "type": "data",
            "contentType": content_type,
            "properties": { "label": "Field" }
        });
        if let (Some(obj), Some(more)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in more {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn path() -> FieldPath {
        FieldPath::new("ns", "field")
    }

    fn round_trip(handler: &NumberHandler, d: &AttributeDescriptor) -> Vec<AttributeContent> {
        let ctx = ContentContext::default();
        let mut state = FormState::new();
        for (k, v) in handler.initial_values(&ctx, d, &path(), &d.default_content()) {
            state.set(k, v);
        }
        handler.serialize(&ctx, d, &path(), &state).unwrap().unwrap()
    }

    #[test]
    fn integer_default_keeps_its_string_form() {
        let d = descriptor("integer", json!({ "content": [{ "data": "42" }] }));
        assert_eq!(
            round_trip(&NumberHandler { integer: true }, &d),
            vec![AttributeContent::new("42")]
        );
    }

    #[test]
    fn numeric_default_round_trips_as_number() {
        let d = descriptor("integer", json!({ "content": [{ "data": 42 }] }));
        assert_eq!(
            round_trip(&NumberHandler { integer: true }, &d),
            vec![AttributeContent::new(42)]
        );
    }

    #[test]
    fn float_default_keeps_trailing_zeros() {
        let d = descriptor("float", json!({ "content": [{ "data": "1.50" }] }));
        assert_eq!(
            round_trip(&NumberHandler { integer: false }, &d),
            vec![AttributeContent::new("1.50")]
        );
    }

    #[test]
    fn integer_rejects_fraction_at_collection() {
        let d = descriptor("integer", json!({}));
        let mut state = FormState::new();
        state.set(path().to_string(), json!("1.5"));
        let err = NumberHandler { integer: true }
            .serialize(&ContentContext::default(), &d, &path(), &state)
            .unwrap_err();
        assert!(matches!(err, CollectError::TypeMismatch { .. }));
    }

    #[test]
    fn float_input_is_trimmed_and_kept_as_text() {
        let d = descriptor("float", json!({}));
        let handler = NumberHandler { integer: false };
        let mut state = FormState::new();
        state.set(path().to_string(), json!(" 3.0 "));
        let out = handler
            .serialize(&ContentContext::default(), &d, &path(), &state)
            .unwrap()
            .unwrap();
        assert_eq!(out[0].data, json!("3.0"));

        state.set(path().to_string(), json!("NaN"));
        assert!(handler
            .serialize(&ContentContext::default(), &d, &path(), &state)
            .is_err());
    }

    #[test]
    fn untouched_boolean_serializes_false() {
        let d = descriptor("boolean", json!({}));
        let out = BooleanHandler
            .serialize(&ContentContext::default(), &d, &path(), &FormState::new())
            .unwrap();
        assert_eq!(out, Some(vec![AttributeContent::new(false)]));
    }

    #[test]
    fn text_keeps_default_reference() {
        let d = descriptor(
            "string",
            json!({ "content": [{ "data": "abc", "reference": "ABC" }] }),
        );
        let handler = TextHandler { multiline: false };
        let ctx = ContentContext::default();
        let mut state = FormState::new();
        for (k, v) in handler.initial_values(&ctx, &d, &path(), &d.default_content()) {
            state.set(k, v);
        }
        let out = handler.serialize(&ctx, &d, &path(), &state).unwrap().unwrap();
        assert_eq!(out, vec![AttributeContent::with_reference("abc", "ABC")]);
    }

    #[test]
    fn empty_text_is_absent() {
        let d = descriptor("text", json!({}));
        let mut state = FormState::new();
        state.set(path().to_string(), json!(""));
        let out = TextHandler { multiline: true }
            .serialize(&ContentContext::default(), &d, &path(), &state)
            .unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn list_text_renders_as_select() {
        let d = descriptor("string", json!({ "properties": { "label": "L", "list": true, "multiSelect": true } }));
        assert_eq!(
            TextHandler { multiline: false }.control(&d),
            Control::Select { multi: true }
        );
    }
}
