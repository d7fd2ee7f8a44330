//! Date, Time and Datetime content.

use attrform_interchange::{AttributeContent, AttributeDescriptor, ContentType};
use serde_json::Value;

use super::{carry_reference, list_initial, list_serialize, ContentContext, ContentHandler, Control};
use crate::constraints::Validator;
use crate::error::CollectError;
use crate::paths::FieldPath;
use crate::temporal;
use crate::values::{first_text, scalar_text, FormState};

fn picker(descriptor: &AttributeDescriptor, control: Control) -> Control {
    if descriptor.is_list() {
        Control::Select {
            multi: descriptor.properties.multi_select,
        }
    } else {
        control
    }
}

fn text_initial(
    descriptor: &AttributeDescriptor,
    path: &FieldPath,
    content: &[AttributeContent],
    convert: impl Fn(&str) -> String,
) -> Vec<(String, Value)> {
    if descriptor.is_list() {
        return list_initial(descriptor, path, content);
    }
    content
        .first()
        .and_then(|c| scalar_text(&c.data))
        .map(|text| vec![(path.to_string(), Value::String(convert(&text)))])
        .unwrap_or_default()
}

/// Validate and pass a value through unchanged.
fn pass_through(
    descriptor: &AttributeDescriptor,
    path: &FieldPath,
    state: &FormState,
    content_type: ContentType,
    accepts: impl Fn(&str) -> bool,
) -> Result<Option<Vec<AttributeContent>>, CollectError> {
    if descriptor.is_list() {
        return Ok(list_serialize(path, state));
    }
    let Some(text) = first_text(state.get(path.as_str())) else {
        return Ok(None);
    };
    if !accepts(&text) {
        return Err(CollectError::TypeMismatch {
            name: descriptor.name.clone(),
            expected: content_type.to_string(),
            got: text,
        });
    }
    Ok(Some(vec![carry_reference(
        descriptor,
        AttributeContent::new(text.trim()),
    )]))
}

pub(crate) struct DateHandler;

impl ContentHandler for DateHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Date
    }

    fn control(&self, descriptor: &AttributeDescriptor) -> Control {
        picker(descriptor, Control::DatePicker)
    }

    fn input_validator(&self, descriptor: &AttributeDescriptor) -> Option<Validator> {
        (!descriptor.is_list()).then_some(Validator::Date)
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        text_initial(descriptor, path, content, str::to_string)
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        pass_through(descriptor, path, state, self.content_type(), |s| {
            temporal::parse_date(s).is_some()
        })
    }
}

pub(crate) struct TimeHandler;

impl ContentHandler for TimeHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Time
    }

    fn control(&self, descriptor: &AttributeDescriptor) -> Control {
        picker(descriptor, Control::TimePicker)
    }

    fn input_validator(&self, descriptor: &AttributeDescriptor) -> Option<Validator> {
        (!descriptor.is_list()).then_some(Validator::Time)
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        text_initial(descriptor, path, content, str::to_string)
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        pass_through(descriptor, path, state, self.content_type(), |s| {
            temporal::parse_time(s).is_some()
        })
    }
}

/// Local wall-clock in the form, UTC instants on the wire.
pub(crate) struct DatetimeHandler;

impl ContentHandler for DatetimeHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Datetime
    }

    fn control(&self, descriptor: &AttributeDescriptor) -> Control {
        picker(descriptor, Control::DateTimePicker)
    }

    fn input_validator(&self, descriptor: &AttributeDescriptor) -> Option<Validator> {
        (!descriptor.is_list()).then_some(Validator::DateTime)
    }

    fn initial_values(
        &self,
        ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        let zone = ctx.zone;
        text_initial(descriptor, path, content, |text| {
            temporal::parse_instant(text, zone)
                .and_then(|dt| temporal::to_local_input(dt, zone))
                .unwrap_or_else(|| text.to_string())
        })
    }

    fn serialize(
        &self,
        ctx: &ContentContext,
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
        let utc = temporal::normalize_datetime(&text, ctx.zone).ok_or_else(|| {
            CollectError::TypeMismatch {
                name: descriptor.name.clone(),
                expected: self.content_type().to_string(),
                got: text.clone(),
            }
        })?;
        Ok(Some(vec![carry_reference(descriptor, AttributeContent::new(utc))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::offset;

    fn descriptor(content_type: &str, content: Value) -> AttributeDescriptor {
        serde_json::from_value(json!({
            "uuid": "u",
            "name": "when",
            "type": "data",
            "contentType": content_type,
            "properties": { "label": "When" },
            "content": content
        }))
        .unwrap()
    }

    #[test]
    fn datetime_submits_utc_with_millis() {
        let d = descriptor("datetime", json!([]));
        let path = FieldPath::new("ns", "when");
        let ctx = ContentContext {
            zone: offset!(+2).into(),
        };
        let mut state = FormState::new();
        state.set(path.to_string(), json!("2017-06-01T08:30"));
        let out = DatetimeHandler.serialize(&ctx, &d, &path, &state).unwrap().unwrap();
        assert_eq!(out[0].data, json!("2017-06-01T06:30:00.000Z"));
    }

    #[test]
    fn datetime_default_loads_as_local_wall_clock() {
        let d = descriptor("datetime", json!([{ "data": "2017-06-01T06:30:00.000Z" }]));
        let path = FieldPath::new("ns", "when");
        let ctx = ContentContext {
            zone: offset!(+2).into(),
        };
        let values = DatetimeHandler.initial_values(&ctx, &d, &path, &d.default_content());
        assert_eq!(values, vec![(path.to_string(), json!("2017-06-01T08:30:00"))]);

        let mut state = FormState::new();
        for (k, v) in values {
            state.set(k, v);
        }
        let out = DatetimeHandler.serialize(&ctx, &d, &path, &state).unwrap().unwrap();
        assert_eq!(out[0].data, json!("2017-06-01T06:30:00.000Z"));
    }

    #[test]
    fn date_passes_through_and_rejects_garbage() {
        let d = descriptor("date", json!([]));
        let path = FieldPath::new("ns", "when");
        let ctx = ContentContext::default();
        let mut state = FormState::new();
        state.set(path.to_string(), json!("2024-02-29"));
        let out = DateHandler.serialize(&ctx, &d, &path, &state).unwrap().unwrap();
        assert_eq!(out[0].data, json!("2024-02-29"));

        state.set(path.to_string(), json!("29/02/2024"));
        assert!(DateHandler.serialize(&ctx, &d, &path, &state).is_err());
    }

    #[test]
    fn time_keeps_seconds_as_given() {
        let d = descriptor("time", json!([{ "data": "10:15" }]));
        let path = FieldPath::new("ns", "when");
        let ctx = ContentContext::default();
        let mut state = FormState::new();
        for (k, v) in TimeHandler.initial_values(&ctx, &d, &path, &d.default_content()) {
            state.set(k, v);
        }
        let out = TimeHandler.serialize(&ctx, &d, &path, &state).unwrap().unwrap();
        assert_eq!(out[0].data, json!("10:15"));
    }
}
