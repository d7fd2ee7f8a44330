//! Content-type dispatch.
//!
//! Each content type has one [`ContentHandler`] that decides which control
//! renders it, how wire content becomes form values, which type check runs
//! on input, and how form values become wire content again. Handlers are
//! registered in a single table; [`handler_for`] is the only lookup.

mod composite;
mod datetime;
mod reference;
mod scalar;

use attrform_interchange::{AttributeContent, AttributeDescriptor, ContentType};
use serde::Serialize;
use serde_json::Value;

use crate::constraints::Validator;
use crate::error::CollectError;
use crate::paths::FieldPath;
use crate::temporal::LocalZone;
use crate::values::{option_value, selected_contents, FormState};

/// Input control a host should render for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Control {
    TextInput,
    TextArea,
    NumberInput { integer: bool },
    Checkbox,
    DatePicker,
    TimePicker,
    DateTimePicker,
    FileDrop,
    Select { multi: bool },
    Password,
    CodeEditor,
    /// Read-only display of Info content.
    Info,
    /// Container for callback-injected descriptors.
    Group,
}

/// Per-editor settings handlers need.
///
/// The default reads wall-clock values in the host time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentContext {
    pub zone: LocalZone,
}

/// Render, validate and serialize rules for one content type.
pub trait ContentHandler: Sync {
    fn content_type(&self) -> ContentType;

    fn control(&self, descriptor: &AttributeDescriptor) -> Control;

    /// Every form path this field writes.
    fn paths(&self, path: &FieldPath) -> Vec<String> {
        vec![path.to_string()]
    }

    /// Path whose value required and constraint checks look at.
    fn value_path(&self, path: &FieldPath) -> String {
        path.to_string()
    }

    /// Type check for raw input, run before constraints.
    fn input_validator(&self, _descriptor: &AttributeDescriptor) -> Option<Validator> {
        None
    }

    /// Whether the field always has a value (checkboxes).
    fn always_present(&self) -> bool {
        false
    }

    /// Form values materialized from wire content.
    fn initial_values(
        &self,
        ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)>;

    /// Wire content for the current form state; `None` when absent.
    fn serialize(
        &self,
        ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError>;
}

static STRING: scalar::TextHandler = scalar::TextHandler { multiline: false };
static TEXT: scalar::TextHandler = scalar::TextHandler { multiline: true };
static INTEGER: scalar::NumberHandler = scalar::NumberHandler { integer: true };
static FLOAT: scalar::NumberHandler = scalar::NumberHandler { integer: false };
static BOOLEAN: scalar::BooleanHandler = scalar::BooleanHandler;
static DATE: datetime::DateHandler = datetime::DateHandler;
static TIME: datetime::TimeHandler = datetime::TimeHandler;
static DATETIME: datetime::DatetimeHandler = datetime::DatetimeHandler;
static FILE: composite::FileHandler = composite::FileHandler;
static SECRET: composite::SecretHandler = composite::SecretHandler;
static CODEBLOCK: composite::CodeblockHandler = composite::CodeblockHandler;
static CREDENTIAL: reference::ReferenceHandler = reference::ReferenceHandler { credential: true };
static OBJECT: reference::ReferenceHandler = reference::ReferenceHandler { credential: false };

static CONTENT_HANDLERS: [&dyn ContentHandler; 13] = [
    &STRING,
    &TEXT,
    &INTEGER,
    &FLOAT,
    &BOOLEAN,
    &DATE,
    &TIME,
    &DATETIME,
    &FILE,
    &OBJECT,
    &CREDENTIAL,
    &SECRET,
    &CODEBLOCK,
];

/// Handler for a content type; `None` for unknown tags.
pub fn handler_for(content_type: &ContentType) -> Option<&'static dyn ContentHandler> {
    CONTENT_HANDLERS
        .iter()
        .copied()
        .find(|h| h.content_type() == *content_type)
}

// ──────────────────────────────────────────────
// Shared helpers
// ──────────────────────────────────────────────

/// Select value for list descriptors: one option, or an ordered array when
/// multi-select.
pub(crate) fn list_initial(
    descriptor: &AttributeDescriptor,
    path: &FieldPath,
    content: &[AttributeContent],
) -> Vec<(String, Value)> {
    if content.is_empty() {
        return vec![];
    }
    let value = if descriptor.properties.multi_select {
        Value::Array(content.iter().map(option_value).collect())
    } else {
        option_value(&content[0])
    };
    vec![(path.to_string(), value)]
}

/// Selected contents of a select field, in UI order.
pub(crate) fn list_serialize(path: &FieldPath, state: &FormState) -> Option<Vec<AttributeContent>> {
    let contents = state
        .get(path.as_str())
        .map(selected_contents)
        .unwrap_or_default();
    (!contents.is_empty()).then_some(contents)
}

/// Copy the reference of a matching default content entry.
pub(crate) fn carry_reference(
    descriptor: &AttributeDescriptor,
    mut content: AttributeContent,
) -> AttributeContent {
    if content.reference.is_none() {
        content.reference = descriptor
            .default_content()
            .into_iter()
            .find(|d| d.data == content.data)
            .and_then(|d| d.reference);
    }
    content
}
