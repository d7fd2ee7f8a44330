//! Typed structs representing the attribute interchange JSON.
//!
//! Descriptor-level fields are fully typed. Content payloads (`data`) are
//! stored as `serde_json::Value` because their shape depends on the owning
//! descriptor's content type, which only the engine interprets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Attribute type ──────────────────────────────────────────────────

/// Kind of attribute declared by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    Data,
    Info,
    Group,
    Custom,
}

impl AttributeType {
    /// Data and Custom attributes carry user values. Info and Group are
    /// display-only and never appear in outbound requests.
    pub fn is_collectible(self) -> bool {
        matches!(self, AttributeType::Data | AttributeType::Custom)
    }
}

// ── Content type ────────────────────────────────────────────────────

/// Content type tag of a descriptor.
///
/// Unrecognised tags are kept as [`ContentType::Unknown`] instead of failing
/// deserialization so that a single unsupported field cannot abort a form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Time,
    Datetime,
    File,
    Object,
    Credential,
    Secret,
    Codeblock,
    Unknown(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::String => "string",
            ContentType::Text => "text",
            ContentType::Integer => "integer",
            ContentType::Float => "float",
            ContentType::Boolean => "boolean",
            ContentType::Date => "date",
            ContentType::Time => "time",
            ContentType::Datetime => "datetime",
            ContentType::File => "file",
            ContentType::Object => "object",
            ContentType::Credential => "credential",
            ContentType::Secret => "secret",
            ContentType::Codeblock => "codeblock",
            ContentType::Unknown(tag) => tag,
        }
    }
}

impl From<String> for ContentType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "string" => ContentType::String,
            "text" => ContentType::Text,
            "integer" => ContentType::Integer,
            "float" => ContentType::Float,
            "boolean" => ContentType::Boolean,
            "date" => ContentType::Date,
            "time" => ContentType::Time,
            "datetime" => ContentType::Datetime,
            "file" => ContentType::File,
            "object" => ContentType::Object,
            "credential" => ContentType::Credential,
            "secret" => ContentType::Secret,
            "codeblock" => ContentType::Codeblock,
            _ => ContentType::Unknown(tag),
        }
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self {
        ct.as_str().to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Properties ──────────────────────────────────────────────────────

fn default_visible() -> bool {
    true
}

/// Presentation and cardinality flags of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeProperties {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    /// Value is picked from a list of options.
    #[serde(default)]
    pub list: bool,
    /// More than one option may be picked (implies `list`).
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Default for AttributeProperties {
    fn default() -> Self {
        AttributeProperties {
            label: String::new(),
            visible: true,
            required: false,
            read_only: false,
            list: false,
            multi_select: false,
            group: None,
        }
    }
}

// ── Content ─────────────────────────────────────────────────────────

/// One content entry: a payload plus an optional human reference.
///
/// `data` is a scalar for String/Text/Integer/Float/Boolean/Date/Time/
/// Datetime and a structured object for File, Credential, Secret,
/// Codeblock and Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeContent {
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl AttributeContent {
    pub fn new(data: impl Into<serde_json::Value>) -> Self {
        AttributeContent {
            data: data.into(),
            reference: None,
        }
    }

    pub fn with_reference(data: impl Into<serde_json::Value>, reference: &str) -> Self {
        AttributeContent {
            data: data.into(),
            reference: Some(reference.to_string()),
        }
    }

    /// Label shown for this content when offered as an option.
    pub fn display_label(&self) -> String {
        if let Some(ref r) = self.reference {
            return r.clone();
        }
        match &self.data {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(obj) => obj
                .get("name")
                .and_then(|n| n.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| self.data.to_string()),
            other => other.to_string(),
        }
    }
}

// ── Constraints ─────────────────────────────────────────────────────

/// Constraint kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintType {
    Range,
    #[serde(alias = "regexp")]
    RegExp,
    DateTime,
}

/// A declarative constraint on a descriptor's value.
///
/// `data` is `{from?, to?}` for Range and DateTime, and a pattern string
/// for RegExp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ── Callbacks ───────────────────────────────────────────────────────

/// Where a mapping's resolved value is placed in the callback request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallbackTarget {
    PathVariable,
    RequestParameter,
    Body,
}

/// Maps one source (another field or a literal) to a callback parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackMapping {
    /// Source field: `attributeName` or `attributeName.path.into.data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default)]
    pub targets: Vec<CallbackTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl CallbackMapping {
    /// A mapping with neither a source field nor a literal cannot be resolved.
    pub fn is_unset(&self) -> bool {
        self.from.is_none() && self.value.is_none()
    }
}

/// Remote callback wiring of a descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeCallback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_method: Option<String>,
    #[serde(default)]
    pub mappings: Vec<CallbackMapping>,
}

// ── Descriptor ──────────────────────────────────────────────────────

/// A server-declared schema entry describing one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub content_type: ContentType,
    #[serde(default)]
    pub properties: AttributeProperties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Default content, option list, or (for Group attributes) nested
    /// descriptors. Kept raw because the shape depends on the type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_callback: Option<AttributeCallback>,
}

impl AttributeDescriptor {
    /// Content entries declared on the descriptor. Entries that are not
    /// content-shaped (e.g. nested descriptors) are skipped.
    pub fn default_content(&self) -> Vec<AttributeContent> {
        self.content
            .iter()
            .filter_map(|c| match c {
                serde_json::Value::Object(obj) if obj.contains_key("data") => {
                    serde_json::from_value(c.clone()).ok()
                }
                serde_json::Value::Object(_) | serde_json::Value::Null => None,
                scalar => Some(AttributeContent::new(scalar.clone())),
            })
            .collect()
    }

    /// Label shown to the user, falling back to the name.
    pub fn label(&self) -> &str {
        if self.properties.label.is_empty() {
            &self.name
        } else {
            &self.properties.label
        }
    }

    pub fn is_required(&self) -> bool {
        self.properties.required
    }

    pub fn is_list(&self) -> bool {
        self.properties.list || self.properties.multi_select
    }

    /// Server identity: uuid and name.
    pub fn identity(&self) -> (&str, &str) {
        (&self.uuid, &self.name)
    }
}

// ── Values and requests ─────────────────────────────────────────────

/// Existing attribute values of an object being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeResponseModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<AttributeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub content: Vec<AttributeContent>,
}

/// Canonical outbound shape for one attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRequestModel {
    pub name: String,
    pub content: Vec<AttributeContent>,
}

/// Body of a callback invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAttributeCallback {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub path_variable: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub request_parameter: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub body: BTreeMap<String, serde_json::Value>,
}

impl RequestAttributeCallback {
    /// Place `value` under `key` in every listed target.
    pub fn insert(&mut self, targets: &[CallbackTarget], key: &str, value: serde_json::Value) {
        for target in targets {
            let slot = match target {
                CallbackTarget::PathVariable => &mut self.path_variable,
                CallbackTarget::RequestParameter => &mut self.request_parameter,
                CallbackTarget::Body => &mut self.body,
            };
            slot.insert(key.to_string(), value.clone());
        }
    }
}

/// Where callbacks of an attribute form are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum CallbackScope {
    /// Connector-provided attributes.
    #[serde(rename_all = "camelCase")]
    Connector {
        function_group_code: String,
        connector_uuid: String,
        kind: String,
    },
    /// Attributes owned by a platform resource.
    #[serde(rename_all = "camelCase")]
    Resource { resource: String, parent_uuid: String },
}

/// Interpreted callback response.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackResponse {
    /// Plain content: options or a value for the triggering field.
    Content(Vec<AttributeContent>),
    /// Full descriptors to splice under a Group attribute.
    Descriptors(crate::deserialize::ParsedDescriptors),
}

// ── Tests ───────────────────────────────────────────────────────────
