//! Renderer-independent description of a mounted form.

use attrform_interchange::{AttributeContent, AttributeType, ContentType};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::callback::CallbackStatus;
use crate::content::Control;

/// One field the host should render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    /// Base field path.
    pub path: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub attribute_type: AttributeType,
    pub content_type: ContentType,
    pub control: Control,
    /// Every form path the field writes.
    pub paths: Vec<String>,
    pub required: bool,
    pub read_only: bool,
    pub disabled: bool,
    /// Options of a select control.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    /// Current form values keyed by path.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, Value>,
    /// Display group from the descriptor properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Group attribute this field was injected under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_group: Option<String>,
    pub removable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<CallbackStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Content shown by Info fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<AttributeContent>,
}

/// An optional attribute offered in the add dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectableAttribute {
    pub name: String,
    pub label: String,
}

/// The add-attribute dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddControl {
    /// Control name, `selectAddCustomAttribute{namespace}`.
    pub name: String,
    pub options: Vec<SelectableAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub namespace: String,
    pub fields: Vec<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_control: Option<AddControl>,
    /// Descriptors left out of the plan, with the reason.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RenderPlan {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}
