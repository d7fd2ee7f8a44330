//! Credential and Object content: always picked from options.

use attrform_interchange::{AttributeContent, AttributeDescriptor, ContentType};
use serde_json::Value;

use super::{list_initial, list_serialize, ContentContext, ContentHandler, Control};
use crate::error::CollectError;
use crate::paths::FieldPath;
use crate::values::FormState;

pub(crate) struct ReferenceHandler {
    pub(crate) credential: bool,
}

impl ContentHandler for ReferenceHandler {
    fn content_type(&self) -> ContentType {
        if self.credential {
            ContentType::Credential
        } else {
            ContentType::Object
        }
    }

    fn control(&self, descriptor: &AttributeDescriptor) -> Control {
        Control::Select {
            multi: descriptor.properties.multi_select,
        }
    }

    fn initial_values(
        &self,
        _ctx: &ContentContext,
        descriptor: &AttributeDescriptor,
        path: &FieldPath,
        content: &[AttributeContent],
    ) -> Vec<(String, Value)> {
        list_initial(descriptor, path, content)
    }

    fn serialize(
        &self,
        _ctx: &ContentContext,
        _descriptor: &AttributeDescriptor,
        path: &FieldPath,
        state: &FormState,
    ) -> Result<Option<Vec<AttributeContent>>, CollectError> {
        Ok(list_serialize(path, state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::option_value;
    use serde_json::json;

    #[test]
    fn credential_selection_serializes_content_object() {
        let d: AttributeDescriptor = serde_json::from_value(json!({
            "uuid": "u",
            "name": "credential",
            "type": "data",
            "contentType": "credential",
            "properties": { "label": "Credential", "list": true }
        }))
        .unwrap();
        let path = FieldPath::new("ns", "credential");
        let picked = AttributeContent::with_reference(json!({ "uuid": "c1", "name": "adminCred" }), "adminCred");
        let mut state = FormState::new();
        state.set(path.to_string(), option_value(&picked));
        let out = ReferenceHandler { credential: true }
            .serialize(&ContentContext::default(), &d, &path, &state)
            .unwrap();
        assert_eq!(out, Some(vec![picked]));
        assert_eq!(
            ReferenceHandler { credential: true }.control(&d),
            Control::Select { multi: false }
        );
    }
}
