//! Form state to attribute requests.

use attrform_interchange::{AttributeDescriptor, AttributeRequestModel};

use crate::attribute_set::is_optional;
use crate::content::{handler_for, ContentContext};
use crate::error::CollectError;
use crate::paths::FieldPath;
use crate::values::FormState;

/// Collect every descriptor with a value in `state`.
///
/// Optional custom descriptors count only when the form holds a value for
/// one of their paths; use [`collect_active`] when the active set is known.
/// Wall-clock date-times are read in the host time zone, as the editor
/// does by default.
pub fn collect(
    namespace: &str,
    descriptors: &[AttributeDescriptor],
    state: &FormState,
) -> Result<Vec<AttributeRequestModel>, CollectError> {
    let present: Vec<&AttributeDescriptor> = descriptors
        .iter()
        .filter(|d| {
            let path = FieldPath::new(namespace, &d.name);
            !is_optional(d) || state.iter().any(|(key, _)| path.owns(key))
        })
        .collect();
    collect_active(&ContentContext::default(), namespace, present, state)
}

/// Collect the given active descriptors, in order.
///
/// Info and Group descriptors and unknown content types are skipped.
/// Fields without a value contribute nothing, except checkboxes which
/// always serialize.
pub fn collect_active<'a>(
    ctx: &ContentContext,
    namespace: &str,
    descriptors: impl IntoIterator<Item = &'a AttributeDescriptor>,
    state: &FormState,
) -> Result<Vec<AttributeRequestModel>, CollectError> {
    let mut requests = Vec::new();
    for descriptor in descriptors {
        if !descriptor.attribute_type.is_collectible() {
            continue;
        }
        let Some(handler) = handler_for(&descriptor.content_type) else {
            tracing::warn!(
                target: "attrform::collect",
                attribute = %descriptor.name,
                content_type = %descriptor.content_type,
                "unsupported content type; attribute not collected"
            );
            continue;
        };
        let path = FieldPath::new(namespace, &descriptor.name);
        match handler.serialize(ctx, descriptor, &path, state)? {
            Some(content) if !content.is_empty() => requests.push(AttributeRequestModel {
                name: descriptor.name.clone(),
                content,
            }),
            _ => {}
        }
    }
    Ok(requests)
}
