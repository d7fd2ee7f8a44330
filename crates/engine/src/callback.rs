//! Callback request construction and per-callback state.
//!
//! A callback is keyed by the field path of the descriptor that declares
//! it. Every firing takes a fresh generation number from a resolver-wide
//! counter; an outcome is applied only while its generation is still the
//! current one for that key, so a slow response can never overwrite a
//! newer one.

use attrform_interchange::{
    AttributeContent, AttributeDescriptor, CallbackMapping, CallbackScope,
    RequestAttributeCallback,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ──────────────────────────────────────────────
// Types
// ──────────────────────────────────────────────

/// Lifecycle of one callback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CallbackStatus {
    #[default]
    Idle,
    Pending,
    Resolved,
    Failed { message: String },
}

/// A callback invocation ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    /// Field path of the descriptor that declares the callback.
    pub callback_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<CallbackScope>,
    pub request: RequestAttributeCallback,
}

/// A fired callback awaiting its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCallback {
    pub generation: u64,
    pub request: CallbackRequest,
}

// ──────────────────────────────────────────────
// Mapping resolution
// ──────────────────────────────────────────────

/// Split `from` into the source attribute name and the path into its content.
fn split_from(from: &str) -> (&str, Vec<&str>) {
    let mut parts = from.split('.');
    let name = parts.next().unwrap_or_default();
    (name, parts.filter(|p| !p.is_empty()).collect())
}

fn navigate(content: &AttributeContent, path: &[&str]) -> Option<Value> {
    match path.split_first() {
        None => Some(content.data.clone()),
        Some((&"reference", [])) => content.reference.clone().map(Value::String),
        Some(_) => {
            let mut current = &content.data;
            for segment in path {
                current = match current {
                    Value::Object(obj) => obj.get(*segment)?,
                    Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                    _ => return None,
                };
            }
            (!current.is_null()).then(|| current.clone())
        }
    }
}

/// Value of one mapping, or `None` while it cannot be resolved.
///
/// `lookup` returns the selected contents of a source attribute and a flag
/// telling whether that attribute is multi-valued. A literal `value` is used
/// when there is no `from` or when the source has no value yet.
pub fn resolve_mapping<F>(mapping: &CallbackMapping, lookup: &F) -> Option<Value>
where
    F: Fn(&str) -> Option<(Vec<AttributeContent>, bool)>,
{
    let from_source = mapping.from.as_deref().and_then(|from| {
        let (name, path) = split_from(from);
        let (contents, multi) = lookup(name)?;
        let resolved: Vec<Value> = contents
            .iter()
            .filter_map(|c| navigate(c, &path))
            .collect();
        match (multi, resolved.len()) {
            (_, 0) => None,
            (true, _) => Some(Value::Array(resolved)),
            (false, _) => resolved.into_iter().next(),
        }
    });
    from_source.or_else(|| mapping.value.clone())
}

/// Build the callback body for a descriptor, or `None` while gated.
///
/// The callback is gated while any mapping is unset or references a source
/// without a concrete value.
pub fn build_request<F>(descriptor: &AttributeDescriptor, lookup: &F) -> Option<RequestAttributeCallback>
where
    F: Fn(&str) -> Option<(Vec<AttributeContent>, bool)>,
{
    let callback = descriptor.attribute_callback.as_ref()?;
    let mut request = RequestAttributeCallback {
        name: descriptor.name.clone(),
        uuid: Some(descriptor.uuid.clone()),
        ..RequestAttributeCallback::default()
    };
    for mapping in &callback.mappings {
        if mapping.is_unset() {
            return None;
        }
        let value = resolve_mapping(mapping, lookup)?;
        request.insert(&mapping.targets, &mapping.to, value);
    }
    Some(request)
}

// ──────────────────────────────────────────────
// Resolver
// ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct CallbackSlot {
    generation: u64,
    last_inputs: Option<RequestAttributeCallback>,
    status: CallbackStatus,
}

/// Generation and status bookkeeping for every callback of one editor.
#[derive(Debug, Default)]
pub struct CallbackResolver {
    slots: BTreeMap<String, CallbackSlot>,
    next_generation: u64,
}

impl CallbackResolver {
    pub fn new() -> Self {
        CallbackResolver::default()
    }

    /// Fire a callback if its inputs changed since the last firing.
    pub fn consider(
        &mut self,
        callback_id: &str,
        scope: Option<&CallbackScope>,
        request: RequestAttributeCallback,
    ) -> Option<PendingCallback> {
        let slot = self.slots.entry(callback_id.to_string()).or_default();
        if slot.last_inputs.as_ref() == Some(&request) {
            return None;
        }
        self.next_generation += 1;
        slot.generation = self.next_generation;
        slot.last_inputs = Some(request.clone());
        slot.status = CallbackStatus::Pending;
        tracing::debug!(
            target: "attrform::callback",
            callback = callback_id,
            generation = slot.generation,
            "callback fired"
        );
        Some(PendingCallback {
            generation: slot.generation,
            request: CallbackRequest {
                callback_id: callback_id.to_string(),
                scope: scope.cloned(),
                request,
            },
        })
    }

    /// Whether an outcome for `generation` is still current.
    pub fn accept(&self, callback_id: &str, generation: u64) -> bool {
        self.slots
            .get(callback_id)
            .is_some_and(|slot| slot.generation == generation)
    }

    pub fn mark_resolved(&mut self, callback_id: &str) {
        if let Some(slot) = self.slots.get_mut(callback_id) {
            slot.status = CallbackStatus::Resolved;
        }
    }

    pub fn mark_failed(&mut self, callback_id: &str, message: impl Into<String>) {
        if let Some(slot) = self.slots.get_mut(callback_id) {
            slot.status = CallbackStatus::Failed {
                message: message.into(),
            };
        }
    }

    pub fn status(&self, callback_id: &str) -> CallbackStatus {
        self.slots
            .get(callback_id)
            .map(|slot| slot.status.clone())
            .unwrap_or_default()
    }

    /// Drop all state of a callback. Outstanding tickets become stale.
    pub fn forget(&mut self, callback_id: &str) {
        self.slots.remove(callback_id);
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
