//! The attribute editor: one mounted namespace of a form.
//!
//! An editor owns the form state, the active descriptor set, per-field
//! validation errors and callback bookkeeping for a single namespace.
//! Every method takes `&mut self` and returns synchronously; callbacks
//! leave the editor as [`PendingCallback`] tickets and come back through
//! [`AttributeEditor::apply_callback_outcome`].

use attrform_interchange::{
    parse_descriptors, AttributeContent, AttributeDescriptor, AttributeRequestModel,
    AttributeResponseModel, AttributeType, CallbackResponse, CallbackScope, ContentType,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use time::UtcOffset;

use crate::attribute_set::{is_optional, ActiveSet};
use crate::callback::{build_request, CallbackResolver, CallbackStatus, PendingCallback};
use crate::collect::collect_active;
use crate::constraints::{compose_validators, Validator};
use crate::content::{handler_for, ContentContext, ContentHandler, Control};
use crate::error::EditorError;
use crate::paths::{
    add_attribute_control, split_key, FieldPath, CODE_LANGUAGE, CODE_TEXT_AREA, FILE_CONTENT,
    FILE_MIME_TYPE, FILE_NAME,
};
use crate::render::{AddControl, FieldSpec, RenderPlan, SelectableAttribute};
use crate::temporal::LocalZone;
use crate::transport::{CallbackTransport, TransportError};
use crate::values::{content_from_value, is_option, option_value, selected_contents, FormState};

/// Upper bound on callback rounds in [`AttributeEditor::resolve_callbacks`].
pub const MAX_CALLBACK_ROUNDS: usize = 64;

// ──────────────────────────────────────────────
// Props
// ──────────────────────────────────────────────

/// Everything a host supplies to mount an editor.
#[derive(Debug, Clone)]
pub struct EditorProps {
    pub namespace: String,
    pub descriptors: Vec<AttributeDescriptor>,
    /// Existing values of the object being edited.
    pub attributes: Vec<AttributeResponseModel>,
    pub scope: Option<CallbackScope>,
    pub with_remove_action: bool,
    /// Zone wall-clock date-times are interpreted in.
    pub local_zone: LocalZone,
}

impl EditorProps {
    pub fn new(namespace: impl Into<String>, descriptors: Vec<AttributeDescriptor>) -> Self {
        EditorProps {
            namespace: namespace.into(),
            descriptors,
            attributes: Vec::new(),
            scope: None,
            with_remove_action: false,
            local_zone: LocalZone::Host,
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<AttributeResponseModel>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_scope(mut self, scope: CallbackScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_remove_action(mut self, enabled: bool) -> Self {
        self.with_remove_action = enabled;
        self
    }

    /// Read every wall-clock value at one fixed offset.
    pub fn with_local_offset(mut self, offset: UtcOffset) -> Self {
        self.local_zone = LocalZone::Fixed(offset);
        self
    }

    pub fn with_local_zone(mut self, zone: LocalZone) -> Self {
        self.local_zone = zone;
        self
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

/// Fields whose descriptor content is a list of options rather than a
/// default value.
fn offers_options(descriptor: &AttributeDescriptor) -> bool {
    descriptor.is_list()
        || matches!(
            descriptor.content_type,
            ContentType::Credential | ContentType::Object
        )
}

/// Descriptors embedded in a Group descriptor's content.
fn static_children(group: &AttributeDescriptor) -> Vec<AttributeDescriptor> {
    let entries: Vec<Value> = group
        .content
        .iter()
        .filter(|c| c.get("name").is_some() && c.get("contentType").is_some())
        .cloned()
        .collect();
    if entries.is_empty() {
        return Vec::new();
    }
    match parse_descriptors(&Value::Array(entries)) {
        Ok(parsed) => {
            for rejected in &parsed.rejected {
                tracing::warn!(
                    target: "attrform::editor",
                    group = %group.name,
                    index = rejected.index,
                    reason = %rejected.reason,
                    "nested descriptor rejected"
                );
            }
            parsed.descriptors
        }
        Err(e) => {
            tracing::warn!(target: "attrform::editor", group = %group.name, error = %e, "group content unreadable");
            Vec::new()
        }
    }
}

fn same_content(a: &AttributeContent, b: &AttributeContent) -> bool {
    a.data == b.data
}

// ──────────────────────────────────────────────
// Editor
// ──────────────────────────────────────────────

pub struct AttributeEditor {
    namespace: String,
    scope: Option<CallbackScope>,
    with_remove_action: bool,
    ctx: ContentContext,
    set: ActiveSet,
    state: FormState,
    errors: BTreeMap<String, String>,
    existing: BTreeMap<String, Vec<AttributeContent>>,
    options: BTreeMap<String, Vec<AttributeContent>>,
    /// Identities (uuid, name) of injected attributes materialized before.
    injected_before: BTreeSet<(String, String)>,
    resolver: CallbackResolver,
    queue: Vec<PendingCallback>,
    warnings: Vec<String>,
}

impl AttributeEditor {
    /// Mount an editor: materialize defaults and existing values, expand
    /// static groups, and queue every callback that can already fire.
    pub fn mount(props: EditorProps) -> Self {
        let existing = props
            .attributes
            .into_iter()
            .map(|a| (a.name, a.content))
            .collect::<BTreeMap<_, _>>();

        let mut editor = AttributeEditor {
            namespace: props.namespace,
            scope: props.scope,
            with_remove_action: props.with_remove_action,
            ctx: ContentContext {
                zone: props.local_zone,
            },
            set: ActiveSet::new(props.descriptors),
            state: FormState::new(),
            errors: BTreeMap::new(),
            existing,
            options: BTreeMap::new(),
            injected_before: BTreeSet::new(),
            resolver: CallbackResolver::new(),
            queue: Vec::new(),
            warnings: Vec::new(),
        };

        let optional_with_values: Vec<String> = editor
            .set
            .declared()
            .iter()
            .filter(|d| is_optional(d) && editor.existing.contains_key(&d.name))
            .map(|d| d.name.clone())
            .collect();
        for name in optional_with_values {
            if let Err(e) = editor.set.add(&name) {
                tracing::debug!(target: "attrform::editor", attribute = %name, error = %e, "existing value not activated");
            }
        }

        let declared: Vec<AttributeDescriptor> = editor.set.declared().to_vec();
        for descriptor in &declared {
            if descriptor.attribute_type == AttributeType::Group {
                let children = static_children(descriptor);
                if !children.is_empty() {
                    editor.inject(&descriptor.name, children);
                }
            }
            if editor.set.is_active(&descriptor.name) {
                editor.materialize(descriptor, true);
            }
        }

        tracing::info!(
            target: "attrform::editor",
            namespace = %editor.namespace,
            active = editor.set.list_active().len(),
            selectable = editor.set.list_selectable().len(),
            "editor mounted"
        );
        editor.refresh_callbacks();
        editor
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Problems found while mounting or applying callbacks.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn path(&self, name: &str) -> FieldPath {
        FieldPath::new(&self.namespace, name)
    }

    fn warn_unsupported(&mut self, descriptor: &AttributeDescriptor) {
        let message = format!(
            "attribute '{}' has unsupported content type '{}'",
            descriptor.name, descriptor.content_type
        );
        if !self.warnings.contains(&message) {
            tracing::warn!(
                target: "attrform::editor",
                attribute = %descriptor.name,
                content_type = %descriptor.content_type,
                "unsupported content type; attribute skipped"
            );
            self.warnings.push(message);
        }
    }

    /// Write a descriptor's initial values into the form.
    ///
    /// Existing values win over defaults when `use_existing` is set. The
    /// content of option-style descriptors is their option list, never a
    /// selection.
    fn materialize(&mut self, descriptor: &AttributeDescriptor, use_existing: bool) {
        if offers_options(descriptor) {
            self.options
                .insert(descriptor.name.clone(), descriptor.default_content());
        }
        if !descriptor.attribute_type.is_collectible() {
            return;
        }
        let Some(handler) = handler_for(&descriptor.content_type) else {
            self.warn_unsupported(descriptor);
            return;
        };
        let existing = self
            .existing
            .get(&descriptor.name)
            .filter(|_| use_existing)
            .cloned();
        let content = match existing {
            Some(content) => content,
            None if offers_options(descriptor) => Vec::new(),
            None => descriptor.default_content(),
        };
        let path = self.path(&descriptor.name);
        for (key, value) in handler.initial_values(&self.ctx, descriptor, &path, &content) {
            self.state.set(key, value);
        }
    }

    /// Drop every trace of a field: values, error, callback and options.
    fn clear_field(&mut self, name: &str) {
        let path = self.path(name);
        self.state.remove_field(&path);
        self.errors.remove(name);
        self.options.remove(name);
        self.resolver.forget(path.as_str());
        self.queue.retain(|t| t.request.callback_id != path.as_str());
    }

    fn active_descriptor(&self, name: &str) -> Result<AttributeDescriptor, EditorError> {
        if !self.set.is_active(name) {
            return Err(EditorError::UnknownAttribute {
                name: name.to_string(),
            });
        }
        self.set
            .find(name)
            .cloned()
            .ok_or_else(|| EditorError::UnknownAttribute {
                name: name.to_string(),
            })
    }

    fn editable(&self, name: &str) -> Result<(AttributeDescriptor, &'static dyn ContentHandler), EditorError> {
        let descriptor = self.active_descriptor(name)?;
        if descriptor.properties.read_only {
            return Err(EditorError::ReadOnly {
                name: name.to_string(),
            });
        }
        let handler = handler_for(&descriptor.content_type)
            .filter(|_| descriptor.attribute_type.is_collectible())
            .ok_or_else(|| EditorError::UnknownAttribute {
                name: name.to_string(),
            })?;
        Ok((descriptor, handler))
    }

    fn require_content_type(descriptor: &AttributeDescriptor, expected: ContentType) -> Result<(), EditorError> {
        if descriptor.content_type != expected {
            return Err(EditorError::ContentTypeMismatch {
                name: descriptor.name.clone(),
                expected: expected.to_string(),
                actual: descriptor.content_type.to_string(),
            });
        }
        Ok(())
    }

    /// Options of a field: callback results, or the descriptor's own list.
    pub fn options(&self, name: &str) -> Vec<AttributeContent> {
        self.options.get(name).cloned().unwrap_or_default()
    }

    /// Turn a host value into select options of this field.
    ///
    /// Accepts option objects, content objects, or bare values matching an
    /// option's data or reference.
    fn normalize_selection(&self, descriptor: &AttributeDescriptor, value: Value) -> Value {
        if !offers_options(descriptor) {
            return value;
        }
        let options = self.options(&descriptor.name);
        let to_option = |v: &Value| -> Value {
            if v.as_object().is_some_and(is_option) {
                return v.clone();
            }
            let matched = options.iter().find(|o| {
                o.data == *v
                    || (v.is_string() && o.reference.as_deref() == v.as_str())
                    || content_from_value(v).is_some_and(|c| same_content(&c, o))
            });
            match matched {
                Some(option) => option_value(option),
                None => content_from_value(v)
                    .map(|c| option_value(&c))
                    .unwrap_or(Value::Null),
            }
        };
        match value {
            Value::Null => Value::Null,
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(to_option)
                    .filter(|v| !v.is_null())
                    .collect(),
            ),
            other => to_option(&other),
        }
    }

    // ── Edits ───────────────────────────────────────────────────────

    /// Set the main value of an attribute.
    pub fn set_value(&mut self, name: &str, value: Value) -> Result<(), EditorError> {
        let (descriptor, handler) = self.editable(name)?;
        let path = self.path(name);
        let value = self.normalize_selection(&descriptor, value);
        self.state.set(handler.value_path(&path), value);
        self.after_edit(name);
        Ok(())
    }

    /// Set a raw form path, including composite sub-fields.
    pub fn set_field(&mut self, key: &str, value: Value) -> Result<(), EditorError> {
        let unknown = || EditorError::UnknownField {
            path: key.to_string(),
        };
        let (namespace, _) = split_key(key).ok_or_else(unknown)?;
        if namespace != self.namespace {
            return Err(unknown());
        }
        let owner = self
            .set
            .list_active()
            .iter()
            .map(|a| a.descriptor.name.clone())
            .find(|name| self.path(name).owns(key))
            .ok_or_else(unknown)?;
        let (descriptor, handler) = self.editable(&owner)?;
        let path = self.path(&owner);
        if !handler.paths(&path).iter().any(|p| p == key) {
            return Err(unknown());
        }
        let value = if key == path.as_str() {
            self.normalize_selection(&descriptor, value)
        } else {
            value
        };
        self.state.set(key, value);
        self.after_edit(&owner);
        Ok(())
    }

    /// Upload a file: content is base64-encoded into the file sub-fields.
    pub fn set_file(
        &mut self,
        name: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<(), EditorError> {
        let (descriptor, _) = self.editable(name)?;
        Self::require_content_type(&descriptor, ContentType::File)?;
        let path = self.path(name);
        self.state
            .set(path.part(FILE_CONTENT), Value::String(BASE64.encode(bytes)));
        self.state
            .set(path.part(FILE_NAME), Value::String(file_name.to_string()));
        self.state
            .set(path.part(FILE_MIME_TYPE), Value::String(mime_type.to_string()));
        self.after_edit(name);
        Ok(())
    }

    /// Set plain code text and optionally its language.
    pub fn set_code(&mut self, name: &str, code: &str, language: Option<&str>) -> Result<(), EditorError> {
        let (descriptor, _) = self.editable(name)?;
        Self::require_content_type(&descriptor, ContentType::Codeblock)?;
        let path = self.path(name);
        self.state
            .set(path.sub(CODE_TEXT_AREA), Value::String(code.to_string()));
        if let Some(language) = language {
            self.state
                .set(path.sub(CODE_LANGUAGE), Value::String(language.to_string()));
        }
        self.after_edit(name);
        Ok(())
    }

    fn after_edit(&mut self, name: &str) {
        self.validate_field(name);
        self.refresh_callbacks();
    }

    // ── Validation ──────────────────────────────────────────────────

    fn check_field(&self, descriptor: &AttributeDescriptor) -> Option<String> {
        if !descriptor.attribute_type.is_collectible() {
            return None;
        }
        let handler = handler_for(&descriptor.content_type)?;
        let path = self.path(&descriptor.name);
        let value = self
            .state
            .get(&handler.value_path(&path))
            .cloned()
            .unwrap_or(Value::Null);
        let validators = [
            (descriptor.is_required() && !handler.always_present()).then_some(Validator::Required),
            handler.input_validator(descriptor),
            (!descriptor.constraints.is_empty()).then(|| Validator::Constraints {
                constraints: descriptor.constraints.clone(),
                zone: self.ctx.zone,
            }),
        ];
        compose_validators(&validators, &value)
    }

    fn validate_field(&mut self, name: &str) -> Option<String> {
        let verdict = self.set.find(name).and_then(|d| self.check_field(d));
        match &verdict {
            Some(message) => {
                self.errors.insert(name.to_string(), message.clone());
            }
            None => {
                self.errors.remove(name);
            }
        }
        verdict
    }

    /// Validate every active field; `true` when all pass.
    pub fn validate_all(&mut self) -> bool {
        let errors: BTreeMap<String, String> = self
            .set
            .list_active()
            .iter()
            .filter_map(|a| {
                self.check_field(a.descriptor)
                    .map(|message| (a.descriptor.name.clone(), message))
            })
            .collect();
        self.errors = errors;
        self.errors.is_empty()
    }

    /// Current validation messages keyed by attribute name.
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    // ── Active set ──────────────────────────────────────────────────

    pub fn add_attribute(&mut self, name: &str) -> Result<(), EditorError> {
        let descriptor = self.set.add(name)?.clone();
        self.materialize(&descriptor, false);
        tracing::debug!(target: "attrform::editor", attribute = name, "attribute added");
        self.refresh_callbacks();
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Result<(), EditorError> {
        self.set.remove(name)?;
        self.clear_field(name);
        tracing::debug!(target: "attrform::editor", attribute = name, "attribute removed");
        self.refresh_callbacks();
        Ok(())
    }

    pub fn list_selectable(&self) -> Vec<&AttributeDescriptor> {
        self.set.list_selectable()
    }

    pub fn list_active(&self) -> Vec<&AttributeDescriptor> {
        self.set.list_active().into_iter().map(|a| a.descriptor).collect()
    }

    // ── Callbacks ───────────────────────────────────────────────────

    /// Selected contents of an active attribute, and whether it is
    /// multi-valued.
    fn source_values(&self, name: &str) -> Option<(Vec<AttributeContent>, bool)> {
        if !self.set.is_active(name) {
            return None;
        }
        let descriptor = self.set.find(name)?;
        let handler = handler_for(&descriptor.content_type)?;
        let path = self.path(name);
        let content = handler
            .serialize(&self.ctx, descriptor, &path, &self.state)
            .ok()
            .flatten()?;
        Some((content, descriptor.properties.multi_select))
    }

    /// Queue every callback whose inputs resolve and changed.
    fn refresh_callbacks(&mut self) {
        let lookup = |name: &str| self.source_values(name);
        let ready: Vec<(String, _)> = self
            .set
            .list_active()
            .iter()
            .filter(|a| a.descriptor.attribute_callback.is_some())
            .filter_map(|a| {
                build_request(a.descriptor, &lookup)
                    .map(|request| (self.path(&a.descriptor.name).to_string(), request))
            })
            .collect();
        for (callback_id, request) in ready {
            if let Some(ticket) = self.resolver.consider(&callback_id, self.scope.as_ref(), request) {
                self.queue.retain(|t| t.request.callback_id != callback_id);
                self.queue.push(ticket);
            }
        }
    }

    /// Fired callbacks not yet handed out.
    pub fn take_pending_callbacks(&mut self) -> Vec<PendingCallback> {
        std::mem::take(&mut self.queue)
    }

    pub fn callback_status(&self, name: &str) -> CallbackStatus {
        self.resolver.status(self.path(name).as_str())
    }

    /// Apply the outcome of a callback ticket.
    ///
    /// Returns `false` when the ticket was superseded or its attribute is
    /// gone; the outcome is then discarded.
    pub fn apply_callback_outcome(
        &mut self,
        ticket: &PendingCallback,
        outcome: Result<CallbackResponse, TransportError>,
    ) -> bool {
        let callback_id = ticket.request.callback_id.as_str();
        if !self.resolver.accept(callback_id, ticket.generation) {
            tracing::debug!(
                target: "attrform::callback",
                callback = callback_id,
                generation = ticket.generation,
                "stale callback outcome discarded"
            );
            return false;
        }
        let Some(descriptor) = self
            .set
            .list_active()
            .iter()
            .find(|a| self.path(&a.descriptor.name).as_str() == callback_id)
            .map(|a| a.descriptor.clone())
        else {
            return false;
        };

        let is_group = descriptor.attribute_type == AttributeType::Group;
        let result = match outcome {
            Err(e) => Err(e.to_string()),
            Ok(CallbackResponse::Descriptors(parsed)) if is_group => {
                for rejected in &parsed.rejected {
                    self.warnings.push(format!(
                        "callback of '{}' returned an unusable descriptor at {}: {}",
                        descriptor.name, rejected.index, rejected.reason
                    ));
                }
                self.inject(&descriptor.name, parsed.descriptors);
                Ok(())
            }
            Ok(CallbackResponse::Content(content)) if is_group => {
                if content.is_empty() {
                    self.inject(&descriptor.name, Vec::new());
                    Ok(())
                } else {
                    Err("group attribute callback returned content".to_string())
                }
            }
            Ok(CallbackResponse::Descriptors(_)) => {
                Err("callback returned descriptors for a non-group attribute".to_string())
            }
            Ok(CallbackResponse::Content(content)) => {
                self.apply_content(&descriptor, content);
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                self.resolver.mark_resolved(callback_id);
                tracing::debug!(target: "attrform::callback", callback = callback_id, "callback resolved");
            }
            Err(message) => {
                tracing::warn!(
                    target: "attrform::callback",
                    callback = callback_id,
                    error = %message,
                    "callback failed"
                );
                if offers_options(&descriptor) {
                    let path = self.path(&descriptor.name);
                    self.options.insert(descriptor.name.clone(), Vec::new());
                    self.state.remove_field(&path);
                }
                self.resolver.mark_failed(callback_id, message);
            }
        }
        self.validate_field(&descriptor.name);
        self.refresh_callbacks();
        true
    }

    /// Content response for a Data, Custom or Info attribute.
    fn apply_content(&mut self, descriptor: &AttributeDescriptor, content: Vec<AttributeContent>) {
        let name = descriptor.name.clone();
        if descriptor.attribute_type == AttributeType::Info {
            self.options.insert(name, content);
            return;
        }
        let path = self.path(&name);
        if offers_options(descriptor) {
            let current = self
                .state
                .get(path.as_str())
                .map(selected_contents)
                .unwrap_or_default();
            let still_offered = !current.is_empty()
                && current
                    .iter()
                    .all(|c| content.iter().any(|o| same_content(c, o)));
            if !still_offered {
                let wanted: BTreeSet<String> = current
                    .iter()
                    .chain(self.existing.get(&name).into_iter().flatten())
                    .filter_map(|c| c.reference.clone())
                    .collect();
                let mut picked: Vec<AttributeContent> = content
                    .iter()
                    .filter(|o| o.reference.as_ref().is_some_and(|r| wanted.contains(r)))
                    .cloned()
                    .collect();
                if !descriptor.properties.multi_select {
                    picked.truncate(1);
                }
                self.state.remove(path.as_str());
                if let Some(handler) = handler_for(&descriptor.content_type) {
                    for (key, value) in handler.initial_values(&self.ctx, descriptor, &path, &picked) {
                        self.state.set(key, value);
                    }
                }
            }
            self.options.insert(name, content);
        } else if content.len() == 1 {
            if let Some(handler) = handler_for(&descriptor.content_type) {
                self.state.remove_field(&path);
                for (key, value) in handler.initial_values(&self.ctx, descriptor, &path, &content) {
                    self.state.set(key, value);
                }
            }
        } else {
            tracing::debug!(
                target: "attrform::callback",
                attribute = %name,
                entries = content.len(),
                "callback content ignored for single-value attribute"
            );
        }
    }

    /// Replace the subtree under a group, materializing the new
    /// descriptors and any static groups among them.
    fn inject(&mut self, owner: &str, descriptors: Vec<AttributeDescriptor>) {
        let replaced = self.set.replace_injected(owner, descriptors);
        for removed in &replaced.removed {
            self.clear_field(&removed.name);
        }
        for name in replaced.rejected {
            self.warnings.push(format!(
                "attribute '{}' injected under '{}' duplicates an existing name",
                name, owner
            ));
        }
        let added: Vec<AttributeDescriptor> = self.set.injected_under(owner).to_vec();
        for descriptor in &added {
            if descriptor.attribute_type == AttributeType::Group {
                let children = static_children(descriptor);
                if !children.is_empty() {
                    self.inject(&descriptor.name, children);
                }
            }
            // A descriptor returned again with the same uuid and name starts
            // from its own default, not from stored or edited values.
            let (uuid, name) = descriptor.identity();
            let repeated = !self.injected_before.insert((uuid.to_string(), name.to_string()));
            if repeated {
                tracing::debug!(
                    target: "attrform::callback",
                    group = owner,
                    attribute = %descriptor.name,
                    "re-injected attribute reset to its defaults"
                );
            }
            self.materialize(descriptor, !repeated);
        }
    }

    /// Dispatch pending callbacks until none remain.
    ///
    /// Returns the number of outcomes applied.
    pub async fn resolve_callbacks(
        &mut self,
        transport: &dyn CallbackTransport,
    ) -> Result<usize, EditorError> {
        let mut applied = 0;
        for round in 1.. {
            let batch = self.take_pending_callbacks();
            if batch.is_empty() {
                break;
            }
            if round > MAX_CALLBACK_ROUNDS {
                self.queue = batch;
                return Err(EditorError::CallbackLoop {
                    rounds: MAX_CALLBACK_ROUNDS,
                });
            }
            tracing::debug!(
                target: "attrform::callback",
                transport = transport.transport_id(),
                round,
                callbacks = batch.len(),
                "dispatching callbacks"
            );
            for ticket in batch {
                let outcome = transport.dispatch(&ticket.request).await;
                if self.apply_callback_outcome(&ticket, outcome) {
                    applied += 1;
                }
            }
        }
        Ok(applied)
    }

    // ── Output ──────────────────────────────────────────────────────

    pub fn render_plan(&mut self) -> RenderPlan {
        let mut fields = Vec::new();
        let active: Vec<(AttributeDescriptor, Option<String>)> = self
            .set
            .list_active()
            .iter()
            .map(|a| (a.descriptor.clone(), a.parent_group.map(str::to_string)))
            .collect();

        for (descriptor, parent_group) in active {
            if !descriptor.properties.visible {
                continue;
            }
            let path = self.path(&descriptor.name);
            let callback = descriptor
                .attribute_callback
                .as_ref()
                .map(|_| self.resolver.status(path.as_str()));
            let failed = matches!(callback, Some(CallbackStatus::Failed { .. }));

            let (control, paths) = match descriptor.attribute_type {
                AttributeType::Info => (Control::Info, Vec::new()),
                AttributeType::Group => (Control::Group, Vec::new()),
                AttributeType::Data | AttributeType::Custom => {
                    match handler_for(&descriptor.content_type) {
                        Some(handler) => (handler.control(&descriptor), handler.paths(&path)),
                        None => {
                            self.warn_unsupported(&descriptor);
                            continue;
                        }
                    }
                }
            };
            let values = paths
                .iter()
                .filter_map(|p| self.state.get(p).map(|v| (p.clone(), v.clone())))
                .collect();
            let options = match control {
                Control::Select { .. } => self.options(&descriptor.name).iter().map(option_value).collect(),
                _ => Vec::new(),
            };
            let info = if descriptor.attribute_type == AttributeType::Info {
                self.options
                    .get(&descriptor.name)
                    .cloned()
                    .unwrap_or_else(|| descriptor.default_content())
            } else {
                Vec::new()
            };

            fields.push(FieldSpec {
                name: descriptor.name.clone(),
                path: path.to_string(),
                label: descriptor.label().to_string(),
                description: descriptor.description.clone(),
                attribute_type: descriptor.attribute_type,
                content_type: descriptor.content_type.clone(),
                control,
                paths,
                required: descriptor.is_required(),
                read_only: descriptor.properties.read_only,
                disabled: descriptor.properties.read_only || (failed && offers_options(&descriptor)),
                options,
                values,
                group: descriptor.properties.group.clone(),
                parent_group,
                removable: self.with_remove_action
                    && is_optional(&descriptor)
                    && !self.set.is_injected(&descriptor.name),
                callback,
                error: self.errors.get(&descriptor.name).cloned(),
                info,
            });
        }

        let selectable: Vec<SelectableAttribute> = self
            .set
            .list_selectable()
            .iter()
            .map(|d| SelectableAttribute {
                name: d.name.clone(),
                label: d.label().to_string(),
            })
            .collect();
        RenderPlan {
            namespace: self.namespace.clone(),
            fields,
            add_control: (!selectable.is_empty()).then(|| AddControl {
                name: add_attribute_control(&self.namespace),
                options: selectable,
            }),
            warnings: self.warnings.clone(),
        }
    }

    /// Collect the active attributes without validating.
    pub fn collect(&self) -> Result<Vec<AttributeRequestModel>, EditorError> {
        let active = self.set.list_active();
        Ok(collect_active(
            &self.ctx,
            &self.namespace,
            active.iter().map(|a| a.descriptor),
            &self.state,
        )?)
    }

    /// Validate every active field, then collect.
    pub fn submit(&mut self) -> Result<Vec<AttributeRequestModel>, EditorError> {
        if !self.validate_all() {
            return Err(EditorError::Validation {
                errors: self.errors.clone(),
            });
        }
        self.collect()
    }
}
