//! The active descriptor set of one namespace.
//!
//! Base descriptors are fixed at mount. Optional custom descriptors are
//! switched on and off by the user. Group descriptors own subtrees of
//! injected descriptors that are replaced wholesale, recursively, whenever
//! their callback returns a new result.

use attrform_interchange::{AttributeDescriptor, AttributeType};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::EditorError;

/// Non-required custom descriptors are optional; everything else is base.
pub fn is_optional(descriptor: &AttributeDescriptor) -> bool {
    descriptor.attribute_type == AttributeType::Custom && !descriptor.is_required()
}

/// One active descriptor in render order.
#[derive(Debug, Clone, Copy)]
pub struct ActiveAttribute<'a> {
    pub descriptor: &'a AttributeDescriptor,
    /// Group descriptor whose subtree holds this one.
    pub parent_group: Option<&'a str>,
}

/// Outcome of replacing an injected subtree.
#[derive(Debug, Default)]
pub struct Replaced {
    /// Every descriptor of the old subtree, nested ones included.
    pub removed: Vec<AttributeDescriptor>,
    /// Incoming names that collided with an existing attribute.
    pub rejected: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ActiveSet {
    declared: Vec<AttributeDescriptor>,
    selected: BTreeSet<String>,
    injected: BTreeMap<String, Vec<AttributeDescriptor>>,
}

impl ActiveSet {
    pub fn new(declared: Vec<AttributeDescriptor>) -> Self {
        ActiveSet {
            declared,
            selected: BTreeSet::new(),
            injected: BTreeMap::new(),
        }
    }

    /// Descriptors declared at mount, in order.
    pub fn declared(&self) -> &[AttributeDescriptor] {
        &self.declared
    }

    fn declared_by_name(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.declared.iter().find(|d| d.name == name)
    }

    fn injected_by_name(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.injected
            .values()
            .flat_map(|subtree| subtree.iter())
            .find(|d| d.name == name)
    }

    /// Any known descriptor, active or not.
    pub fn find(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.declared_by_name(name)
            .or_else(|| self.injected_by_name(name))
    }

    pub fn is_injected(&self, name: &str) -> bool {
        self.injected_by_name(name).is_some()
    }

    pub fn is_active(&self, name: &str) -> bool {
        match self.declared_by_name(name) {
            Some(d) if is_optional(d) => self.selected.contains(name),
            Some(_) => true,
            None => self.is_injected(name),
        }
    }

    /// Active descriptors in render order; injected subtrees follow their
    /// owning group.
    pub fn list_active(&self) -> Vec<ActiveAttribute<'_>> {
        let mut out = Vec::new();
        for descriptor in &self.declared {
            if self.is_active(&descriptor.name) {
                self.push_with_subtree(descriptor, None, &mut out);
            }
        }
        out
    }

    fn push_with_subtree<'a>(
        &'a self,
        descriptor: &'a AttributeDescriptor,
        parent_group: Option<&'a str>,
        out: &mut Vec<ActiveAttribute<'a>>,
    ) {
        out.push(ActiveAttribute {
            descriptor,
            parent_group,
        });
        if let Some(children) = self.injected.get(&descriptor.name) {
            for child in children {
                self.push_with_subtree(child, Some(descriptor.name.as_str()), out);
            }
        }
    }

    /// Optional descriptors the user may add, in declared order.
    pub fn list_selectable(&self) -> Vec<&AttributeDescriptor> {
        self.declared
            .iter()
            .filter(|d| is_optional(d) && !self.selected.contains(&d.name))
            .collect()
    }

    pub fn add(&mut self, name: &str) -> Result<&AttributeDescriptor, EditorError> {
        let descriptor = self.find(name).ok_or_else(|| EditorError::UnknownAttribute {
            name: name.to_string(),
        })?;
        if !is_optional(descriptor) || self.is_injected(name) {
            return Err(EditorError::NotSelectable {
                name: name.to_string(),
            });
        }
        if !self.selected.insert(name.to_string()) {
            return Err(EditorError::AlreadyActive {
                name: name.to_string(),
            });
        }
        self.find(name).ok_or_else(|| EditorError::UnknownAttribute {
            name: name.to_string(),
        })
    }

    pub fn remove(&mut self, name: &str) -> Result<(), EditorError> {
        let descriptor = self.find(name).ok_or_else(|| EditorError::UnknownAttribute {
            name: name.to_string(),
        })?;
        if !is_optional(descriptor) || self.is_injected(name) || !self.selected.remove(name) {
            return Err(EditorError::NotRemovable {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn drain_subtree(&mut self, owner: &str, removed: &mut Vec<AttributeDescriptor>) {
        if let Some(children) = self.injected.remove(owner) {
            for child in children {
                self.drain_subtree(&child.name, removed);
                removed.push(child);
            }
        }
    }

    /// Replace the subtree owned by `owner`.
    ///
    /// The old subtree (and every subtree below it) is discarded before the
    /// new descriptors are placed. Incoming names already used elsewhere in
    /// the namespace are dropped.
    pub fn replace_injected(&mut self, owner: &str, descriptors: Vec<AttributeDescriptor>) -> Replaced {
        let mut replaced = Replaced::default();
        self.drain_subtree(owner, &mut replaced.removed);

        let mut kept: Vec<AttributeDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let taken = descriptor.name == owner
                || self.find(&descriptor.name).is_some()
                || kept.iter().any(|k| k.name == descriptor.name);
            if taken {
                tracing::warn!(
                    target: "attrform::attributes",
                    owner,
                    attribute = %descriptor.name,
                    "injected attribute name already in use; dropped"
                );
                replaced.rejected.push(descriptor.name);
            } else {
                kept.push(descriptor);
            }
        }
        if !kept.is_empty() {
            self.injected.insert(owner.to_string(), kept);
        }
        replaced
    }

    /// Descriptors currently injected under `owner`.
    pub fn injected_under(&self, owner: &str) -> &[AttributeDescriptor] {
        self.injected.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }
}
