//! Control tree storage, traversal and value/status computation.
use crate::{
    event::{EventQueue, FormEvent, SubscriptionId},
    number::Coercion,
    template::{ArrayConfig, ControlTemplate},
    validators::{self, ValidationErrors, Validator},
    ControlId, ControlKind, FormError, FormResult, FormValue, SetOptions, Status,
};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use slotmap::SlotMap;
use smallvec::SmallVec;
use std::{fmt, rc::Rc};
use tracing::trace;

pub(crate) type ChildList = SmallVec<[ControlId; 8]>;

////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) struct LeafNode {
    pub(crate) coercion: Coercion,
}

pub(crate) struct GroupNode {
    /// Initial controls, used to re-create keys that were removed.
    pub(crate) template: Rc<IndexMap<String, ControlTemplate>>,
    /// Live children, in insertion order.
    pub(crate) children: IndexMap<String, ControlId>,
}

pub(crate) struct ArrayNode {
    pub(crate) config: ArrayConfig,
    pub(crate) children: Vec<ControlId>,
}

pub(crate) enum ControlNode {
    Control(LeafNode),
    Group(GroupNode),
    Array(ArrayNode),
}

impl ControlNode {
    pub(crate) fn kind(&self) -> ControlKind {
        match self {
            ControlNode::Control(_) => ControlKind::Control,
            ControlNode::Group(_) => ControlKind::Group,
            ControlNode::Array(_) => ControlKind::Array,
        }
    }

    pub(crate) fn children(&self) -> ChildList {
        match self {
            ControlNode::Control(_) => ChildList::new(),
            ControlNode::Group(group) => group.children.values().copied().collect(),
            ControlNode::Array(array) => array.children.iter().copied().collect(),
        }
    }
}

pub(crate) struct ControlEntry {
    pub(crate) node: ControlNode,
    pub(crate) parent: Option<ControlId>,
    /// Value of a leaf, or cached aggregate value of a container.
    pub(crate) value: FormValue,
    pub(crate) status: Status,
    pub(crate) errors: Option<ValidationErrors>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) pristine: bool,
    pub(crate) touched: bool,
}

impl ControlEntry {
    fn new(node: ControlNode, parent: Option<ControlId>, validators: Vec<Validator>) -> ControlEntry {
        ControlEntry {
            node,
            parent,
            value: FormValue::Null,
            status: Status::Valid,
            errors: None,
            validators,
            pristine: true,
            touched: false,
        }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.status != Status::Disabled
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// An arena of form controls.
///
/// Every control (leaf, group or array) lives in the tree and is addressed by a `ControlId`.
/// Containers exclusively own their children: removing or replacing a child destroys its whole
/// subtree, and the handles of destroyed controls become invalid.
///
/// Operations that modify the tree queue change events, which are delivered to listeners
/// (see `subscribe`) when the operation returns.
#[derive(Default)]
pub struct FormTree {
    pub(crate) controls: SlotMap<ControlId, ControlEntry>,
    pub(crate) events: EventQueue,
}

impl FormTree {
    pub fn new() -> FormTree {
        FormTree::default()
    }

    /// Instantiates a template as a new root control.
    pub fn insert(&mut self, template: &ControlTemplate) -> ControlId {
        self.instantiate(template, None)
    }

    /// Removes a control and its descendants.
    ///
    /// If the control has a parent, it is detached from it first and the parent is updated.
    pub fn remove(&mut self, id: ControlId) -> FormResult<()> {
        let parent = self.entry(id)?.parent;
        if let Some(parent) = parent {
            match &mut self.controls[parent].node {
                ControlNode::Group(group) => group.children.retain(|_, child| *child != id),
                ControlNode::Array(array) => array.children.retain(|child| *child != id),
                ControlNode::Control(_) => {}
            }
        }
        self.destroy(id);
        if let Some(parent) = parent {
            self.update_value_and_validity_inner(parent, SetOptions::default());
        }
        self.events.flush();
        Ok(())
    }

    /// Creates the control described by `template` (and its descendants) under `parent`.
    ///
    /// The new control is not registered in the parent's children; that is up to the caller.
    pub(crate) fn instantiate(&mut self, template: &ControlTemplate, parent: Option<ControlId>) -> ControlId {
        let validators = template.options().validators.clone();
        let id = match template {
            ControlTemplate::Control { state, coercion, .. } => {
                let (value, disabled) = state.clone().into_parts();
                let node = ControlNode::Control(LeafNode { coercion: *coercion });
                let id = self.controls.insert(ControlEntry::new(node, parent, validators));
                let entry = &mut self.controls[id];
                entry.value = coercion.apply(value);
                if disabled == Some(true) {
                    entry.status = Status::Disabled;
                }
                id
            }
            ControlTemplate::Group { controls, .. } => {
                let node = ControlNode::Group(GroupNode {
                    template: controls.clone(),
                    children: IndexMap::with_capacity(controls.len()),
                });
                let id = self.controls.insert(ControlEntry::new(node, parent, validators));
                for (key, child_template) in controls.iter() {
                    let child = self.instantiate(child_template, Some(id));
                    if let ControlNode::Group(group) = &mut self.controls[id].node {
                        group.children.insert(key.clone(), child);
                    }
                }
                id
            }
            ControlTemplate::Array { config, .. } => {
                let node = ControlNode::Array(ArrayNode {
                    config: config.clone(),
                    children: Vec::with_capacity(config.size),
                });
                let id = self.controls.insert(ControlEntry::new(node, parent, validators));
                for index in 0..config.size {
                    let item = config.construct(index, None);
                    let child = self.instantiate(&item, Some(id));
                    if let ControlNode::Array(array) = &mut self.controls[id].node {
                        array.children.push(child);
                    }
                }
                id
            }
        };
        self.refresh(id);
        trace!("instantiated {} {:?} (parent: {:?})", template.kind(), id, parent);
        id
    }

    /// Frees a control and its descendants. Does not touch the parent's children.
    pub(crate) fn destroy(&mut self, id: ControlId) {
        if let Some(entry) = self.controls.remove(id) {
            self.events.forget(id);
            for child in entry.node.children() {
                self.destroy(child);
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    // Node access

    pub(crate) fn entry(&self, id: ControlId) -> FormResult<&ControlEntry> {
        self.controls.get(id).ok_or(FormError::NoSuchControl(id))
    }

    pub(crate) fn entry_mut(&mut self, id: ControlId) -> FormResult<&mut ControlEntry> {
        self.controls.get_mut(id).ok_or(FormError::NoSuchControl(id))
    }

    fn kind_mismatch(id: ControlId, expected: ControlKind, found: ControlKind) -> FormError {
        FormError::KindMismatch { id, expected, found }
    }

    pub(crate) fn group(&self, id: ControlId) -> FormResult<&GroupNode> {
        match &self.entry(id)?.node {
            ControlNode::Group(group) => Ok(group),
            other => Err(Self::kind_mismatch(id, ControlKind::Group, other.kind())),
        }
    }

    pub(crate) fn group_mut(&mut self, id: ControlId) -> FormResult<&mut GroupNode> {
        match &mut self.entry_mut(id)?.node {
            ControlNode::Group(group) => Ok(group),
            other => Err(Self::kind_mismatch(id, ControlKind::Group, other.kind())),
        }
    }

    pub(crate) fn array(&self, id: ControlId) -> FormResult<&ArrayNode> {
        match &self.entry(id)?.node {
            ControlNode::Array(array) => Ok(array),
            other => Err(Self::kind_mismatch(id, ControlKind::Array, other.kind())),
        }
    }

    pub(crate) fn array_mut(&mut self, id: ControlId) -> FormResult<&mut ArrayNode> {
        match &mut self.entry_mut(id)?.node {
            ControlNode::Array(array) => Ok(array),
            other => Err(Self::kind_mismatch(id, ControlKind::Array, other.kind())),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Structure queries

    /// Returns whether `id` refers to a live control of this tree.
    pub fn contains_control(&self, id: ControlId) -> bool {
        self.controls.contains_key(id)
    }

    /// Number of live controls in the tree.
    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn kind(&self, id: ControlId) -> FormResult<ControlKind> {
        Ok(self.entry(id)?.node.kind())
    }

    pub fn parent(&self, id: ControlId) -> Option<ControlId> {
        self.controls.get(id).and_then(|entry| entry.parent)
    }

    /// Returns the topmost ancestor of the control.
    pub fn root(&self, mut id: ControlId) -> ControlId {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }

    /// Number of live children (0 for leaves).
    pub fn len(&self, id: ControlId) -> FormResult<usize> {
        Ok(match &self.entry(id)?.node {
            ControlNode::Control(_) => 0,
            ControlNode::Group(group) => group.children.len(),
            ControlNode::Array(array) => array.children.len(),
        })
    }

    /// Live children, in order.
    pub fn children(&self, id: ControlId) -> FormResult<Vec<ControlId>> {
        Ok(self.entry(id)?.node.children().into_vec())
    }

    /// Keys of the live children of a group.
    pub fn keys(&self, group: ControlId) -> FormResult<Vec<String>> {
        Ok(self.group(group)?.children.keys().cloned().collect())
    }

    /// All keys a group may hold (the keys of its initial controls).
    pub fn template_keys(&self, group: ControlId) -> FormResult<Vec<String>> {
        Ok(self.group(group)?.template.keys().cloned().collect())
    }

    /// Child of an array at `index`.
    pub fn at(&self, array: ControlId, index: usize) -> Option<ControlId> {
        self.array(array).ok()?.children.get(index).copied()
    }

    /// Live child of a group under `key`.
    pub fn get(&self, group: ControlId, key: &str) -> Option<ControlId> {
        self.group(group).ok()?.children.get(key).copied()
    }

    /// Looks up a descendant by a dot-separated path of keys and indices, e.g. `"rows.0.name"`.
    pub fn find(&self, id: ControlId, path: &str) -> Option<ControlId> {
        path.split('.').try_fold(id, |current, segment| match &self.controls.get(current)?.node {
            ControlNode::Group(group) => group.children.get(segment).copied(),
            ControlNode::Array(array) => array.children.get(segment.parse::<usize>().ok()?).copied(),
            ControlNode::Control(_) => None,
        })
    }

    //----------------------------------------------------------------------------------------------
    // Value and state queries

    /// The value of the control.
    ///
    /// For containers, the aggregate value of the enabled children; if the container itself is
    /// disabled, all children are included.
    pub fn value(&self, id: ControlId) -> FormResult<&FormValue> {
        Ok(&self.entry(id)?.value)
    }

    /// The value of the control, including disabled descendants.
    pub fn raw_value(&self, id: ControlId) -> FormResult<FormValue> {
        let entry = self.entry(id)?;
        Ok(match &entry.node {
            ControlNode::Control(_) => entry.value.clone(),
            ControlNode::Group(group) => FormValue::Map(
                group
                    .children
                    .iter()
                    .map(|(key, &child)| Ok((key.clone(), self.raw_value(child)?)))
                    .collect::<FormResult<_>>()?,
            ),
            ControlNode::Array(array) => FormValue::List(
                array
                    .children
                    .iter()
                    .map(|&child| self.raw_value(child))
                    .collect::<FormResult<_>>()?,
            ),
        })
    }

    /// Deserializes the value of the control.
    pub fn value_as<T: DeserializeOwned>(&self, id: ControlId) -> FormResult<T> {
        Ok(serde_json::from_value(self.value(id)?.to_json())?)
    }

    /// Deserializes the value of the control, including disabled descendants.
    pub fn raw_value_as<T: DeserializeOwned>(&self, id: ControlId) -> FormResult<T> {
        Ok(serde_json::from_value(self.raw_value(id)?.to_json())?)
    }

    pub fn status(&self, id: ControlId) -> FormResult<Status> {
        Ok(self.entry(id)?.status)
    }

    /// Errors reported by the validators of this control (not its descendants).
    pub fn errors(&self, id: ControlId) -> FormResult<Option<&ValidationErrors>> {
        Ok(self.entry(id)?.errors.as_ref())
    }

    /// Returns whether the validators of this control reported an error named `name`.
    pub fn has_error(&self, id: ControlId, name: &str) -> bool {
        self.controls
            .get(id)
            .and_then(|entry| entry.errors.as_ref())
            .map_or(false, |errors| errors.contains_key(name))
    }

    pub fn is_valid(&self, id: ControlId) -> FormResult<bool> {
        Ok(self.status(id)? == Status::Valid)
    }

    pub fn is_invalid(&self, id: ControlId) -> FormResult<bool> {
        Ok(self.status(id)? == Status::Invalid)
    }

    pub fn is_enabled(&self, id: ControlId) -> FormResult<bool> {
        Ok(self.entry(id)?.enabled())
    }

    pub fn is_disabled(&self, id: ControlId) -> FormResult<bool> {
        Ok(!self.entry(id)?.enabled())
    }

    pub fn is_pristine(&self, id: ControlId) -> FormResult<bool> {
        Ok(self.entry(id)?.pristine)
    }

    pub fn is_dirty(&self, id: ControlId) -> FormResult<bool> {
        Ok(!self.entry(id)?.pristine)
    }

    pub fn is_touched(&self, id: ControlId) -> FormResult<bool> {
        Ok(self.entry(id)?.touched)
    }

    pub fn is_untouched(&self, id: ControlId) -> FormResult<bool> {
        Ok(!self.entry(id)?.touched)
    }

    //----------------------------------------------------------------------------------------------
    // Notifications

    /// Registers a listener for the change events of a control.
    ///
    /// The listener stays registered until `unsubscribe` is called or the control is destroyed.
    pub fn subscribe(
        &mut self,
        id: ControlId,
        listener: impl FnMut(&FormEvent) + 'static,
    ) -> FormResult<SubscriptionId> {
        self.entry(id)?;
        Ok(self.events.subscribe(id, listener))
    }

    /// Registers a listener called with the new value each time the value of the control is recomputed.
    pub fn subscribe_value_changes(
        &mut self,
        id: ControlId,
        mut listener: impl FnMut(&FormValue) + 'static,
    ) -> FormResult<SubscriptionId> {
        self.subscribe(id, move |event| {
            if let FormEvent::ValueChanged { value, .. } = event {
                listener(value)
            }
        })
    }

    /// Registers a listener called with the new status each time the status of the control is recomputed.
    pub fn subscribe_status_changes(
        &mut self,
        id: ControlId,
        mut listener: impl FnMut(Status) + 'static,
    ) -> FormResult<SubscriptionId> {
        self.subscribe(id, move |event| {
            if let FormEvent::StatusChanged { status, .. } = event {
                listener(*status)
            }
        })
    }

    /// Removes a listener. Returns false if it was already removed.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.events.unsubscribe(subscription)
    }

    /// Delivers the events queued by an operation and passes its result through.
    pub(crate) fn finish<T>(&mut self, result: FormResult<T>) -> FormResult<T> {
        self.events.flush();
        result
    }

    //----------------------------------------------------------------------------------------------
    // Value and validity

    /// Recomputes the value, errors and status of the control, emits change events (unless
    /// `emit_event` is false), then does the same for the ancestors (unless `only_self` is true).
    pub fn update_value_and_validity(&mut self, id: ControlId, opts: SetOptions) -> FormResult<()> {
        self.entry(id)?;
        self.update_value_and_validity_inner(id, opts);
        self.finish(Ok(()))
    }

    pub(crate) fn update_value_and_validity_inner(&mut self, id: ControlId, opts: SetOptions) {
        if !self.controls.contains_key(id) {
            return;
        }

        let initial_status = if self.all_controls_disabled(id) {
            Status::Disabled
        } else {
            Status::Valid
        };
        self.controls[id].status = initial_status;
        if let Some(value) = self.compute_value(id) {
            self.controls[id].value = value;
        }

        if initial_status != Status::Disabled {
            let entry = &self.controls[id];
            let errors = validators::run_all(&entry.validators, &entry.value);
            self.controls[id].errors = errors;
            let status = self.calculate_status(id);
            self.controls[id].status = status;
        }

        if opts.emit_event {
            self.emit(id);
        }

        if !opts.only_self {
            if let Some(parent) = self.controls[id].parent {
                self.update_value_and_validity_inner(parent, opts);
            }
        }
    }

    /// Silently recomputes the value and status of a single control.
    pub(crate) fn refresh(&mut self, id: ControlId) {
        self.update_value_and_validity_inner(
            id,
            SetOptions {
                only_self: true,
                emit_event: false,
            },
        );
    }

    /// Silently recomputes a whole subtree, children first.
    pub(crate) fn refresh_subtree(&mut self, id: ControlId) {
        let Some(entry) = self.controls.get(id) else { return };
        for child in entry.node.children() {
            self.refresh_subtree(child);
        }
        self.refresh(id);
    }

    pub(crate) fn emit(&mut self, id: ControlId) {
        if !self.events.is_listening() {
            return;
        }
        let entry = &self.controls[id];
        let (value, status) = (entry.value.clone(), entry.status);
        self.events.push(FormEvent::ValueChanged { id, value });
        self.events.push(FormEvent::StatusChanged { id, status });
    }

    /// Aggregate value of a container, `None` for leaves.
    fn compute_value(&self, id: ControlId) -> Option<FormValue> {
        let entry = &self.controls[id];
        let include_disabled = !entry.enabled();
        let included = |child: ControlId| include_disabled || self.controls[child].enabled();
        match &entry.node {
            ControlNode::Control(_) => None,
            ControlNode::Group(group) => Some(FormValue::Map(
                group
                    .children
                    .iter()
                    .filter(|(_, &child)| included(child))
                    .map(|(key, &child)| (key.clone(), self.controls[child].value.clone()))
                    .collect(),
            )),
            ControlNode::Array(array) => Some(FormValue::List(
                array
                    .children
                    .iter()
                    .filter(|&&child| included(child))
                    .map(|&child| self.controls[child].value.clone())
                    .collect(),
            )),
        }
    }

    /// For leaves, whether the control is disabled. For containers, whether all children are
    /// disabled (an empty container counts as "all disabled" only if it is itself disabled).
    pub(crate) fn all_controls_disabled(&self, id: ControlId) -> bool {
        let entry = &self.controls[id];
        match &entry.node {
            ControlNode::Control(_) => !entry.enabled(),
            node => {
                let children = node.children();
                if children.iter().any(|&child| self.controls[child].enabled()) {
                    return false;
                }
                !children.is_empty() || !entry.enabled()
            }
        }
    }

    fn calculate_status(&self, id: ControlId) -> Status {
        if self.all_controls_disabled(id) {
            return Status::Disabled;
        }
        let entry = &self.controls[id];
        if entry.errors.is_some() {
            return Status::Invalid;
        }
        let any_invalid = entry
            .node
            .children()
            .iter()
            .any(|&child| self.controls[child].status == Status::Invalid);
        if any_invalid {
            Status::Invalid
        } else {
            Status::Valid
        }
    }
}

impl fmt::Debug for FormTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FormTree")
            .field("controls", &self.controls.len())
            .field("events", &self.events)
            .finish()
    }
}
