//! Value assignment and control state changes.
use crate::{
    tree::{ControlEntry, ControlNode},
    ControlId, ControlKind, FormError, FormResult, FormState, FormTree, FormValue, SetOptions,
    Status,
};
use tracing::warn;

impl FormTree {
    pub(crate) fn shape_mismatch(&self, id: ControlId, value: FormValue) -> FormError {
        FormError::ShapeMismatch {
            id,
            kind: self.kind(id).unwrap_or(ControlKind::Control),
            value,
        }
    }

    //----------------------------------------------------------------------------------------------
    // Strict set

    /// Sets the value of a control.
    ///
    /// For containers, the value must match the current structure exactly: every live child must
    /// receive a value (`MissingValue`, `MissingIndex`), and every entry of the value must have a
    /// control (`UnknownKey`, `IndexOutOfBounds`). Children written before an error is detected keep
    /// their new value.
    pub fn set_value(&mut self, id: ControlId, value: impl Into<FormValue>, opts: SetOptions) -> FormResult<()> {
        let result = self.set_value_inner(id, value.into(), opts);
        self.finish(result)
    }

    pub(crate) fn set_value_inner(&mut self, id: ControlId, value: FormValue, opts: SetOptions) -> FormResult<()> {
        match &self.entry(id)?.node {
            ControlNode::Control(leaf) => {
                let value = leaf.coercion.apply(value);
                self.controls[id].value = value;
            }
            ControlNode::Group(group) => {
                let children = group.children.clone();
                let map = match value {
                    FormValue::Map(map) => map,
                    other => return Err(self.shape_mismatch(id, other)),
                };
                if let Some(key) = children.keys().find(|key| !map.contains_key(*key)) {
                    return Err(FormError::MissingValue { key: key.clone() });
                }
                for (key, item) in map {
                    let child = *children.get(&key).ok_or(FormError::UnknownKey { key })?;
                    self.set_value_inner(child, item, opts.only_self())?;
                }
            }
            ControlNode::Array(array) => {
                let children = array.children.clone();
                let items = match value {
                    FormValue::List(items) => items,
                    other => return Err(self.shape_mismatch(id, other)),
                };
                if items.len() < children.len() {
                    return Err(FormError::MissingIndex { index: items.len() });
                }
                for (index, item) in items.into_iter().enumerate() {
                    let child = *children.get(index).ok_or(FormError::IndexOutOfBounds {
                        index,
                        len: children.len(),
                    })?;
                    self.set_value_inner(child, item, opts.only_self())?;
                }
            }
        }
        self.update_value_and_validity_inner(id, opts);
        Ok(())
    }

    //----------------------------------------------------------------------------------------------
    // Best-effort patch

    /// Patches the value of a control.
    ///
    /// Entries of the value without a matching control are ignored, and children without a matching
    /// entry are left as they are. Patching a container with `Null` does nothing.
    pub fn patch_value(&mut self, id: ControlId, value: impl Into<FormValue>, opts: SetOptions) -> FormResult<()> {
        let result = self.patch_value_inner(id, value.into(), opts);
        self.finish(result)
    }

    pub(crate) fn patch_value_inner(&mut self, id: ControlId, value: FormValue, opts: SetOptions) -> FormResult<()> {
        match &self.entry(id)?.node {
            ControlNode::Control(_) => return self.set_value_inner(id, value, opts),
            ControlNode::Group(group) => {
                let children = group.children.clone();
                match value {
                    FormValue::Null => return Ok(()),
                    FormValue::Map(map) => {
                        for (key, item) in map {
                            match children.get(&key) {
                                Some(&child) => self.patch_value_inner(child, item, opts.only_self())?,
                                None => warn!("patch_value: ignoring `{}`, no such control in {:?}", key, id),
                            }
                        }
                    }
                    other => warn!("patch_value: ignoring {} value patched into group {:?}", other.type_name(), id),
                }
            }
            ControlNode::Array(array) => {
                let children = array.children.clone();
                match value {
                    FormValue::Null => return Ok(()),
                    FormValue::List(items) => {
                        if items.len() > children.len() {
                            warn!(
                                "patch_value: ignoring {} trailing items patched into array {:?}",
                                items.len() - children.len(),
                                id
                            );
                        }
                        for (&child, item) in children.iter().zip(items) {
                            self.patch_value_inner(child, item, opts.only_self())?;
                        }
                    }
                    other => warn!("patch_value: ignoring {} value patched into array {:?}", other.type_name(), id),
                }
            }
        }
        self.update_value_and_validity_inner(id, opts);
        Ok(())
    }

    //----------------------------------------------------------------------------------------------
    // Reset

    /// Resets a control and its descendants: values are replaced by the matching part of `value`
    /// (`Null` where there is none), and everything is marked pristine and untouched.
    ///
    /// For leaves, a `{"value": ..., "disabled": bool}` map also sets the disabled state.
    pub fn reset(&mut self, id: ControlId, value: impl Into<FormValue>, opts: SetOptions) -> FormResult<()> {
        let result = self.reset_inner(id, value.into(), opts);
        self.finish(result)
    }

    pub(crate) fn reset_inner(&mut self, id: ControlId, value: FormValue, opts: SetOptions) -> FormResult<()> {
        match &self.entry(id)?.node {
            ControlNode::Control(_) => {
                let (value, disabled) = FormState::from_value(value).into_parts();
                let state_opts = SetOptions {
                    only_self: true,
                    emit_event: false,
                };
                match disabled {
                    Some(true) => self.disable_inner(id, state_opts),
                    Some(false) => self.enable_inner(id, state_opts),
                    None => {}
                }
                self.mark_as_pristine_inner(id, opts.only_self);
                self.mark_as_untouched_inner(id, opts.only_self);
                self.set_value_inner(id, value, opts)
            }
            ControlNode::Group(group) => {
                let children: Vec<_> = group.children.iter().map(|(key, &child)| (key.clone(), child)).collect();
                for (key, child) in children {
                    let item = value.get(&key).cloned().unwrap_or_default();
                    self.reset_inner(child, item, opts.only_self())?;
                }
                self.finish_container_reset(id, opts);
                Ok(())
            }
            ControlNode::Array(array) => {
                let children = array.children.clone();
                for (index, child) in children.into_iter().enumerate() {
                    let item = value.at(index).cloned().unwrap_or_default();
                    self.reset_inner(child, item, opts.only_self())?;
                }
                self.finish_container_reset(id, opts);
                Ok(())
            }
        }
    }

    fn finish_container_reset(&mut self, id: ControlId, opts: SetOptions) {
        self.update_pristine(id, opts.only_self);
        self.update_touched(id, opts.only_self);
        self.update_value_and_validity_inner(id, opts);
    }

    //----------------------------------------------------------------------------------------------
    // Enable / disable

    /// Disables a control and its descendants.
    ///
    /// A disabled control is exempt from validation and excluded from the value of its parent.
    pub fn disable(&mut self, id: ControlId, opts: SetOptions) -> FormResult<()> {
        self.entry(id)?;
        self.disable_inner(id, opts);
        self.finish(Ok(()))
    }

    pub(crate) fn disable_inner(&mut self, id: ControlId, opts: SetOptions) {
        let skip_pristine_check = self.parent_marked_dirty(id, opts.only_self);
        let entry = &mut self.controls[id];
        entry.status = Status::Disabled;
        entry.errors = None;
        for child in entry.node.children() {
            self.disable_inner(child, opts.only_self());
        }
        // recomputes the aggregate value, the status stays `Disabled`
        self.refresh(id);
        if opts.emit_event {
            self.emit(id);
        }
        self.update_ancestors(id, opts, skip_pristine_check);
    }

    /// Enables a control and its descendants, and recomputes their validity.
    pub fn enable(&mut self, id: ControlId, opts: SetOptions) -> FormResult<()> {
        self.entry(id)?;
        self.enable_inner(id, opts);
        self.finish(Ok(()))
    }

    pub(crate) fn enable_inner(&mut self, id: ControlId, opts: SetOptions) {
        let skip_pristine_check = self.parent_marked_dirty(id, opts.only_self);
        let entry = &mut self.controls[id];
        entry.status = Status::Valid;
        for child in entry.node.children() {
            self.enable_inner(child, opts.only_self());
        }
        self.update_value_and_validity_inner(id, opts.only_self());
        self.update_ancestors(id, opts, skip_pristine_check);
    }

    fn update_ancestors(&mut self, id: ControlId, opts: SetOptions, skip_pristine_check: bool) {
        if opts.only_self {
            return;
        }
        if let Some(parent) = self.controls[id].parent {
            self.update_value_and_validity_inner(parent, opts);
            if !skip_pristine_check {
                self.update_pristine(parent, false);
            }
            self.update_touched(parent, false);
        }
    }

    /// The parent was marked dirty directly rather than because of a dirty child.
    fn parent_marked_dirty(&self, id: ControlId, only_self: bool) -> bool {
        match self.controls[id].parent {
            Some(parent) if !only_self => {
                !self.controls[parent].pristine && !self.any_enabled_child(parent, |entry| !entry.pristine)
            }
            _ => false,
        }
    }

    fn any_enabled_child(&self, id: ControlId, condition: impl Fn(&ControlEntry) -> bool) -> bool {
        self.controls[id].node.children().iter().any(|&child| {
            let entry = &self.controls[child];
            entry.enabled() && condition(entry)
        })
    }

    //----------------------------------------------------------------------------------------------
    // Pristine / touched

    /// Marks the control dirty, and its ancestors unless `only_self` is true.
    pub fn mark_as_dirty(&mut self, id: ControlId, only_self: bool) -> FormResult<()> {
        self.entry_mut(id)?.pristine = false;
        if !only_self {
            if let Some(parent) = self.controls[id].parent {
                self.mark_as_dirty(parent, false)?;
            }
        }
        Ok(())
    }

    /// Marks the control and its descendants pristine, then re-derives the ancestors unless
    /// `only_self` is true.
    pub fn mark_as_pristine(&mut self, id: ControlId, only_self: bool) -> FormResult<()> {
        self.entry(id)?;
        self.mark_as_pristine_inner(id, only_self);
        Ok(())
    }

    fn mark_as_pristine_inner(&mut self, id: ControlId, only_self: bool) {
        let entry = &mut self.controls[id];
        entry.pristine = true;
        for child in entry.node.children() {
            self.mark_as_pristine_inner(child, true);
        }
        if !only_self {
            if let Some(parent) = self.controls[id].parent {
                self.update_pristine(parent, false);
            }
        }
    }

    /// Marks the control touched, and its ancestors unless `only_self` is true.
    pub fn mark_as_touched(&mut self, id: ControlId, only_self: bool) -> FormResult<()> {
        self.entry_mut(id)?.touched = true;
        if !only_self {
            if let Some(parent) = self.controls[id].parent {
                self.mark_as_touched(parent, false)?;
            }
        }
        Ok(())
    }

    /// Marks the control and all its descendants touched.
    pub fn mark_all_as_touched(&mut self, id: ControlId) -> FormResult<()> {
        let entry = self.entry_mut(id)?;
        entry.touched = true;
        for child in entry.node.children() {
            self.mark_all_as_touched(child)?;
        }
        Ok(())
    }

    /// Marks the control and its descendants untouched, then re-derives the ancestors unless
    /// `only_self` is true.
    pub fn mark_as_untouched(&mut self, id: ControlId, only_self: bool) -> FormResult<()> {
        self.entry(id)?;
        self.mark_as_untouched_inner(id, only_self);
        Ok(())
    }

    fn mark_as_untouched_inner(&mut self, id: ControlId, only_self: bool) {
        let entry = &mut self.controls[id];
        entry.touched = false;
        for child in entry.node.children() {
            self.mark_as_untouched_inner(child, true);
        }
        if !only_self {
            if let Some(parent) = self.controls[id].parent {
                self.update_touched(parent, false);
            }
        }
    }

    /// A container is pristine if none of its enabled children is dirty.
    fn update_pristine(&mut self, id: ControlId, only_self: bool) {
        let pristine = !self.any_enabled_child(id, |entry| !entry.pristine);
        self.controls[id].pristine = pristine;
        if !only_self {
            if let Some(parent) = self.controls[id].parent {
                self.update_pristine(parent, false);
            }
        }
    }

    /// A container is touched if any of its enabled children is touched.
    fn update_touched(&mut self, id: ControlId, only_self: bool) {
        let touched = self.any_enabled_child(id, |entry| entry.touched);
        self.controls[id].touched = touched;
        if !only_self {
            if let Some(parent) = self.controls[id].parent {
                self.update_touched(parent, false);
            }
        }
    }
}
