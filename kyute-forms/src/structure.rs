//! Adding, removing and replacing child controls.
//!
//! Every public operation recomputes the value and status of the container and its ancestors,
//! then delivers the resulting change events. The `*_child` helpers do neither: they are used by
//! the reconciler, which edits the structure silently and leaves the update to the assignment that
//! follows.
use crate::{template::ControlTemplate, ControlId, FormError, FormResult, FormTree, FormValue, StructureOptions};
use tracing::trace;

impl FormTree {
    //----------------------------------------------------------------------------------------------
    // Silent edits

    /// Builds a new item with the array's item constructor and appends it.
    pub(crate) fn push_array_child(
        &mut self,
        array: ControlId,
        index: usize,
        values: Option<&[FormValue]>,
    ) -> FormResult<ControlId> {
        let template = self.array(array)?.config.construct(index, values);
        let child = self.instantiate(&template, Some(array));
        self.array_mut(array)?.children.push(child);
        Ok(child)
    }

    /// Detaches and destroys the last item of an array.
    pub(crate) fn pop_array_child(&mut self, array: ControlId) -> FormResult<Option<ControlId>> {
        let child = self.array_mut(array)?.children.pop();
        if let Some(child) = child {
            trace!("removing trailing item {:?} of {:?}", child, array);
            self.destroy(child);
        }
        Ok(child)
    }

    /// Re-creates a group child from the group's initial controls and appends it.
    ///
    /// Returns `None` if `key` is not one of the initial controls. Any live child under `key` is
    /// destroyed first.
    pub(crate) fn restore_group_child(&mut self, group: ControlId, key: &str) -> FormResult<Option<ControlId>> {
        let Some(template) = self.group(group)?.template.get(key).cloned() else {
            return Ok(None);
        };
        Ok(Some(self.replace_group_child(group, key, &template)?))
    }

    fn replace_group_child(&mut self, group: ControlId, key: &str, template: &ControlTemplate) -> FormResult<ControlId> {
        if let Some(previous) = self.group_mut(group)?.children.shift_remove(key) {
            trace!("replacing `{}` ({:?}) in {:?}", key, previous, group);
            self.destroy(previous);
        }
        let child = self.instantiate(template, Some(group));
        self.group_mut(group)?.children.insert(key.to_owned(), child);
        Ok(child)
    }

    fn check_template_key(&self, group: ControlId, key: &str) -> FormResult<()> {
        if self.group(group)?.template.contains_key(key) {
            Ok(())
        } else {
            Err(FormError::UnknownKey { key: key.to_owned() })
        }
    }

    /// Recomputes a container after a structural change and delivers the events.
    fn structure_changed<T>(&mut self, id: ControlId, opts: StructureOptions, result: T) -> FormResult<T> {
        self.update_value_and_validity_inner(id, opts.into());
        self.finish(Ok(result))
    }

    //----------------------------------------------------------------------------------------------
    // Arrays

    /// Appends a new item, built by the array's item constructor.
    pub fn push(&mut self, array: ControlId, opts: StructureOptions) -> FormResult<ControlId> {
        let index = self.array(array)?.children.len();
        let child = self.push_array_child(array, index, None)?;
        self.structure_changed(array, opts, child)
    }

    /// Inserts a new item at `index`. Indices past the end append.
    pub fn insert_at(&mut self, array: ControlId, index: usize, opts: StructureOptions) -> FormResult<ControlId> {
        let index = index.min(self.array(array)?.children.len());
        let template = self.array(array)?.config.construct(index, None);
        let child = self.instantiate(&template, Some(array));
        self.array_mut(array)?.children.insert(index, child);
        self.structure_changed(array, opts, child)
    }

    /// Removes and destroys the item at `index`.
    pub fn remove_at(&mut self, array: ControlId, index: usize, opts: StructureOptions) -> FormResult<()> {
        let children = &mut self.array_mut(array)?.children;
        let len = children.len();
        if index >= len {
            return Err(FormError::IndexOutOfBounds { index, len });
        }
        let child = children.remove(index);
        self.destroy(child);
        self.structure_changed(array, opts, ())
    }

    /// Replaces the item at `index` with a new instance of `template`. Indices past the end append.
    pub fn set_control_at(
        &mut self,
        array: ControlId,
        index: usize,
        template: &ControlTemplate,
        opts: StructureOptions,
    ) -> FormResult<ControlId> {
        self.array(array)?;
        let child = self.instantiate(template, Some(array));
        let children = &mut self.array_mut(array)?.children;
        let previous = if index < children.len() {
            Some(std::mem::replace(&mut children[index], child))
        } else {
            children.push(child);
            None
        };
        if let Some(previous) = previous {
            self.destroy(previous);
        }
        self.structure_changed(array, opts, child)
    }

    /// Removes and destroys all items.
    pub fn clear(&mut self, array: ControlId, opts: StructureOptions) -> FormResult<()> {
        let children = std::mem::take(&mut self.array_mut(array)?.children);
        if children.is_empty() {
            return Ok(());
        }
        for child in children {
            self.destroy(child);
        }
        self.structure_changed(array, opts, ())
    }

    //----------------------------------------------------------------------------------------------
    // Groups

    /// Adds the control `key` to the group, from the group's initial controls.
    ///
    /// If `key` is already live, the existing control is returned and the group is left unchanged.
    pub fn add_control(&mut self, group: ControlId, key: &str, opts: StructureOptions) -> FormResult<ControlId> {
        if let Some(existing) = self.group(group)?.children.get(key) {
            return Ok(*existing);
        }
        match self.restore_group_child(group, key)? {
            Some(child) => self.structure_changed(group, opts, child),
            None => Err(FormError::UnknownKey { key: key.to_owned() }),
        }
    }

    /// Replaces the control `key` with a fresh instance from the group's initial controls,
    /// discarding its current value and state.
    pub fn restore_control(&mut self, group: ControlId, key: &str, opts: StructureOptions) -> FormResult<ControlId> {
        match self.restore_group_child(group, key)? {
            Some(child) => self.structure_changed(group, opts, child),
            None => Err(FormError::UnknownKey { key: key.to_owned() }),
        }
    }

    /// Replaces (or adds) the control `key` with a new instance of `template`.
    ///
    /// `key` must be one of the group's initial controls.
    pub fn set_control(
        &mut self,
        group: ControlId,
        key: &str,
        template: &ControlTemplate,
        opts: StructureOptions,
    ) -> FormResult<ControlId> {
        self.check_template_key(group, key)?;
        let child = self.replace_group_child(group, key, template)?;
        self.structure_changed(group, opts, child)
    }

    /// Removes and destroys the control `key`. Removing a key that is not live does nothing, but
    /// the key must be one of the group's initial controls.
    pub fn remove_control(&mut self, group: ControlId, key: &str, opts: StructureOptions) -> FormResult<()> {
        self.check_template_key(group, key)?;
        if let Some(child) = self.group_mut(group)?.children.shift_remove(key) {
            self.destroy(child);
        }
        self.structure_changed(group, opts, ())
    }

    /// Returns whether the group has a live, enabled control under `key`.
    pub fn contains(&self, group: ControlId, key: &str) -> bool {
        self.get(group, key)
            .and_then(|child| self.controls.get(child))
            .map_or(false, |entry| entry.enabled())
    }
}
