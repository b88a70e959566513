//! Shape reconciliation.
//!
//! Before a value can be strictly assigned to a container, the container must have exactly the
//! children the value describes. `full_sync` and `partial_sync` first walk the control and the
//! value in lock-step and add or remove children until the shapes agree, then apply the value.
//!
//! # Details
//! The reconciliation pass:
//! - arrays: requires a list. Trailing items are removed until the array is no longer than the
//!   list, then new items are built with the array's item constructor (given the index of the new
//!   item and the whole list) until both have the same length. Each item is then reconciled with the
//!   corresponding list element.
//! - groups: requires a map. For each key of the map, in map order, a group that has no live control
//!   under that key re-creates it from its initial controls. Keys missing from the map are kept.
//!   Keys that are not initial controls of the group are skipped. Each live child is then
//!   reconciled with the corresponding map entry.
//! - leaves: nothing to do.
//!
//! Structural edits are silent: no events are emitted and values are not recomputed until the
//! assignment that follows.
use crate::{ControlId, ControlKind, FormResult, FormTree, FormValue, SetOptions};
use bitflags::bitflags;
use tracing::{debug, trace, trace_span};

bitflags! {
    /// Structural changes performed by a reconciliation pass.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ChangeFlags: u32 {
        const NONE = 0;
        /// At least one control was created.
        const CHILD_ADDED = (1 << 0);
        /// At least one control was destroyed.
        const CHILD_REMOVED = (1 << 1);
        /// Any structural change (CHILD_ADDED | CHILD_REMOVED).
        const STRUCTURE = Self::CHILD_ADDED.bits() | Self::CHILD_REMOVED.bits();
    }
}

impl FormTree {
    /// Makes the shape of the control match `value`, without assigning it.
    ///
    /// Values and statuses of the affected controls are recomputed silently.
    ///
    /// # Return value
    /// The structural changes that were made. On error, changes made before the error are kept.
    pub fn reconcile(&mut self, id: ControlId, value: &FormValue) -> FormResult<ChangeFlags> {
        let _span = trace_span!("reconcile", ?id).entered();
        let mut changes = ChangeFlags::NONE;
        let result = self.reconcile_inner(id, value, &mut changes);
        if changes.intersects(ChangeFlags::STRUCTURE) {
            self.refresh_structure(id);
        }
        result.map(|()| changes)
    }

    /// Reconciles the shape of the control with `value`, then strictly assigns it.
    ///
    /// `value` must be exhaustive: afterwards, every live child of a group must receive a value, so
    /// keys that are live but absent from `value` make the assignment fail with `MissingValue`.
    pub fn full_sync(&mut self, id: ControlId, value: impl Into<FormValue>, opts: SetOptions) -> FormResult<()> {
        let value = value.into();
        let _span = trace_span!("full_sync", ?id).entered();
        debug!("full_sync {:?} <- {}", id, value);
        let result = self.sync_then(id, value, opts, FormTree::set_value_inner);
        self.finish(result)
    }

    /// Reconciles the shape of the control with `value`, then patches it.
    ///
    /// Children absent from `value` are kept, with their current value. Arrays are still resized to
    /// the length of the list they receive.
    pub fn partial_sync(&mut self, id: ControlId, value: impl Into<FormValue>, opts: SetOptions) -> FormResult<()> {
        let value = value.into();
        let _span = trace_span!("partial_sync", ?id).entered();
        debug!("partial_sync {:?} <- {}", id, value);
        let result = self.sync_then(id, value, opts, FormTree::patch_value_inner);
        self.finish(result)
    }

    fn sync_then(
        &mut self,
        id: ControlId,
        value: FormValue,
        opts: SetOptions,
        assign: fn(&mut FormTree, ControlId, FormValue, SetOptions) -> FormResult<()>,
    ) -> FormResult<()> {
        let mut changes = ChangeFlags::NONE;
        let result = match self.reconcile_inner(id, &value, &mut changes) {
            Ok(()) => assign(self, id, value, opts),
            Err(err) => Err(err),
        };
        if result.is_err() && changes.intersects(ChangeFlags::STRUCTURE) {
            // the assignment did not run to completion, values of the edited containers may be stale
            self.refresh_structure(id);
        }
        result
    }

    fn reconcile_inner(&mut self, id: ControlId, value: &FormValue, changes: &mut ChangeFlags) -> FormResult<()> {
        match self.kind(id)? {
            ControlKind::Control => Ok(()),
            ControlKind::Array => {
                let items = match value {
                    FormValue::List(items) => items,
                    other => return Err(self.shape_mismatch(id, other.clone())),
                };
                let target_len = items.len();
                let mut len = self.array(id)?.children.len();
                if len != target_len {
                    trace!("resizing array {:?}: {} -> {}", id, len, target_len);
                }
                while len > target_len {
                    self.pop_array_child(id)?;
                    *changes |= ChangeFlags::CHILD_REMOVED;
                    len -= 1;
                }
                for index in len..target_len {
                    self.push_array_child(id, index, Some(items.as_slice()))?;
                    *changes |= ChangeFlags::CHILD_ADDED;
                }
                let children = self.array(id)?.children.clone();
                for (child, item) in children.into_iter().zip(items) {
                    self.reconcile_inner(child, item, changes)?;
                }
                Ok(())
            }
            ControlKind::Group => {
                let entries = match value {
                    FormValue::Map(entries) => entries,
                    other => return Err(self.shape_mismatch(id, other.clone())),
                };
                for (key, item) in entries {
                    let child = match self.get(id, key) {
                        Some(child) => child,
                        None => match self.restore_group_child(id, key)? {
                            Some(child) => {
                                trace!("restored `{}` in group {:?}", key, id);
                                *changes |= ChangeFlags::CHILD_ADDED;
                                child
                            }
                            None => {
                                trace!("skipping `{}`, not a control of group {:?}", key, id);
                                continue;
                            }
                        },
                    };
                    self.reconcile_inner(child, item, changes)?;
                }
                Ok(())
            }
        }
    }

    /// Silently recomputes a subtree whose structure changed, and its ancestors.
    fn refresh_structure(&mut self, id: ControlId) {
        self.refresh_subtree(id);
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            self.refresh(ancestor);
            current = self.parent(ancestor);
        }
    }
}
