//! Change notifications.
use crate::{ControlId, FormValue, Status};
use slotmap::SlotMap;
use std::{fmt, mem};
use tracing::trace;

slotmap::new_key_type! {
    /// Identifies a listener registered with `FormTree::subscribe`.
    pub struct SubscriptionId;
}

/// A change notification emitted by a control.
#[derive(Clone, Debug, PartialEq)]
pub enum FormEvent {
    /// The (aggregate) value of the control was recomputed.
    ValueChanged { id: ControlId, value: FormValue },
    /// The validation status of the control was recomputed.
    StatusChanged { id: ControlId, status: Status },
}

impl FormEvent {
    /// The control that emitted the event.
    pub fn id(&self) -> ControlId {
        match *self {
            FormEvent::ValueChanged { id, .. } | FormEvent::StatusChanged { id, .. } => id,
        }
    }
}

struct Subscription {
    target: ControlId,
    listener: Box<dyn FnMut(&FormEvent)>,
}

/// Pending events and listeners.
///
/// Events are queued while the tree is being modified and delivered by `flush`, once the operation
/// that produced them is complete.
#[derive(Default)]
pub(crate) struct EventQueue {
    pending: Vec<FormEvent>,
    subscriptions: SlotMap<SubscriptionId, Subscription>,
}

impl EventQueue {
    /// Returns whether any listener is registered.
    pub(crate) fn is_listening(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub(crate) fn push(&mut self, event: FormEvent) {
        self.pending.push(event);
    }

    pub(crate) fn subscribe(
        &mut self,
        target: ControlId,
        listener: impl FnMut(&FormEvent) + 'static,
    ) -> SubscriptionId {
        self.subscriptions.insert(Subscription {
            target,
            listener: Box::new(listener),
        })
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(id).is_some()
    }

    /// Drops the listeners of a destroyed control.
    pub(crate) fn forget(&mut self, target: ControlId) {
        self.subscriptions.retain(|id, sub| {
            let keep = sub.target != target;
            if !keep {
                trace!("dropping subscription {:?} of destroyed control {:?}", id, target);
            }
            keep
        });
    }

    /// Delivers all pending events, in emission order.
    pub(crate) fn flush(&mut self) {
        let events = mem::take(&mut self.pending);
        for event in &events {
            let target = event.id();
            for sub in self.subscriptions.values_mut() {
                if sub.target == target {
                    (sub.listener)(event);
                }
            }
        }
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
