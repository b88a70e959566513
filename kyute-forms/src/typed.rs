//! Typed control handles.
//!
//! `Control<T>`, `Group<T>` and `Array<T>` are `Copy` wrappers around a `ControlId` that remember
//! which Rust type the value of the control has. Values go through serde: `T` is serialized into a
//! `FormValue` when written, and deserialized from it when read.
//!
//! Partial writes (`patch_value`, `partial_sync`) take any serializable value. When patching a
//! group from a struct, mark optional fields with `#[serde(skip_serializing_if = "Option::is_none")]`
//! so that `None` leaves the corresponding control alone instead of writing `null` into it.
use crate::{
    template::ControlTemplate, ControlId, ControlKind, FormError, FormResult, FormTree, FormValue, SetOptions,
    StructureOptions,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Serializes a typed value into a form value.
pub fn to_form_value<T: Serialize + ?Sized>(value: &T) -> FormResult<FormValue> {
    Ok(serde_json::to_value(value)?.into())
}

fn check_kind(tree: &FormTree, id: ControlId, expected: ControlKind) -> FormResult<()> {
    let found = tree.kind(id)?;
    if found != expected {
        return Err(FormError::KindMismatch { id, expected, found });
    }
    Ok(())
}

macro_rules! impl_handle {
    ($handle:ident, $kind:expr, $value:ty, $input:ty) => {
        impl<T> $handle<T> {
            /// Instantiates `template` as a new root control.
            pub fn insert(tree: &mut FormTree, template: &ControlTemplate) -> FormResult<$handle<T>> {
                let id = tree.insert(template);
                if let Err(err) = check_kind(tree, id, $kind) {
                    tree.remove(id)?;
                    return Err(err);
                }
                Ok($handle::from_id_unchecked(id))
            }

            /// Wraps an existing control, checking its kind.
            pub fn from_id(tree: &FormTree, id: ControlId) -> FormResult<$handle<T>> {
                check_kind(tree, id, $kind)?;
                Ok($handle::from_id_unchecked(id))
            }

            fn from_id_unchecked(id: ControlId) -> $handle<T> {
                $handle {
                    id,
                    _phantom: PhantomData,
                }
            }

            pub fn id(self) -> ControlId {
                self.id
            }

            /// Resets the control, see `FormTree::reset`. `None` resets to empty.
            pub fn reset(self, tree: &mut FormTree, value: Option<&$input>, opts: SetOptions) -> FormResult<()>
            where
                T: Serialize,
            {
                let value = match value {
                    Some(value) => to_form_value(value)?,
                    None => FormValue::Null,
                };
                tree.reset(self.id, value, opts)
            }
        }

        impl<T> $handle<T>
        where
            T: Serialize + DeserializeOwned,
        {
            /// The value of the control, without disabled descendants.
            pub fn value(self, tree: &FormTree) -> FormResult<$value> {
                tree.value_as(self.id)
            }

            /// The value of the control, including disabled descendants.
            pub fn raw_value(self, tree: &FormTree) -> FormResult<$value> {
                tree.raw_value_as(self.id)
            }

            /// Strictly assigns a value, see `FormTree::set_value`.
            pub fn set_value(self, tree: &mut FormTree, value: &$input, opts: SetOptions) -> FormResult<()> {
                tree.set_value(self.id, to_form_value(value)?, opts)
            }

            /// Patches the control with any value of a compatible shape, see `FormTree::patch_value`.
            pub fn patch_value(self, tree: &mut FormTree, value: &impl Serialize, opts: SetOptions) -> FormResult<()> {
                tree.patch_value(self.id, to_form_value(value)?, opts)
            }
        }

        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $handle<T> {}

        impl<T> PartialEq for $handle<T> {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl<T> Eq for $handle<T> {}

        impl<T> Hash for $handle<T> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.debug_tuple(stringify!($handle)).field(&self.id).finish()
            }
        }

        impl<T> From<$handle<T>> for ControlId {
            fn from(handle: $handle<T>) -> ControlId {
                handle.id
            }
        }
    };
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Handle to a leaf control holding a `T`.
pub struct Control<T> {
    id: ControlId,
    _phantom: PhantomData<fn() -> T>,
}

impl_handle!(Control, ControlKind::Control, T, T);

impl Control<f64> {
    /// Writes an optional number. `None` clears the control.
    pub fn set_number(self, tree: &mut FormTree, value: Option<f64>, opts: SetOptions) -> FormResult<()> {
        tree.set_value(self.id, value, opts)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Handle to a group control whose value is a `T` (typically a struct).
pub struct Group<T> {
    id: ControlId,
    _phantom: PhantomData<fn() -> T>,
}

impl_handle!(Group, ControlKind::Group, T, T);

impl<T> Group<T> {
    /// The live control under `key`.
    pub fn get(self, tree: &FormTree, key: &str) -> Option<ControlId> {
        tree.get(self.id, key)
    }

    /// The live control under `key`, as a typed handle.
    pub fn control<U>(self, tree: &FormTree, key: &str) -> FormResult<Control<U>> {
        let id = tree.get(self.id, key).ok_or_else(|| FormError::UnknownKey { key: key.to_owned() })?;
        Control::from_id(tree, id)
    }

    /// The live group under `key`, as a typed handle.
    pub fn group<U>(self, tree: &FormTree, key: &str) -> FormResult<Group<U>> {
        let id = tree.get(self.id, key).ok_or_else(|| FormError::UnknownKey { key: key.to_owned() })?;
        Group::from_id(tree, id)
    }

    /// The live array under `key`, as a typed handle.
    pub fn array<U>(self, tree: &FormTree, key: &str) -> FormResult<Array<U>> {
        let id = tree.get(self.id, key).ok_or_else(|| FormError::UnknownKey { key: key.to_owned() })?;
        Array::from_id(tree, id)
    }
}

impl<T: Serialize> Group<T> {
    /// Re-creates the controls for the fields of `value`, then strictly assigns it.
    /// See `FormTree::full_sync`.
    pub fn full_sync(self, tree: &mut FormTree, value: &T, opts: SetOptions) -> FormResult<()> {
        tree.full_sync(self.id, to_form_value(value)?, opts)
    }

    /// Re-creates the controls for the fields of `value`, then patches it.
    /// See `FormTree::partial_sync`.
    pub fn partial_sync(self, tree: &mut FormTree, value: &impl Serialize, opts: SetOptions) -> FormResult<()> {
        tree.partial_sync(self.id, to_form_value(value)?, opts)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Handle to an array control whose items are `T`s.
pub struct Array<T> {
    id: ControlId,
    _phantom: PhantomData<fn() -> T>,
}

impl_handle!(Array, ControlKind::Array, Vec<T>, [T]);

impl<T> Array<T> {
    /// Item at `index`.
    pub fn at(self, tree: &FormTree, index: usize) -> Option<ControlId> {
        tree.at(self.id, index)
    }

    pub fn len(self, tree: &FormTree) -> usize {
        tree.len(self.id).unwrap_or(0)
    }

    pub fn is_empty(self, tree: &FormTree) -> bool {
        self.len(tree) == 0
    }

    /// Appends a new item built by the item constructor.
    pub fn push(self, tree: &mut FormTree, opts: StructureOptions) -> FormResult<ControlId> {
        tree.push(self.id, opts)
    }
}

impl<T: Serialize> Array<T> {
    /// Resizes the array to the length of `items`, then strictly assigns them.
    /// See `FormTree::full_sync`.
    pub fn full_sync(self, tree: &mut FormTree, items: &[T], opts: SetOptions) -> FormResult<()> {
        tree.full_sync(self.id, to_form_value(items)?, opts)
    }

    /// Resizes the array to the length of `items`, then patches them.
    /// See `FormTree::partial_sync`.
    pub fn partial_sync<U: Serialize>(self, tree: &mut FormTree, items: &[U], opts: SetOptions) -> FormResult<()> {
        tree.partial_sync(self.id, to_form_value(items)?, opts)
    }
}
