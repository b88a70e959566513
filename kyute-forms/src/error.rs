use crate::{ControlId, ControlKind, FormValue};
use thiserror::Error;

/// Errors returned by control tree operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// The shape of a value does not match the kind of the control it is applied to.
    #[error("expected {} because the control is a {kind} ({id:?}), value: {value}", expected_shape(.kind))]
    ShapeMismatch {
        id: ControlId,
        kind: ControlKind,
        value: FormValue,
    },
    /// A value or an operation refers to a key that has no control in the group.
    #[error("cannot find form control with name: '{key}'")]
    UnknownKey { key: String },
    /// A strict assignment omitted the value of a control in the group.
    #[error("must supply a value for form control with name: '{key}'")]
    MissingValue { key: String },
    /// A strict assignment omitted the value of a control in the array.
    #[error("must supply a value for form control at index: {index}")]
    MissingIndex { index: usize },
    /// An index is past the end of an array.
    #[error("cannot find form control at index: {index} (array length is {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    /// The control handle is stale or belongs to another tree.
    #[error("no such control: {0:?}")]
    NoSuchControl(ControlId),
    /// The operation is not supported by this kind of control.
    #[error("expected a {expected} but {id:?} is a {found}")]
    KindMismatch {
        id: ControlId,
        expected: ControlKind,
        found: ControlKind,
    },
    /// Conversion between a typed value and a form value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn expected_shape(kind: &ControlKind) -> &'static str {
    match kind {
        ControlKind::Array => "a list",
        ControlKind::Group => "a map",
        ControlKind::Control => "any value",
    }
}

pub type FormResult<T> = Result<T, FormError>;
