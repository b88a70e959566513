//! Control identifiers, kinds, statuses and initial states.
use crate::FormValue;
use serde::{Deserialize, Serialize};
use std::fmt;

slotmap::new_key_type! {
    /// Handle to a control in a `FormTree`.
    pub struct ControlId;
}

/// The three kinds of nodes in a control tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// A leaf holding a single value.
    Control,
    /// Named children, keys fixed by the initial controls.
    Group,
    /// Indexed children, dynamic length.
    Array,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlKind::Control => f.write_str("FormControl"),
            ControlKind::Group => f.write_str("FormGroup"),
            ControlKind::Array => f.write_str("FormArray"),
        }
    }
}

/// Validation status of a control.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// All validation checks passed.
    Valid,
    /// At least one validation check failed, on this control or on an enabled descendant.
    Invalid,
    /// Exempt from validation and excluded from the aggregate value of its parent.
    Disabled,
}

/// Initial (or reset) state of a leaf control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormState {
    /// A value together with a disabled flag.
    Boxed { value: FormValue, disabled: bool },
    /// A plain value, the control is enabled.
    Value(FormValue),
}

impl FormState {
    /// Plain enabled state.
    pub fn value(value: impl Into<FormValue>) -> FormState {
        FormState::Value(value.into())
    }

    /// Disabled state holding `value`.
    pub fn disabled(value: impl Into<FormValue>) -> FormState {
        FormState::Boxed {
            value: value.into(),
            disabled: true,
        }
    }

    /// Interprets a value passed to `reset`: a map with exactly the keys `value` and `disabled`
    /// (the latter a boolean) is a boxed state, anything else is a plain value.
    pub fn from_value(value: FormValue) -> FormState {
        if let FormValue::Map(map) = &value {
            if map.len() == 2 {
                if let (Some(inner), Some(FormValue::Bool(disabled))) = (map.get("value"), map.get("disabled")) {
                    return FormState::Boxed {
                        value: inner.clone(),
                        disabled: *disabled,
                    };
                }
            }
        }
        FormState::Value(value)
    }

    /// Splits the state into the value and the disabled flag (`None` for plain values).
    pub fn into_parts(self) -> (FormValue, Option<bool>) {
        match self {
            FormState::Boxed { value, disabled } => (value, Some(disabled)),
            FormState::Value(value) => (value, None),
        }
    }
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Value(FormValue::Null)
    }
}

impl From<FormValue> for FormState {
    fn from(value: FormValue) -> Self {
        FormState::Value(value)
    }
}
