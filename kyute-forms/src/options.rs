use crate::validators::Validator;
use serde::{Deserialize, Serialize};

/// Options controlling how a value change propagates.
///
/// Forwarded unchanged from `full_sync`/`partial_sync` to the assignment that follows reconciliation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetOptions {
    /// When true, only this control is updated, not its ancestors.
    pub only_self: bool,
    /// When false, no value or status change events are emitted.
    pub emit_event: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        SetOptions {
            only_self: false,
            emit_event: true,
        }
    }
}

impl SetOptions {
    /// Default options, but without change events.
    pub const SILENT: SetOptions = SetOptions {
        only_self: false,
        emit_event: false,
    };

    /// Same options, but restricted to this control.
    pub const fn only_self(self) -> SetOptions {
        SetOptions {
            only_self: true,
            emit_event: self.emit_event,
        }
    }
}

/// Options for operations that add or remove child controls.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureOptions {
    pub emit_event: bool,
}

impl Default for StructureOptions {
    fn default() -> Self {
        StructureOptions { emit_event: true }
    }
}

impl From<StructureOptions> for SetOptions {
    fn from(opts: StructureOptions) -> Self {
        SetOptions {
            only_self: false,
            emit_event: opts.emit_event,
        }
    }
}

/// Per-control options given at construction.
#[derive(Clone, Debug, Default)]
pub struct ControlOptions {
    pub validators: Vec<Validator>,
}
