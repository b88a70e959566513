//! Typed reactive form controls.
//!
//! A `FormTree` holds form controls: leaves (`Control`), named containers (`Group`) and indexed
//! containers (`Array`). Containers aggregate the values of their children, run validators and
//! track pristine/touched state, and every change is reported to listeners registered with
//! `FormTree::subscribe`.
//!
//! On top of the usual strict `set_value` and lenient `patch_value`, `full_sync` and `partial_sync`
//! first reshape containers to fit the incoming value: arrays grow or shrink to the length of the
//! list, and groups re-create controls that were removed. See the `sync` module.
//!
//! # Features
//! * values convert to and from any serde type (`value_as`, typed handles in `typed`)
//! * numeric leaves coerce user input to numbers (`Coercion::Number`)

// public modules
pub mod builder;
pub mod number;
pub mod sync;
pub mod table;
pub mod typed;
pub mod validators;

// internal modules
mod control;
mod error;
mod event;
mod options;
mod structure;
mod template;
mod tree;
mod update;
mod value;

// public exports
pub use builder::FormBuilder;
pub use control::{ControlId, ControlKind, FormState, Status};
pub use error::{FormError, FormResult};
pub use event::{FormEvent, SubscriptionId};
pub use number::Coercion;
pub use options::{ControlOptions, SetOptions, StructureOptions};
pub use sync::ChangeFlags;
pub use table::Table;
pub use template::{ArrayConfig, ControlTemplate, ItemConstructor};
pub use tree::FormTree;
pub use typed::{Array, Control, Group};
pub use validators::{ValidationErrors, Validator};
pub use value::FormValue;
