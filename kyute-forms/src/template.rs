//! Control templates: the recipes controls are instantiated from.
use crate::{number::Coercion, options::ControlOptions, validators::Validator, ControlKind, FormState, FormValue};
use indexmap::IndexMap;
use std::{fmt, rc::Rc};

/// Builds the template of an array item, given its index and, when the item is created to match a
/// value, the whole list being applied.
pub type ItemConstructor = Rc<dyn Fn(usize, Option<&[FormValue]>) -> ControlTemplate>;

/// Configuration of an array control.
#[derive(Clone)]
pub struct ArrayConfig {
    /// Number of items created when the array is instantiated.
    pub size: usize,
    /// Item constructor, also used to grow the array on sync.
    pub construct_item: ItemConstructor,
}

impl ArrayConfig {
    pub fn new(
        size: usize,
        construct_item: impl Fn(usize, Option<&[FormValue]>) -> ControlTemplate + 'static,
    ) -> ArrayConfig {
        ArrayConfig {
            size,
            construct_item: Rc::new(construct_item),
        }
    }

    pub(crate) fn construct(&self, index: usize, values: Option<&[FormValue]>) -> ControlTemplate {
        (self.construct_item)(index, values)
    }
}

impl fmt::Debug for ArrayConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArrayConfig").field("size", &self.size).finish_non_exhaustive()
    }
}

/// Recipe for a control (and its descendants).
///
/// Templates are values: instantiating the same template twice with `FormTree::insert` produces two
/// independent subtrees. Groups keep their initial controls for their whole lifetime, so that a
/// removed key can be re-created later.
#[derive(Clone, Debug)]
pub enum ControlTemplate {
    Control {
        state: FormState,
        coercion: Coercion,
        options: ControlOptions,
    },
    Group {
        controls: Rc<IndexMap<String, ControlTemplate>>,
        options: ControlOptions,
    },
    Array {
        config: ArrayConfig,
        options: ControlOptions,
    },
}

impl ControlTemplate {
    /// Leaf control with an initial value.
    pub fn control(value: impl Into<FormValue>) -> ControlTemplate {
        ControlTemplate::with_state(FormState::Value(value.into()))
    }

    /// Leaf control with an initial state (possibly disabled).
    pub fn with_state(state: FormState) -> ControlTemplate {
        ControlTemplate::Control {
            state,
            coercion: Coercion::None,
            options: ControlOptions::default(),
        }
    }

    /// Leaf control whose values are converted to numbers.
    pub fn number(value: impl Into<FormValue>) -> ControlTemplate {
        ControlTemplate::number_with_state(FormState::Value(value.into()))
    }

    /// Numeric leaf control with an initial state (possibly disabled).
    pub fn number_with_state(state: FormState) -> ControlTemplate {
        ControlTemplate::Control {
            state,
            coercion: Coercion::Number,
            options: ControlOptions::default(),
        }
    }

    /// Group from its initial controls.
    pub fn group<K: Into<String>>(controls: impl IntoIterator<Item = (K, ControlTemplate)>) -> ControlTemplate {
        ControlTemplate::Group {
            controls: Rc::new(controls.into_iter().map(|(k, t)| (k.into(), t)).collect()),
            options: ControlOptions::default(),
        }
    }

    /// Array from its configuration.
    pub fn array(config: ArrayConfig) -> ControlTemplate {
        ControlTemplate::Array {
            config,
            options: ControlOptions::default(),
        }
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            ControlTemplate::Control { .. } => ControlKind::Control,
            ControlTemplate::Group { .. } => ControlKind::Group,
            ControlTemplate::Array { .. } => ControlKind::Array,
        }
    }

    pub fn options(&self) -> &ControlOptions {
        match self {
            ControlTemplate::Control { options, .. }
            | ControlTemplate::Group { options, .. }
            | ControlTemplate::Array { options, .. } => options,
        }
    }

    fn options_mut(&mut self) -> &mut ControlOptions {
        match self {
            ControlTemplate::Control { options, .. }
            | ControlTemplate::Group { options, .. }
            | ControlTemplate::Array { options, .. } => options,
        }
    }

    /// Adds a validator.
    pub fn validator(mut self, validator: Validator) -> ControlTemplate {
        self.options_mut().validators.push(validator);
        self
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: ControlOptions) -> ControlTemplate {
        *self.options_mut() = options;
        self
    }
}
