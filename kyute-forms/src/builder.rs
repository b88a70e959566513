//! Shorthands for building control templates.
use crate::{
    template::{ArrayConfig, ControlTemplate},
    FormState, FormValue,
};

/// Factory for control templates.
///
/// ```
/// use kyute_forms::{FormBuilder, FormTree, SetOptions};
///
/// let fb = FormBuilder::new();
/// let template = fb.group([
///     ("name", fb.control("")),
///     ("age", fb.number(None::<f64>)),
///     ("tags", fb.list(0, |_, _| "".into())),
/// ]);
///
/// let mut tree = FormTree::new();
/// let profile = tree.insert(&template);
/// tree.full_sync(
///     profile,
///     serde_json::json!({"name": "Ada", "age": "36", "tags": ["math", "engines"]}),
///     SetOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     tree.value(profile).unwrap().to_string(),
///     r#"{"name":"Ada","age":36,"tags":["math","engines"]}"#
/// );
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct FormBuilder;

impl FormBuilder {
    pub fn new() -> FormBuilder {
        FormBuilder
    }

    /// Leaf control.
    pub fn control(&self, value: impl Into<FormValue>) -> ControlTemplate {
        ControlTemplate::control(value)
    }

    /// Leaf control with an initial state, e.g. `FormState::disabled(value)`.
    pub fn control_state(&self, state: FormState) -> ControlTemplate {
        ControlTemplate::with_state(state)
    }

    /// Numeric leaf control, see `Coercion::Number`.
    pub fn number(&self, value: impl Into<FormValue>) -> ControlTemplate {
        ControlTemplate::number(value)
    }

    /// Numeric leaf control with an initial state.
    pub fn number_state(&self, state: FormState) -> ControlTemplate {
        ControlTemplate::number_with_state(state)
    }

    /// Group control from its initial controls.
    pub fn group<K: Into<String>>(&self, controls: impl IntoIterator<Item = (K, ControlTemplate)>) -> ControlTemplate {
        ControlTemplate::group(controls)
    }

    /// Array control with `size` initial items.
    pub fn array(
        &self,
        size: usize,
        construct_item: impl Fn(usize, Option<&[FormValue]>) -> ControlTemplate + 'static,
    ) -> ControlTemplate {
        ControlTemplate::array(ArrayConfig::new(size, construct_item))
    }

    /// Array of leaf controls, each item initialized with the value returned by `initial_value`.
    pub fn list(
        &self,
        size: usize,
        initial_value: impl Fn(usize, Option<&[FormValue]>) -> FormValue + 'static,
    ) -> ControlTemplate {
        self.array(size, move |index, values| ControlTemplate::control(initial_value(index, values)))
    }

    /// Array of groups (rows), see `Table`.
    pub fn table(
        &self,
        size: usize,
        construct_row: impl Fn(usize, Option<&[FormValue]>) -> ControlTemplate + 'static,
    ) -> ControlTemplate {
        self.array(size, construct_row)
    }
}
