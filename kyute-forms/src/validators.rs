//! Synchronous validators.
use crate::FormValue;
use std::{collections::BTreeMap, fmt, rc::Rc};

/// Validation errors, keyed by validator name.
pub type ValidationErrors = BTreeMap<String, FormValue>;

/// A function that checks the value of a control and returns errors, or `None` if the value is valid.
#[derive(Clone)]
pub struct Validator(Rc<dyn Fn(&FormValue) -> Option<ValidationErrors>>);

impl Validator {
    pub fn new(f: impl Fn(&FormValue) -> Option<ValidationErrors> + 'static) -> Validator {
        Validator(Rc::new(f))
    }

    pub fn validate(&self, value: &FormValue) -> Option<ValidationErrors> {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

fn error(name: &str, detail: FormValue) -> Option<ValidationErrors> {
    Some(BTreeMap::from([(name.to_owned(), detail)]))
}

/// Null, the empty string and the empty list.
fn is_empty_input(value: &FormValue) -> bool {
    match value {
        FormValue::Null => true,
        FormValue::String(s) => s.is_empty(),
        FormValue::List(items) => items.is_empty(),
        _ => false,
    }
}

/// Leading-float parse of numbers and numeric strings.
fn numeric(value: &FormValue) -> Option<f64> {
    match value {
        FormValue::Number(n) if !n.is_nan() => Some(*n),
        FormValue::String(s) => {
            let s = s.trim_start();
            // longest prefix that parses
            (1..=s.len())
                .rev()
                .filter(|&end| s.is_char_boundary(end))
                .map(|end| &s[..end])
                .filter(|prefix| prefix.chars().all(|c| matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E')))
                .find_map(|prefix| prefix.parse::<f64>().ok())
                .filter(|n| !n.is_nan())
        }
        _ => None,
    }
}

fn length(value: &FormValue) -> Option<usize> {
    match value {
        FormValue::String(s) => Some(s.chars().count()),
        FormValue::List(items) => Some(items.len()),
        _ => None,
    }
}

/// Requires a non-empty value.
pub fn required() -> Validator {
    Validator::new(|value| {
        if is_empty_input(value) {
            error("required", true.into())
        } else {
            None
        }
    })
}

/// Requires a numeric value greater than or equal to `min`. Non-numeric values pass.
pub fn min(min: f64) -> Validator {
    Validator::new(move |value| match numeric(value) {
        Some(n) if !is_empty_input(value) && n < min => error(
            "min",
            [("min", FormValue::from(min)), ("actual", value.clone())].into_iter().collect(),
        ),
        _ => None,
    })
}

/// Requires a numeric value less than or equal to `max`. Non-numeric values pass.
pub fn max(max: f64) -> Validator {
    Validator::new(move |value| match numeric(value) {
        Some(n) if !is_empty_input(value) && n > max => error(
            "max",
            [("max", FormValue::from(max)), ("actual", value.clone())].into_iter().collect(),
        ),
        _ => None,
    })
}

/// Requires a string or list of at least `min_length` elements. Empty values pass.
pub fn min_length(min_length: usize) -> Validator {
    Validator::new(move |value| match length(value) {
        Some(len) if len > 0 && len < min_length => error(
            "minlength",
            [
                ("requiredLength", FormValue::from(min_length)),
                ("actualLength", FormValue::from(len)),
            ]
            .into_iter()
            .collect(),
        ),
        _ => None,
    })
}

/// Requires a string or list of at most `max_length` elements.
pub fn max_length(max_length: usize) -> Validator {
    Validator::new(move |value| match length(value) {
        Some(len) if len > max_length => error(
            "maxlength",
            [
                ("requiredLength", FormValue::from(max_length)),
                ("actualLength", FormValue::from(len)),
            ]
            .into_iter()
            .collect(),
        ),
        _ => None,
    })
}

/// Combines several validators into one that merges their errors.
pub fn compose(validators: Vec<Validator>) -> Validator {
    Validator::new(move |value| run_all(&validators, value))
}

/// Runs all validators on `value` and merges their errors.
pub(crate) fn run_all(validators: &[Validator], value: &FormValue) -> Option<ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for validator in validators {
        if let Some(e) = validator.validate(value) {
            errors.extend(e);
        }
    }
    (!errors.is_empty()).then_some(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_rejects_empty_inputs() {
        let v = required();
        assert!(v.validate(&FormValue::Null).is_some());
        assert!(v.validate(&"".into()).is_some());
        assert!(v.validate(&FormValue::List(vec![])).is_some());
        assert!(v.validate(&0.into()).is_none());
        assert!(v.validate(&false.into()).is_none());
    }

    #[test]
    fn min_max_bounds() {
        let lo = min(3.0);
        let errors = lo.validate(&2.into()).unwrap();
        assert_eq!(errors["min"], FormValue::from(json!({"min": 3, "actual": 2})));
        assert!(lo.validate(&"2.5kg".into()).is_some());
        assert!(lo.validate(&"abc".into()).is_none());
        assert!(lo.validate(&FormValue::Null).is_none());
        assert!(max(10.0).validate(&11.into()).is_some());
        assert!(max(10.0).validate(&10.into()).is_none());
    }

    #[test]
    fn length_bounds() {
        assert!(min_length(3).validate(&"ab".into()).is_some());
        assert!(min_length(3).validate(&"".into()).is_none());
        assert!(max_length(2).validate(&vec![1, 2, 3].into()).is_some());
        assert!(max_length(2).validate(&"été".into()).is_some());
        assert!(max_length(3).validate(&"été".into()).is_none());
    }

    #[test]
    fn compose_merges_errors() {
        let v = compose(vec![min_length(5), max(1.0)]);
        let errors = v.validate(&"2abc".into()).unwrap();
        assert!(errors.contains_key("minlength"));
        assert!(errors.contains_key("max"));
        assert!(v.validate(&"0.5".into()).is_some());
        assert!(compose(vec![]).validate(&FormValue::Null).is_none());
    }
}
