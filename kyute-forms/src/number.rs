//! Numeric leaf controls.
use crate::FormValue;

/// Conversion applied to every value written into a leaf control.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Coercion {
    /// Values are stored as given.
    #[default]
    None,
    /// Values are converted to numbers, see [`to_number`].
    Number,
}

impl Coercion {
    pub fn apply(self, value: FormValue) -> FormValue {
        match self {
            Coercion::None => value,
            Coercion::Number => to_number(value),
        }
    }
}

/// Normalizes an input to a numeric form value.
///
/// `Null` and the empty string become `Null`. Everything else becomes a `Number`:
/// * numbers are kept,
/// * booleans map to `1` and `0`,
/// * strings are trimmed and parsed as decimal, hexadecimal (`0x`), octal (`0o`) or binary (`0b`)
///   literals, or as `Infinity` with an optional sign; a blank string is `0`,
/// * anything that doesn't parse, including lists and maps, is `NaN`.
pub fn to_number(value: FormValue) -> FormValue {
    match value {
        FormValue::Null => FormValue::Null,
        FormValue::String(ref s) if s.is_empty() => FormValue::Null,
        FormValue::String(s) => FormValue::Number(parse_number(&s)),
        FormValue::Number(n) => FormValue::Number(n),
        FormValue::Bool(b) => FormValue::Number(if b { 1.0 } else { 0.0 }),
        FormValue::List(_) | FormValue::Map(_) => FormValue::Number(f64::NAN),
    }
}

fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix).map(|n| n as f64).unwrap_or(f64::NAN);
    }

    // `f64::from_str` also accepts "inf" and "nan", which are not numeric literals here
    if !s.chars().all(|c| matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E')) {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::{to_number, Coercion};
    use crate::FormValue;

    fn num(value: impl Into<FormValue>) -> f64 {
        to_number(value.into()).as_f64().expect("expected a number")
    }

    #[test]
    fn empty_inputs_are_null() {
        assert_eq!(to_number(FormValue::Null), FormValue::Null);
        assert_eq!(to_number("".into()), FormValue::Null);
        assert_eq!(to_number(Option::<f64>::None.into()), FormValue::Null);
    }

    #[test]
    fn numeric_strings() {
        assert_eq!(num("42"), 42.0);
        assert_eq!(num("  -3.5 "), -3.5);
        assert_eq!(num("1e3"), 1000.0);
        assert_eq!(num(".5"), 0.5);
        assert_eq!(num("0x1A"), 26.0);
        assert_eq!(num("0b101"), 5.0);
        assert_eq!(num("   "), 0.0);
        assert_eq!(num("-Infinity"), f64::NEG_INFINITY);
        assert!(num("inf").is_nan());
        assert!(num("NaN").is_nan());
        assert!(num("12px").is_nan());
        assert!(num("0x").is_nan());
    }

    #[test]
    fn other_inputs() {
        assert_eq!(num(42), 42.0);
        assert_eq!(num(true), 1.0);
        assert_eq!(num(false), 0.0);
        assert!(num(vec![1]).is_nan());
        assert_eq!(Coercion::None.apply("42".into()), FormValue::from("42"));
    }
}
