//! Form values.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A nested, framework-agnostic value held by (or written into) a control tree.
///
/// Maps preserve insertion order: iterating a `Map` visits keys in the order they were written.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<FormValue>),
    Map(IndexMap<String, FormValue>),
}

impl FormValue {
    /// Returns an empty map value.
    pub fn map() -> FormValue {
        FormValue::Map(IndexMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            FormValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FormValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, FormValue>> {
        match self {
            FormValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Looks up the item at `index` if this is a list.
    pub fn at(&self, index: usize) -> Option<&FormValue> {
        self.as_list().and_then(|items| items.get(index))
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FormValue::Null => "null",
            FormValue::Bool(_) => "bool",
            FormValue::Number(_) => "number",
            FormValue::String(_) => "string",
            FormValue::List(_) => "list",
            FormValue::Map(_) => "map",
        }
    }

    /// Converts this value to a `serde_json::Value`.
    ///
    /// Integral numbers become JSON integers so that they deserialize into integer types.
    /// Non-finite numbers have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FormValue::Null => serde_json::Value::Null,
            FormValue::Bool(b) => serde_json::Value::Bool(*b),
            FormValue::Number(n) => match as_integer(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            FormValue::String(s) => serde_json::Value::String(s.clone()),
            FormValue::List(items) => serde_json::Value::Array(items.iter().map(FormValue::to_json).collect()),
            FormValue::Map(map) => {
                serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }
}

fn as_integer(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < (1u64 << 53) as f64 {
        Some(n as i64)
    } else {
        None
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FormValue::Null => serializer.serialize_unit(),
            FormValue::Bool(b) => serializer.serialize_bool(*b),
            FormValue::Number(n) => match as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            FormValue::String(s) => serializer.serialize_str(s),
            FormValue::List(items) => items.serialize(serializer),
            FormValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

impl From<serde_json::Value> for FormValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FormValue::Null,
            serde_json::Value::Bool(b) => FormValue::Bool(b),
            serde_json::Value::Number(n) => FormValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => FormValue::String(s),
            serde_json::Value::Array(items) => FormValue::List(items.into_iter().map(FormValue::from).collect()),
            serde_json::Value::Object(map) => {
                FormValue::Map(map.into_iter().map(|(k, v)| (k, FormValue::from(v))).collect())
            }
        }
    }
}

/// Numeric conversions into `FormValue::Number`.
macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FormValue {
                fn from(n: $t) -> Self {
                    FormValue::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_owned())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FormValue::Null)
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(items: Vec<T>) -> Self {
        FormValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, FormValue>> for FormValue {
    fn from(map: IndexMap<String, FormValue>) -> Self {
        FormValue::Map(map)
    }
}

impl<K: Into<String>, V: Into<FormValue>> FromIterator<(K, V)> for FormValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FormValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
