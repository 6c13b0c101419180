//! Parameter values, parameter types and parameterizations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapping from parameter name to value, in insertion order.
///
/// `None` is the explicit "unset" sentinel: the name is present but carries
/// no value (for example in an out-of-design arm). Equality ignores order.
pub type Parameterization = IndexMap<String, Option<ParameterValue>>;

/// The value domain a parameter draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Bool,
    Int,
    Float,
    String,
}

impl ParameterType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Whether `value` can be held by a parameter of this type.
    ///
    /// Floats accept ints; ints accept floats with no fractional part.
    pub fn is_valid_type(&self, value: &ParameterValue) -> bool {
        match (self, value) {
            (Self::Bool, ParameterValue::Bool(_)) => true,
            (Self::String, ParameterValue::String(_)) => true,
            (Self::Float, ParameterValue::Int(_) | ParameterValue::Float(_)) => true,
            (Self::Int, ParameterValue::Int(_)) => true,
            (Self::Int, ParameterValue::Float(v)) => v.is_finite() && v.fract() == 0.0,
            _ => false,
        }
    }

    /// Convert `value` into the canonical representation of this type.
    ///
    /// Returns `None` when the value cannot be represented.
    pub fn cast(&self, value: &ParameterValue) -> Option<ParameterValue> {
        match (self, value) {
            (Self::Bool, ParameterValue::Bool(_)) | (Self::String, ParameterValue::String(_)) => {
                Some(value.clone())
            }
            (Self::Float, ParameterValue::Float(v)) => Some(ParameterValue::Float(*v)),
            (Self::Float, ParameterValue::Int(v)) => Some(ParameterValue::Float(*v as f64)),
            (Self::Int, ParameterValue::Int(v)) => Some(ParameterValue::Int(*v)),
            (Self::Int, ParameterValue::Float(v)) if v.is_finite() => {
                Some(ParameterValue::Int(v.round() as i64))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bool => "BOOL",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::String => "STRING",
        };
        f.write_str(label)
    }
}

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParameterValue {
    /// Numeric view of the value (ints widen to `f64`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// The type a value carries on its own.
    pub fn natural_type(&self) -> ParameterType {
        match self {
            Self::Bool(_) => ParameterType::Bool,
            Self::Int(_) => ParameterType::Int,
            Self::Float(_) => ParameterType::Float,
            Self::String(_) => ParameterType::String,
        }
    }

    /// Equality that treats numerically equal ints and floats as the same value.
    pub fn matches(&self, other: &ParameterValue) -> bool {
        match (self, other) {
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }

    /// Quoted form used in canonical representations (`'foo'`, `0.5`, `true`).
    pub fn repr(&self) -> String {
        match self {
            Self::String(v) => format!("'{v}'"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Render a parameterization as `{name: value, ...}` with unset values as `None`.
pub fn format_parameterization(parameters: &Parameterization) -> String {
    let entries: Vec<String> = parameters
        .iter()
        .map(|(name, value)| match value {
            Some(v) => format!("'{name}': {}", v.repr()),
            None => format!("'{name}': None"),
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Build a [`Parameterization`] from `name => value` pairs.
///
/// ```
/// use ps_types::{parameterization, ParameterValue};
///
/// let p = parameterization! { "model" => "Linear", "learning_rate" => 0.01 };
/// assert_eq!(p["learning_rate"], Some(ParameterValue::Float(0.01)));
/// ```
#[macro_export]
macro_rules! parameterization {
    () => {
        $crate::Parameterization::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Parameterization::new();
        $(
            map.insert(
                ::std::string::String::from($name),
                ::std::option::Option::Some($crate::ParameterValue::from($value)),
            );
        )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_type_accepts_whole_floats_only() {
        assert!(ParameterType::Int.is_valid_type(&ParameterValue::Float(5.0)));
        assert!(!ParameterType::Int.is_valid_type(&ParameterValue::Float(5.2)));
        assert!(ParameterType::Float.is_valid_type(&ParameterValue::Int(5)));
        assert!(!ParameterType::String.is_valid_type(&ParameterValue::Int(5)));
    }

    #[test]
    fn cast_rounds_floats_into_ints() {
        assert_eq!(
            ParameterType::Int.cast(&ParameterValue::Float(4.6)),
            Some(ParameterValue::Int(5))
        );
        assert_eq!(
            ParameterType::Float.cast(&ParameterValue::Int(2)),
            Some(ParameterValue::Float(2.0))
        );
        assert_eq!(ParameterType::Bool.cast(&ParameterValue::Int(1)), None);
    }

    #[test]
    fn numeric_values_match_across_variants() {
        assert!(ParameterValue::Int(1).matches(&ParameterValue::Float(1.0)));
        assert!(!ParameterValue::Int(1).matches(&ParameterValue::Bool(true)));
        assert!(ParameterValue::from("a").matches(&ParameterValue::from("a")));
    }

    #[test]
    fn display_and_repr() {
        assert_eq!(ParameterValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ParameterValue::from("Linear").to_string(), "Linear");
        assert_eq!(ParameterValue::from("Linear").repr(), "'Linear'");
        assert_eq!(ParameterType::Float.to_string(), "FLOAT");
    }

    #[test]
    fn untagged_serde_keeps_ints_and_floats_apart() {
        let values: Vec<ParameterValue> = serde_json::from_str(r#"[5, 5.0, true, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParameterValue::Int(5),
                ParameterValue::Float(5.0),
                ParameterValue::Bool(true),
                ParameterValue::from("x"),
            ]
        );
    }

    #[test]
    fn parameterization_macro_and_order_insensitive_eq() {
        let a = parameterization! { "x" => 1, "y" => "foo" };
        let b = parameterization! { "y" => "foo", "x" => 1 };
        assert_eq!(a, b);
        assert_eq!(format_parameterization(&a), "{'x': 1, 'y': 'foo'}");
    }
}
