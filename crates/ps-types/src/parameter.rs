//! Parameter definitions: range, choice and fixed parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ParameterError;
use crate::value::{ParameterType, ParameterValue};

/// Values of a parent parameter paired with the parameters they activate.
///
/// Kept as an ordered list because float values are not hashable.
pub type Dependents = Vec<(ParameterValue, Vec<String>)>;

/// A single dimension of a search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Parameter {
    Range(RangeParameter),
    Choice(ChoiceParameter),
    Fixed(FixedParameter),
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Self::Range(p) => &p.name,
            Self::Choice(p) => &p.name,
            Self::Fixed(p) => &p.name,
        }
    }

    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Range(p) => p.parameter_type,
            Self::Choice(p) => p.parameter_type,
            Self::Fixed(p) => p.parameter_type,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.parameter_type().is_numeric()
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    pub fn is_log_scale(&self) -> bool {
        matches!(self, Self::Range(p) if p.log_scale)
    }

    pub fn is_fidelity(&self) -> bool {
        match self {
            Self::Range(p) => p.is_fidelity,
            Self::Choice(p) => p.is_fidelity,
            Self::Fixed(p) => p.is_fidelity,
        }
    }

    pub fn target_value(&self) -> Option<&ParameterValue> {
        match self {
            Self::Range(p) => p.target_value.as_ref(),
            Self::Choice(p) => p.target_value.as_ref(),
            Self::Fixed(p) => p.target_value.as_ref(),
        }
    }

    pub fn as_range(&self) -> Option<&RangeParameter> {
        match self {
            Self::Range(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&ChoiceParameter> {
        match self {
            Self::Choice(p) => Some(p),
            _ => None,
        }
    }

    /// Child parameters activated per value. Empty for range parameters.
    pub fn dependents(&self) -> &[(ParameterValue, Vec<String>)] {
        match self {
            Self::Range(_) => &[],
            Self::Choice(p) => &p.dependents,
            Self::Fixed(p) => &p.dependents,
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        !self.dependents().is_empty()
    }

    /// Whether `value` is of a type this parameter can hold.
    pub fn is_valid_type(&self, value: &ParameterValue) -> bool {
        self.parameter_type().is_valid_type(value)
    }

    /// Whether `value` lies in this parameter's domain.
    pub fn validate(&self, value: &ParameterValue) -> bool {
        match self {
            Self::Range(p) => p.validate(value),
            Self::Choice(p) => p.validate(value),
            Self::Fixed(p) => p.validate(value),
        }
    }

    /// Convert `value` into this parameter's canonical representation.
    pub fn cast(&self, value: &ParameterValue) -> Result<ParameterValue, ParameterError> {
        match self {
            Self::Range(p) => p.cast(value),
            _ => cast_to(self.name(), self.parameter_type(), value),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(p) => fmt::Display::fmt(p, f),
            Self::Choice(p) => fmt::Display::fmt(p, f),
            Self::Fixed(p) => fmt::Display::fmt(p, f),
        }
    }
}

impl From<RangeParameter> for Parameter {
    fn from(p: RangeParameter) -> Self {
        Self::Range(p)
    }
}

impl From<ChoiceParameter> for Parameter {
    fn from(p: ChoiceParameter) -> Self {
        Self::Choice(p)
    }
}

impl From<FixedParameter> for Parameter {
    fn from(p: FixedParameter) -> Self {
        Self::Fixed(p)
    }
}

fn cast_to(
    name: &str,
    parameter_type: ParameterType,
    value: &ParameterValue,
) -> Result<ParameterValue, ParameterError> {
    parameter_type
        .cast(value)
        .ok_or_else(|| ParameterError::CannotCast {
            name: name.to_string(),
            value: value.repr(),
            parameter_type: parameter_type.to_string(),
        })
}

fn check_type(
    name: &str,
    parameter_type: ParameterType,
    value: &ParameterValue,
) -> Result<ParameterValue, ParameterError> {
    if !parameter_type.is_valid_type(value) {
        return Err(ParameterError::InvalidType {
            name: name.to_string(),
            value: value.repr(),
            parameter_type: parameter_type.to_string(),
        });
    }
    cast_to(name, parameter_type, value)
}

fn validate_dependents(
    name: &str,
    dependents: &Dependents,
    is_valid: impl Fn(&ParameterValue) -> bool,
) -> Result<(), ParameterError> {
    for (i, (value, children)) in dependents.iter().enumerate() {
        if !is_valid(value) {
            return Err(ParameterError::InvalidDependentValue {
                name: name.to_string(),
                value: value.repr(),
            });
        }
        if children.is_empty() {
            return Err(ParameterError::EmptyDependents {
                name: name.to_string(),
                value: value.repr(),
            });
        }
        if dependents[..i].iter().any(|(seen, _)| seen.matches(value)) {
            return Err(ParameterError::DuplicateDependentValue {
                name: name.to_string(),
                value: value.repr(),
            });
        }
    }
    Ok(())
}

/// Largest rounding precision whose scale factor is a finite `f64`.
pub const MAX_DIGITS: u32 = f64::MAX_10_EXP as u32;

fn required_target(
    name: &str,
    target_value: Option<ParameterValue>,
) -> Result<ParameterValue, ParameterError> {
    target_value.ok_or_else(|| ParameterError::MissingTargetValue {
        name: name.to_string(),
    })
}

fn fmt_numeric(parameter_type: ParameterType, value: f64) -> String {
    match parameter_type {
        ParameterType::Int => format!("{}", value as i64),
        _ => format!("{value:?}"),
    }
}

fn fmt_dependents(dependents: &Dependents) -> String {
    let entries: Vec<String> = dependents
        .iter()
        .map(|(value, children)| {
            let names: Vec<String> = children.iter().map(|c| format!("'{c}'")).collect();
            format!("{}: [{}]", value.repr(), names.join(", "))
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn fmt_fidelity(target_value: Option<&ParameterValue>) -> String {
    match target_value {
        Some(v) => format!(", fidelity=true, target_value={}", v.repr()),
        None => ", fidelity=true".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A continuous or integer interval `[lower, upper]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct RangeParameter {
    name: String,
    parameter_type: ParameterType,
    lower: f64,
    upper: f64,
    log_scale: bool,
    digits: Option<u32>,
    is_fidelity: bool,
    target_value: Option<ParameterValue>,
}

impl RangeParameter {
    pub fn new(
        name: impl Into<String>,
        parameter_type: ParameterType,
        lower: f64,
        upper: f64,
    ) -> Result<Self, ParameterError> {
        let name = name.into();
        if !parameter_type.is_numeric() {
            return Err(ParameterError::NonNumericRange {
                name,
                parameter_type: parameter_type.to_string(),
            });
        }
        Self::check_bounds(&name, parameter_type, lower, upper, false)?;
        Ok(Self {
            name,
            parameter_type,
            lower,
            upper,
            log_scale: false,
            digits: None,
            is_fidelity: false,
            target_value: None,
        })
    }

    fn check_bounds(
        name: &str,
        parameter_type: ParameterType,
        lower: f64,
        upper: f64,
        log_scale: bool,
    ) -> Result<(), ParameterError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(ParameterError::NonFiniteBounds {
                name: name.to_string(),
            });
        }
        if parameter_type == ParameterType::Int && (lower.fract() != 0.0 || upper.fract() != 0.0)
        {
            return Err(ParameterError::NonIntegralBounds {
                name: name.to_string(),
                lower,
                upper,
            });
        }
        if lower >= upper {
            return Err(ParameterError::InvalidRange {
                name: name.to_string(),
                lower,
                upper,
            });
        }
        if log_scale && lower <= 0.0 {
            return Err(ParameterError::InvalidLogBounds {
                name: name.to_string(),
                lower,
            });
        }
        Ok(())
    }

    pub fn with_log_scale(mut self, log_scale: bool) -> Result<Self, ParameterError> {
        Self::check_bounds(&self.name, self.parameter_type, self.lower, self.upper, log_scale)?;
        self.log_scale = log_scale;
        Ok(self)
    }

    /// Round float casts to this many decimal digits.
    pub fn with_digits(mut self, digits: u32) -> Result<Self, ParameterError> {
        if digits > MAX_DIGITS {
            return Err(ParameterError::InvalidDigits {
                name: self.name,
                digits,
                max: MAX_DIGITS,
            });
        }
        self.digits = Some(digits);
        Ok(self)
    }

    /// Mark as a fidelity parameter whose target value models should aim for.
    pub fn with_fidelity(mut self, target_value: ParameterValue) -> Result<Self, ParameterError> {
        if !self.validate(&target_value) {
            return Err(ParameterError::InvalidValue {
                name: self.name,
                value: target_value.repr(),
            });
        }
        self.is_fidelity = true;
        self.target_value = Some(self.cast(&target_value)?);
        Ok(self)
    }

    /// Move one or both bounds, revalidating the interval.
    pub fn update_range(
        &mut self,
        lower: Option<f64>,
        upper: Option<f64>,
    ) -> Result<(), ParameterError> {
        let lower = lower.unwrap_or(self.lower);
        let upper = upper.unwrap_or(self.upper);
        Self::check_bounds(&self.name, self.parameter_type, lower, upper, self.log_scale)?;
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.parameter_type
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn log_scale(&self) -> bool {
        self.log_scale
    }

    pub fn digits(&self) -> Option<u32> {
        self.digits
    }

    pub fn validate(&self, value: &ParameterValue) -> bool {
        if !self.parameter_type.is_valid_type(value) {
            return false;
        }
        value
            .as_f64()
            .map_or(false, |v| self.lower <= v && v <= self.upper)
    }

    pub fn cast(&self, value: &ParameterValue) -> Result<ParameterValue, ParameterError> {
        let cast = cast_to(&self.name, self.parameter_type, value)?;
        match (cast, self.digits) {
            (ParameterValue::Float(v), Some(digits)) => {
                let scale = 10f64.powi(digits as i32);
                let scaled = v * scale;
                // Values too large to scale already carry fewer digits.
                if scaled.is_finite() {
                    Ok(ParameterValue::Float(scaled.round() / scale))
                } else {
                    Ok(ParameterValue::Float(v))
                }
            }
            (cast, _) => Ok(cast),
        }
    }
}

#[derive(Deserialize)]
struct RawRange {
    name: String,
    parameter_type: ParameterType,
    lower: f64,
    upper: f64,
    #[serde(default)]
    log_scale: bool,
    #[serde(default)]
    digits: Option<u32>,
    #[serde(default)]
    is_fidelity: bool,
    #[serde(default)]
    target_value: Option<ParameterValue>,
}

impl TryFrom<RawRange> for RangeParameter {
    type Error = ParameterError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        let mut range = Self::new(raw.name, raw.parameter_type, raw.lower, raw.upper)?
            .with_log_scale(raw.log_scale)?;
        if let Some(digits) = raw.digits {
            range = range.with_digits(digits)?;
        }
        if raw.is_fidelity {
            let target = required_target(&range.name, raw.target_value)?;
            range = range.with_fidelity(target)?;
        }
        Ok(range)
    }
}

impl fmt::Display for RangeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RangeParameter(name='{}', parameter_type={}, range=[{}, {}]",
            self.name,
            self.parameter_type,
            fmt_numeric(self.parameter_type, self.lower),
            fmt_numeric(self.parameter_type, self.upper),
        )?;
        if self.log_scale {
            f.write_str(", log_scale=true")?;
        }
        if let Some(digits) = self.digits {
            write!(f, ", digits={digits}")?;
        }
        if self.is_fidelity {
            f.write_str(&fmt_fidelity(self.target_value.as_ref()))?;
        }
        f.write_str(")")
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// A finite set of allowed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawChoice")]
pub struct ChoiceParameter {
    name: String,
    parameter_type: ParameterType,
    values: Vec<ParameterValue>,
    /// `values` as given, so sorting can be switched off again.
    #[serde(skip)]
    declared_values: Vec<ParameterValue>,
    is_ordered: bool,
    sort_values: bool,
    is_task: bool,
    is_fidelity: bool,
    target_value: Option<ParameterValue>,
    dependents: Dependents,
}

impl ChoiceParameter {
    /// Values are cast to `parameter_type`. Numeric choices are ordered and
    /// sorted by default; string choices are neither.
    pub fn new(
        name: impl Into<String>,
        parameter_type: ParameterType,
        values: Vec<ParameterValue>,
    ) -> Result<Self, ParameterError> {
        let name = name.into();
        if values.len() < 2 {
            return Err(ParameterError::TooFewValues {
                name,
                count: values.len(),
            });
        }
        let mut cast_values: Vec<ParameterValue> = Vec::with_capacity(values.len());
        for value in &values {
            let cast = check_type(&name, parameter_type, value)?;
            if cast_values.iter().any(|seen| seen.matches(&cast)) {
                return Err(ParameterError::DuplicateValue {
                    name,
                    value: cast.repr(),
                });
            }
            cast_values.push(cast);
        }

        let choice = Self {
            name,
            parameter_type,
            values: cast_values.clone(),
            declared_values: cast_values,
            is_ordered: parameter_type != ParameterType::String,
            sort_values: false,
            is_task: false,
            is_fidelity: false,
            target_value: None,
            dependents: Vec::new(),
        };
        Ok(choice.with_sort_values(parameter_type.is_numeric()))
    }

    pub fn with_is_ordered(mut self, is_ordered: bool) -> Self {
        self.is_ordered = is_ordered;
        self
    }

    /// Sort values ascending (numerically, or lexically for strings).
    /// Turning sorting off restores the declared order.
    pub fn with_sort_values(mut self, sort_values: bool) -> Self {
        self.sort_values = sort_values;
        self.values = self.declared_values.clone();
        if sort_values {
            self.values.sort_by(|a, b| match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            });
        }
        self
    }

    pub fn with_is_task(mut self, is_task: bool) -> Self {
        self.is_task = is_task;
        self
    }

    pub fn with_fidelity(mut self, target_value: ParameterValue) -> Result<Self, ParameterError> {
        if !self.validate(&target_value) {
            return Err(ParameterError::InvalidValue {
                name: self.name,
                value: target_value.repr(),
            });
        }
        self.is_fidelity = true;
        self.target_value = Some(cast_to(&self.name, self.parameter_type, &target_value)?);
        Ok(self)
    }

    /// Declare which parameters exist only when this one takes a given value.
    pub fn with_dependents(mut self, dependents: Dependents) -> Result<Self, ParameterError> {
        validate_dependents(&self.name, &dependents, |v| self.validate(v))?;
        self.dependents = dependents;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.parameter_type
    }

    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }

    pub fn is_ordered(&self) -> bool {
        self.is_ordered
    }

    pub fn sort_values(&self) -> bool {
        self.sort_values
    }

    pub fn is_task(&self) -> bool {
        self.is_task
    }

    pub fn validate(&self, value: &ParameterValue) -> bool {
        self.parameter_type.is_valid_type(value) && self.values.iter().any(|v| v.matches(value))
    }
}

impl PartialEq for ChoiceParameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameter_type == other.parameter_type
            && self.values == other.values
            && self.is_ordered == other.is_ordered
            && self.sort_values == other.sort_values
            && self.is_task == other.is_task
            && self.is_fidelity == other.is_fidelity
            && self.target_value == other.target_value
            && self.dependents == other.dependents
    }
}

#[derive(Deserialize)]
struct RawChoice {
    name: String,
    parameter_type: ParameterType,
    values: Vec<ParameterValue>,
    #[serde(default)]
    is_ordered: Option<bool>,
    #[serde(default)]
    sort_values: Option<bool>,
    #[serde(default)]
    is_task: bool,
    #[serde(default)]
    is_fidelity: bool,
    #[serde(default)]
    target_value: Option<ParameterValue>,
    #[serde(default)]
    dependents: Dependents,
}

impl TryFrom<RawChoice> for ChoiceParameter {
    type Error = ParameterError;

    fn try_from(raw: RawChoice) -> Result<Self, Self::Error> {
        let mut choice =
            Self::new(raw.name, raw.parameter_type, raw.values)?.with_is_task(raw.is_task);
        if let Some(is_ordered) = raw.is_ordered {
            choice = choice.with_is_ordered(is_ordered);
        }
        if let Some(sort_values) = raw.sort_values {
            choice = choice.with_sort_values(sort_values);
        }
        if raw.is_fidelity {
            let target = required_target(&choice.name, raw.target_value)?;
            choice = choice.with_fidelity(target)?;
        }
        if !raw.dependents.is_empty() {
            choice = choice.with_dependents(raw.dependents)?;
        }
        Ok(choice)
    }
}

impl fmt::Display for ChoiceParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(ParameterValue::repr).collect();
        write!(
            f,
            "ChoiceParameter(name='{}', parameter_type={}, values=[{}], is_ordered={}, sort_values={}",
            self.name,
            self.parameter_type,
            values.join(", "),
            self.is_ordered,
            self.sort_values,
        )?;
        if self.is_task {
            f.write_str(", is_task=true")?;
        }
        if self.is_fidelity {
            f.write_str(&fmt_fidelity(self.target_value.as_ref()))?;
        }
        if !self.dependents.is_empty() {
            write!(f, ", dependents={}", fmt_dependents(&self.dependents))?;
        }
        f.write_str(")")
    }
}

// ---------------------------------------------------------------------------
// Fixed
// ---------------------------------------------------------------------------

/// A parameter pinned to a single value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFixed")]
pub struct FixedParameter {
    name: String,
    parameter_type: ParameterType,
    value: ParameterValue,
    is_fidelity: bool,
    target_value: Option<ParameterValue>,
    dependents: Dependents,
}

impl FixedParameter {
    pub fn new(
        name: impl Into<String>,
        parameter_type: ParameterType,
        value: ParameterValue,
    ) -> Result<Self, ParameterError> {
        let name = name.into();
        let value = check_type(&name, parameter_type, &value)?;
        Ok(Self {
            name,
            parameter_type,
            value,
            is_fidelity: false,
            target_value: None,
            dependents: Vec::new(),
        })
    }

    pub fn with_fidelity(mut self, target_value: ParameterValue) -> Result<Self, ParameterError> {
        if !self.validate(&target_value) {
            return Err(ParameterError::InvalidValue {
                name: self.name,
                value: target_value.repr(),
            });
        }
        self.is_fidelity = true;
        self.target_value = Some(self.value.clone());
        Ok(self)
    }

    pub fn with_dependents(mut self, dependents: Dependents) -> Result<Self, ParameterError> {
        validate_dependents(&self.name, &dependents, |v| self.validate(v))?;
        self.dependents = dependents;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.parameter_type
    }

    pub fn value(&self) -> &ParameterValue {
        &self.value
    }

    pub fn validate(&self, value: &ParameterValue) -> bool {
        self.parameter_type.is_valid_type(value) && self.value.matches(value)
    }
}

#[derive(Deserialize)]
struct RawFixed {
    name: String,
    parameter_type: ParameterType,
    value: ParameterValue,
    #[serde(default)]
    is_fidelity: bool,
    #[serde(default)]
    target_value: Option<ParameterValue>,
    #[serde(default)]
    dependents: Dependents,
}

impl TryFrom<RawFixed> for FixedParameter {
    type Error = ParameterError;

    fn try_from(raw: RawFixed) -> Result<Self, Self::Error> {
        let mut fixed = Self::new(raw.name, raw.parameter_type, raw.value)?;
        if raw.is_fidelity {
            let target = raw.target_value.unwrap_or_else(|| fixed.value.clone());
            fixed = fixed.with_fidelity(target)?;
        }
        if !raw.dependents.is_empty() {
            fixed = fixed.with_dependents(raw.dependents)?;
        }
        Ok(fixed)
    }
}

impl fmt::Display for FixedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FixedParameter(name='{}', parameter_type={}, value={}",
            self.name,
            self.parameter_type,
            self.value.repr(),
        )?;
        if self.is_fidelity {
            f.write_str(&fmt_fidelity(self.target_value.as_ref()))?;
        }
        if !self.dependents.is_empty() {
            write!(f, ", dependents={}", fmt_dependents(&self.dependents))?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_range(name: &str, lower: f64, upper: f64) -> RangeParameter {
        RangeParameter::new(name, ParameterType::Float, lower, upper).unwrap()
    }

    fn ints(values: &[i64]) -> Vec<ParameterValue> {
        values.iter().copied().map(ParameterValue::Int).collect()
    }

    #[test]
    fn range_validates_bounds_and_type() {
        let a = float_range("a", 0.5, 5.5);
        assert!(a.validate(&ParameterValue::Float(1.0)));
        assert!(a.validate(&ParameterValue::Int(2)));
        assert!(!a.validate(&ParameterValue::Float(20.0)));
        assert!(!a.validate(&ParameterValue::from("notafloat")));

        let b = RangeParameter::new("b", ParameterType::Int, 2.0, 10.0).unwrap();
        assert!(b.validate(&ParameterValue::Int(5)));
        assert!(!b.validate(&ParameterValue::Float(5.2)));
    }

    #[test]
    fn bad_range_definitions_fail() {
        assert!(matches!(
            RangeParameter::new("x", ParameterType::Float, 1.0, 1.0),
            Err(ParameterError::InvalidRange { .. })
        ));
        assert!(matches!(
            RangeParameter::new("x", ParameterType::String, 0.0, 1.0),
            Err(ParameterError::NonNumericRange { .. })
        ));
        assert!(matches!(
            RangeParameter::new("x", ParameterType::Int, 0.5, 2.0),
            Err(ParameterError::NonIntegralBounds { .. })
        ));
        assert!(matches!(
            float_range("x", 0.0, 1.0).with_log_scale(true),
            Err(ParameterError::InvalidLogBounds { .. })
        ));
    }

    #[test]
    fn update_range_revalidates() {
        let mut a = float_range("a", 0.5, 5.5);
        a.update_range(None, Some(10.0)).unwrap();
        assert_eq!(a.upper(), 10.0);
        assert!(a.update_range(Some(11.0), None).is_err());
        assert_eq!(a.lower(), 0.5);
    }

    #[test]
    fn range_cast_rounds_to_digits() {
        let p = float_range("p", 0.0, 1.0).with_digits(2).unwrap();
        assert_eq!(
            p.cast(&ParameterValue::Float(0.12345)).unwrap(),
            ParameterValue::Float(0.12)
        );
        let b = Parameter::from(RangeParameter::new("b", ParameterType::Int, 2.0, 10.0).unwrap());
        assert_eq!(b.cast(&ParameterValue::Float(5.0)).unwrap(), ParameterValue::Int(5));
    }

    #[test]
    fn choice_defaults_and_sorting() {
        let e = ChoiceParameter::new(
            "e",
            ParameterType::Float,
            vec![0.5.into(), 0.0.into(), 0.2.into(), 0.1.into()],
        )
        .unwrap();
        assert!(e.is_ordered());
        assert!(e.sort_values());
        assert_eq!(
            e.to_string(),
            "ChoiceParameter(name='e', parameter_type=FLOAT, values=[0.0, 0.1, 0.2, 0.5], \
             is_ordered=true, sort_values=true)"
        );

        let c = ChoiceParameter::new(
            "c",
            ParameterType::String,
            vec!["foo".into(), "bar".into(), "baz".into()],
        )
        .unwrap();
        assert!(!c.is_ordered());
        assert_eq!(c.values()[0], ParameterValue::from("foo"));
    }

    #[test]
    fn digits_beyond_f64_precision_range_are_rejected() {
        assert!(matches!(
            float_range("p", 0.0, 1.0).with_digits(MAX_DIGITS + 1),
            Err(ParameterError::InvalidDigits { digits: 309, .. })
        ));
        assert!(float_range("p", 0.0, 1.0).with_digits(u32::MAX).is_err());

        let p = RangeParameter::new("p", ParameterType::Float, 0.0, 1e10)
            .unwrap()
            .with_digits(MAX_DIGITS)
            .unwrap();
        assert_eq!(p.cast(&0.5.into()).unwrap(), ParameterValue::Float(0.5));
        assert_eq!(p.cast(&1e9.into()).unwrap(), ParameterValue::Float(1e9));
    }

    #[test]
    fn unsorted_choice_keeps_declared_order() {
        let c = ChoiceParameter::new("c", ParameterType::Int, ints(&[7, 3, 5]))
            .unwrap()
            .with_sort_values(false);
        assert_eq!(c.values(), ints(&[7, 3, 5]).as_slice());
        assert!(c.is_ordered());
        assert!(!c.sort_values());

        let resorted = c.clone().with_sort_values(true);
        assert_eq!(resorted.values(), ints(&[3, 5, 7]).as_slice());
        assert_eq!(resorted.with_sort_values(false), c);
    }

    #[test]
    fn choice_rejects_bad_values() {
        assert!(matches!(
            ChoiceParameter::new("c", ParameterType::String, vec!["only".into()]),
            Err(ParameterError::TooFewValues { count: 1, .. })
        ));
        assert!(matches!(
            ChoiceParameter::new("c", ParameterType::Int, vec![1.into(), 1.0.into()]),
            Err(ParameterError::DuplicateValue { .. })
        ));
        assert!(matches!(
            ChoiceParameter::new("c", ParameterType::Int, vec![1.into(), "two".into()]),
            Err(ParameterError::InvalidType { .. })
        ));
    }

    #[test]
    fn dependents_must_reference_valid_values() {
        let model = ChoiceParameter::new(
            "model",
            ParameterType::String,
            vec!["Linear".into(), "XGBoost".into()],
        )
        .unwrap();
        let err = model
            .clone()
            .with_dependents(vec![("Forest".into(), vec!["depth".to_string()])])
            .unwrap_err();
        assert!(matches!(err, ParameterError::InvalidDependentValue { .. }));

        let model = model
            .with_dependents(vec![
                ("Linear".into(), vec!["learning_rate".to_string()]),
                ("XGBoost".into(), vec!["num_boost_rounds".to_string()]),
            ])
            .unwrap();
        let p = Parameter::from(model);
        assert!(p.is_hierarchical());
        assert!(p
            .to_string()
            .ends_with("dependents={'Linear': ['learning_rate'], 'XGBoost': ['num_boost_rounds']})"));
    }

    #[test]
    fn fixed_parameter_validation_and_display() {
        let d = FixedParameter::new("d", ParameterType::Bool, true.into()).unwrap();
        assert!(d.validate(&ParameterValue::Bool(true)));
        assert!(!d.validate(&ParameterValue::Bool(false)));
        assert_eq!(d.to_string(), "FixedParameter(name='d', parameter_type=BOOL, value=true)");
        assert!(FixedParameter::new("d", ParameterType::Bool, 1.into()).is_err());
    }

    #[test]
    fn range_display_includes_flags() {
        let f = RangeParameter::new("f", ParameterType::Int, 2.0, 10.0)
            .unwrap()
            .with_log_scale(true)
            .unwrap();
        assert_eq!(
            f.to_string(),
            "RangeParameter(name='f', parameter_type=INT, range=[2, 10], log_scale=true)"
        );
        let fid = float_range("epochs", 1.0, 100.0)
            .with_fidelity(100.0.into())
            .unwrap();
        assert!(fid.to_string().contains("fidelity=true, target_value=100.0"));
    }

    #[test]
    fn serde_round_trip_keeps_kind() {
        let p = Parameter::from(float_range("a", 0.5, 5.5));
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"kind\":\"range\""));
        let back: Parameter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        let choice = Parameter::from(
            ChoiceParameter::new("c", ParameterType::Int, ints(&[7, 3, 5]))
                .unwrap()
                .with_sort_values(false),
        );
        let back: Parameter = serde_json::from_str(&serde_json::to_string(&choice).unwrap()).unwrap();
        assert_eq!(back, choice);
    }

    #[test]
    fn deserializing_runs_constructor_checks() {
        let inverted_log_range = r#"{"kind": "range", "name": "x", "parameter_type": "float",
            "lower": 5.0, "upper": 1.0, "log_scale": true}"#;
        assert!(serde_json::from_str::<Parameter>(inverted_log_range).is_err());

        let non_positive_log = r#"{"kind": "range", "name": "x", "parameter_type": "float",
            "lower": 0.0, "upper": 1.0, "log_scale": true}"#;
        assert!(serde_json::from_str::<Parameter>(non_positive_log).is_err());

        let single_choice = r#"{"kind": "choice", "name": "c", "parameter_type": "string",
            "values": ["only"]}"#;
        assert!(serde_json::from_str::<Parameter>(single_choice).is_err());

        let bad_dependents = r#"{"kind": "choice", "name": "c", "parameter_type": "string",
            "values": ["a", "b"], "dependents": [["z", ["x"]]]}"#;
        assert!(serde_json::from_str::<Parameter>(bad_dependents).is_err());

        let fidelity_without_target = r#"{"kind": "range", "name": "epochs",
            "parameter_type": "int", "lower": 1, "upper": 10, "is_fidelity": true}"#;
        assert!(serde_json::from_str::<Parameter>(fidelity_without_target).is_err());

        let numeric_choice = r#"{"kind": "choice", "name": "c", "parameter_type": "int",
            "values": [7, 3, 5]}"#;
        let parsed: Parameter = serde_json::from_str(numeric_choice).unwrap();
        assert_eq!(parsed.as_choice().unwrap().values(), ints(&[3, 5, 7]).as_slice());
    }
}
