//! Linear parameter constraints.
//!
//! Every constraint reduces to `Σ coefficient · value <= bound` over named
//! numeric range parameters. [`OrderConstraint`] and [`SumConstraint`] are
//! sugar over that shape which also remember the parameters they were built
//! from, so a search space can check they still match its own definitions.

use indexmap::IndexMap;
use ps_types::{ConstraintError, Parameter, Parameterization};
use serde::Serialize;
use std::fmt;

/// Slack allowed when comparing a weighted sum against its bound.
pub const CONSTRAINT_TOLERANCE: f64 = 1e-8;

/// Reject parameters a linear constraint cannot meaningfully reference.
pub(crate) fn validate_constraint_parameter(parameter: &Parameter) -> Result<(), ConstraintError> {
    let name = parameter.name().to_string();
    if !parameter.is_numeric() {
        return Err(ConstraintError::NonNumericParameter {
            parameter: name,
            parameter_type: parameter.parameter_type().to_string(),
        });
    }
    match parameter {
        Parameter::Choice(_) => Err(ConstraintError::ChoiceParameter { parameter: name }),
        Parameter::Fixed(_) => Err(ConstraintError::FixedParameter { parameter: name }),
        Parameter::Range(range) if range.log_scale() => {
            Err(ConstraintError::LogScaleParameter { parameter: name })
        }
        Parameter::Range(_) => Ok(()),
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ConstraintError> {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Err(ConstraintError::DuplicateParameter {
                parameter: name.to_string(),
            });
        }
        seen.push(name);
    }
    Ok(())
}

/// General weighted-sum constraint over parameter names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearConstraint {
    constraint_dict: IndexMap<String, f64>,
    bound: f64,
}

impl LinearConstraint {
    pub fn new(constraint_dict: IndexMap<String, f64>, bound: f64) -> Result<Self, ConstraintError> {
        if constraint_dict.is_empty() {
            return Err(ConstraintError::Empty);
        }
        if let Some((name, _)) = constraint_dict.iter().find(|(_, c)| !c.is_finite()) {
            return Err(ConstraintError::NonFiniteCoefficient {
                parameter: name.clone(),
            });
        }
        if !bound.is_finite() {
            return Err(ConstraintError::NonFiniteBound { bound });
        }
        Ok(Self {
            constraint_dict,
            bound,
        })
    }
}

/// `lower <= upper`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderConstraint {
    lower_parameter: Parameter,
    upper_parameter: Parameter,
}

impl OrderConstraint {
    pub fn new(lower: &Parameter, upper: &Parameter) -> Result<Self, ConstraintError> {
        validate_constraint_parameter(lower)?;
        validate_constraint_parameter(upper)?;
        check_unique([lower.name(), upper.name()].into_iter())?;
        Ok(Self {
            lower_parameter: lower.clone(),
            upper_parameter: upper.clone(),
        })
    }

    pub fn lower_parameter(&self) -> &Parameter {
        &self.lower_parameter
    }

    pub fn upper_parameter(&self) -> &Parameter {
        &self.upper_parameter
    }
}

/// `Σ parameters <= bound`, or `>= bound` when not an upper bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SumConstraint {
    parameters: Vec<Parameter>,
    is_upper_bound: bool,
    bound: f64,
}

impl SumConstraint {
    pub fn new(
        parameters: &[Parameter],
        is_upper_bound: bool,
        bound: f64,
    ) -> Result<Self, ConstraintError> {
        if parameters.is_empty() {
            return Err(ConstraintError::Empty);
        }
        if !bound.is_finite() {
            return Err(ConstraintError::NonFiniteBound { bound });
        }
        for parameter in parameters {
            validate_constraint_parameter(parameter)?;
        }
        check_unique(parameters.iter().map(Parameter::name))?;
        Ok(Self {
            parameters: parameters.to_vec(),
            is_upper_bound,
            bound,
        })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn is_upper_bound(&self) -> bool {
        self.is_upper_bound
    }
}

/// A linear inequality over numeric parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParameterConstraint {
    Linear(LinearConstraint),
    Order(OrderConstraint),
    Sum(SumConstraint),
}

impl ParameterConstraint {
    /// Coefficient per referenced parameter name.
    pub fn constraint_dict(&self) -> IndexMap<String, f64> {
        match self {
            Self::Linear(c) => c.constraint_dict.clone(),
            Self::Order(c) => IndexMap::from([
                (c.lower_parameter.name().to_string(), 1.0),
                (c.upper_parameter.name().to_string(), -1.0),
            ]),
            Self::Sum(c) => {
                let sign = if c.is_upper_bound { 1.0 } else { -1.0 };
                c.parameters
                    .iter()
                    .map(|p| (p.name().to_string(), sign))
                    .collect()
            }
        }
    }

    /// Right-hand side of the `<=` form.
    pub fn bound(&self) -> f64 {
        match self {
            Self::Linear(c) => c.bound,
            Self::Order(_) => 0.0,
            Self::Sum(c) if c.is_upper_bound => c.bound,
            Self::Sum(c) => -c.bound,
        }
    }

    /// Parameter definitions the constraint was built from, if any.
    pub fn referenced_parameters(&self) -> Vec<&Parameter> {
        match self {
            Self::Linear(_) => Vec::new(),
            Self::Order(c) => vec![&c.lower_parameter, &c.upper_parameter],
            Self::Sum(c) => c.parameters.iter().collect(),
        }
    }

    /// Swap in a new definition for a parameter this constraint was built from.
    pub(crate) fn replace_parameter(&mut self, parameter: &Parameter) {
        let slots: Vec<&mut Parameter> = match self {
            Self::Linear(_) => Vec::new(),
            Self::Order(c) => vec![&mut c.lower_parameter, &mut c.upper_parameter],
            Self::Sum(c) => c.parameters.iter_mut().collect(),
        };
        for slot in slots {
            if slot.name() == parameter.name() {
                *slot = parameter.clone();
            }
        }
    }

    /// Whether the weighted sum of `values` respects the bound.
    ///
    /// A referenced name missing from `values` counts as a violation.
    pub fn check(&self, values: &IndexMap<String, f64>) -> bool {
        let mut weighted_sum = 0.0;
        for (name, coefficient) in self.constraint_dict() {
            match values.get(&name) {
                Some(value) => weighted_sum += coefficient * value,
                None => return false,
            }
        }
        weighted_sum <= self.bound() + CONSTRAINT_TOLERANCE
    }

    /// [`check`](Self::check) over a parameterization, using its numeric values.
    pub fn check_parameterization(&self, parameters: &Parameterization) -> bool {
        let numeric: IndexMap<String, f64> = parameters
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_ref()
                    .and_then(|v| v.as_f64())
                    .map(|v| (name.clone(), v))
            })
            .collect();
        self.check(&numeric)
    }
}

impl fmt::Display for ParameterConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear(c) => {
                let terms: Vec<String> = c
                    .constraint_dict
                    .iter()
                    .map(|(name, coefficient)| format!("{coefficient:?}*{name}"))
                    .collect();
                write!(f, "ParameterConstraint({} <= {:?})", terms.join(" + "), c.bound)
            }
            Self::Order(c) => write!(
                f,
                "OrderConstraint({} <= {})",
                c.lower_parameter.name(),
                c.upper_parameter.name()
            ),
            Self::Sum(c) => {
                let names: Vec<&str> = c.parameters.iter().map(Parameter::name).collect();
                let op = if c.is_upper_bound { "<=" } else { ">=" };
                write!(f, "SumConstraint({} {op} {:?})", names.join(" + "), c.bound)
            }
        }
    }
}

impl From<LinearConstraint> for ParameterConstraint {
    fn from(c: LinearConstraint) -> Self {
        Self::Linear(c)
    }
}

impl From<OrderConstraint> for ParameterConstraint {
    fn from(c: OrderConstraint) -> Self {
        Self::Order(c)
    }
}

impl From<SumConstraint> for ParameterConstraint {
    fn from(c: SumConstraint) -> Self {
        Self::Sum(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_types::{ChoiceParameter, FixedParameter, ParameterType, RangeParameter};

    fn range(name: &str, parameter_type: ParameterType, lower: f64, upper: f64) -> Parameter {
        RangeParameter::new(name, parameter_type, lower, upper)
            .unwrap()
            .into()
    }

    fn values(pairs: &[(&str, f64)]) -> IndexMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn order_constraint_enforces_lower_le_upper() {
        let a = range("a", ParameterType::Float, 0.5, 5.5);
        let b = range("b", ParameterType::Int, 2.0, 10.0);
        let c: ParameterConstraint = OrderConstraint::new(&a, &b).unwrap().into();

        assert_eq!(c.to_string(), "OrderConstraint(a <= b)");
        assert_eq!(c.bound(), 0.0);
        assert!(c.check(&values(&[("a", 1.0), ("b", 5.0)])));
        assert!(c.check(&values(&[("a", 5.0), ("b", 5.0)])));
        assert!(!c.check(&values(&[("a", 5.3), ("b", 5.0)])));
        assert!(!c.check(&values(&[("a", 1.0)])));
    }

    #[test]
    fn sum_constraint_direction() {
        let a = range("a", ParameterType::Float, 0.0, 10.0);
        let b = range("b", ParameterType::Float, 0.0, 10.0);
        let upper: ParameterConstraint = SumConstraint::new(&[a.clone(), b.clone()], true, 10.0)
            .unwrap()
            .into();
        let lower: ParameterConstraint = SumConstraint::new(&[a, b], false, 10.0).unwrap().into();

        assert_eq!(upper.to_string(), "SumConstraint(a + b <= 10.0)");
        assert_eq!(lower.to_string(), "SumConstraint(a + b >= 10.0)");
        assert_eq!(lower.bound(), -10.0);
        assert_eq!(lower.constraint_dict()["a"], -1.0);

        let point = values(&[("a", 4.0), ("b", 7.0)]);
        assert!(!upper.check(&point));
        assert!(lower.check(&point));
    }

    #[test]
    fn linear_constraint_display_and_check() {
        let c: ParameterConstraint = LinearConstraint::new(
            IndexMap::from([("x".to_string(), 1.0), ("y".to_string(), -2.0)]),
            0.5,
        )
        .unwrap()
        .into();
        assert_eq!(c.to_string(), "ParameterConstraint(1.0*x + -2.0*y <= 0.5)");
        assert!(c.check(&values(&[("x", 1.0), ("y", 0.5)])));
        assert!(c.referenced_parameters().is_empty());
        assert!(matches!(
            LinearConstraint::new(IndexMap::new(), 0.0),
            Err(ConstraintError::Empty)
        ));
    }

    #[test]
    fn rejects_unsupported_parameters() {
        let a = range("a", ParameterType::Float, 0.5, 5.5);
        let d: Parameter = FixedParameter::new("d", ParameterType::Bool, true.into())
            .unwrap()
            .into();
        let e: Parameter = ChoiceParameter::new(
            "e",
            ParameterType::Float,
            vec![0.0.into(), 0.1.into(), 0.2.into()],
        )
        .unwrap()
        .into();
        let f: Parameter = RangeParameter::new("f", ParameterType::Int, 2.0, 10.0)
            .unwrap()
            .with_log_scale(true)
            .unwrap()
            .into();
        let h: Parameter = FixedParameter::new("h", ParameterType::Float, 1.0.into())
            .unwrap()
            .into();

        assert!(matches!(
            OrderConstraint::new(&a, &d),
            Err(ConstraintError::NonNumericParameter { .. })
        ));
        assert!(matches!(
            OrderConstraint::new(&a, &e),
            Err(ConstraintError::ChoiceParameter { .. })
        ));
        assert!(matches!(
            OrderConstraint::new(&a, &f),
            Err(ConstraintError::LogScaleParameter { .. })
        ));
        assert!(matches!(
            SumConstraint::new(&[a.clone(), h], true, 1.0),
            Err(ConstraintError::FixedParameter { .. })
        ));
        assert!(matches!(
            OrderConstraint::new(&a, &a),
            Err(ConstraintError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn check_parameterization_ignores_unset_and_non_numeric() {
        let a = range("a", ParameterType::Float, 0.0, 10.0);
        let b = range("b", ParameterType::Float, 0.0, 10.0);
        let c: ParameterConstraint = OrderConstraint::new(&a, &b).unwrap().into();

        let mut p = ps_types::parameterization! { "a" => 1.0, "b" => 2, "c" => "foo" };
        assert!(c.check_parameterization(&p));
        p.insert("b".to_string(), None);
        assert!(!c.check_parameterization(&p));
    }
}
