//! Search space definitions: parameters, constraints, membership and casting.

use indexmap::IndexMap;
use ps_types::{
    Arm, ObservationFeatures, Parameter, ParameterValue, Parameterization, PsResult,
    RangeParameter, SearchSpaceError,
};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::constraint::{validate_constraint_parameter, ParameterConstraint};
use crate::digest::SearchSpaceDigest;
use ps_types::{ConstraintError, DigestError};

/// The full search space: an ordered, name-keyed set of parameters plus the
/// linear constraints limiting valid combinations.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSpace {
    parameters: IndexMap<String, Parameter>,
    parameter_constraints: Vec<ParameterConstraint>,
}

impl SearchSpace {
    pub fn new(
        parameters: Vec<Parameter>,
        parameter_constraints: Vec<ParameterConstraint>,
    ) -> PsResult<Self> {
        let mut by_name = IndexMap::with_capacity(parameters.len());
        for parameter in parameters {
            let name = parameter.name().to_string();
            if by_name.contains_key(&name) {
                return Err(SearchSpaceError::DuplicateParameter { parameter: name }.into());
            }
            by_name.insert(name, parameter);
        }
        validate_parameter_constraints(&by_name, &parameter_constraints)?;

        debug!(
            "Constructed search space with {} parameters and {} constraints",
            by_name.len(),
            parameter_constraints.len()
        );
        Ok(Self {
            parameters: by_name,
            parameter_constraints,
        })
    }

    pub fn parameters(&self) -> &IndexMap<String, Parameter> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn parameter_constraints(&self) -> &[ParameterConstraint] {
        &self.parameter_constraints
    }

    /// Parameters an optimizer can actually move (everything but fixed ones).
    pub fn tunable_parameters(&self) -> Vec<&Parameter> {
        self.parameters.values().filter(|p| !p.is_fixed()).collect()
    }

    pub fn range_parameters(&self) -> Vec<&RangeParameter> {
        self.parameters.values().filter_map(Parameter::as_range).collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> PsResult<()> {
        let name = parameter.name().to_string();
        if self.parameters.contains_key(&name) {
            return Err(SearchSpaceError::DuplicateParameter { parameter: name }.into());
        }
        debug!("Adding parameter {}", name);
        self.parameters.insert(name, parameter);
        Ok(())
    }

    /// Replace a parameter definition. Bounds and values may change; the
    /// parameter type may not. Constraints built from the old definition
    /// follow the new one and are revalidated.
    pub fn update_parameter(&mut self, parameter: Parameter) -> PsResult<()> {
        let name = parameter.name().to_string();
        let current = self
            .parameters
            .get(&name)
            .ok_or_else(|| SearchSpaceError::ParameterNotFound {
                parameter: name.clone(),
            })?;
        if current.parameter_type() != parameter.parameter_type() {
            return Err(SearchSpaceError::TypeChange {
                parameter: name,
                from: current.parameter_type().to_string(),
                to: parameter.parameter_type().to_string(),
            }
            .into());
        }

        let mut parameters = self.parameters.clone();
        parameters.insert(name.clone(), parameter.clone());
        let mut constraints = self.parameter_constraints.clone();
        for constraint in &mut constraints {
            constraint.replace_parameter(&parameter);
        }
        validate_parameter_constraints(&parameters, &constraints)?;

        debug!("Updated parameter {}", name);
        self.parameters = parameters;
        self.parameter_constraints = constraints;
        Ok(())
    }

    /// Remove a parameter that no constraint references.
    pub fn remove_parameter(&mut self, name: &str) -> PsResult<Parameter> {
        if self
            .parameter_constraints
            .iter()
            .any(|c| c.constraint_dict().contains_key(name))
        {
            return Err(ps_types::validation_error!(
                "Parameter `{}` is referenced by a constraint and cannot be removed",
                name
            ));
        }
        self.parameters
            .shift_remove(name)
            .ok_or_else(|| {
                SearchSpaceError::ParameterNotFound {
                    parameter: name.to_string(),
                }
                .into()
            })
    }

    pub fn set_parameter_constraints(
        &mut self,
        parameter_constraints: Vec<ParameterConstraint>,
    ) -> PsResult<()> {
        validate_parameter_constraints(&self.parameters, &parameter_constraints)?;
        self.parameter_constraints = parameter_constraints;
        Ok(())
    }

    pub fn add_parameter_constraints(
        &mut self,
        parameter_constraints: Vec<ParameterConstraint>,
    ) -> PsResult<()> {
        validate_parameter_constraints(&self.parameters, &parameter_constraints)?;
        self.parameter_constraints.extend(parameter_constraints);
        Ok(())
    }

    /// Whether the names in `parameterization` are exactly this space's names.
    pub fn check_all_parameters_present(&self, parameterization: &Parameterization) -> bool {
        self.validate_all_parameters_present(parameterization).is_ok()
    }

    pub fn validate_all_parameters_present(
        &self,
        parameterization: &Parameterization,
    ) -> Result<(), SearchSpaceError> {
        let unknown: Vec<String> = parameterization
            .keys()
            .filter(|name| !self.parameters.contains_key(*name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SearchSpaceError::UnknownParameters {
                parameters: unknown,
            });
        }
        let missing: Vec<String> = self
            .parameters
            .keys()
            .filter(|name| !parameterization.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SearchSpaceError::MissingParameters {
                parameters: missing,
            });
        }
        Ok(())
    }

    /// Whether `parameterization` is a point of this space.
    pub fn check_membership(&self, parameterization: &Parameterization) -> bool {
        match self.validate_membership(parameterization) {
            Ok(()) => true,
            Err(e) => {
                debug!("Parameterization is not a member of the search space: {}", e);
                false
            }
        }
    }

    /// Like [`check_membership`](Self::check_membership), reporting the first
    /// kind of problem found: unknown names, then missing names, then every
    /// out-of-domain value, then the first violated constraint.
    pub fn validate_membership(
        &self,
        parameterization: &Parameterization,
    ) -> Result<(), SearchSpaceError> {
        self.validate_all_parameters_present(parameterization)?;

        let mut parameters = Vec::new();
        let mut values = Vec::new();
        for (name, value) in parameterization {
            let parameter =
                self.parameters
                    .get(name)
                    .ok_or_else(|| SearchSpaceError::UnknownParameters {
                        parameters: vec![name.clone()],
                    })?;
            if !value.as_ref().map_or(false, |v| parameter.validate(v)) {
                parameters.push(name.clone());
                values.push(repr_or_none(value.as_ref()));
            }
        }
        if !parameters.is_empty() {
            return Err(SearchSpaceError::OutOfDomain { parameters, values });
        }

        if let Some(violated) = self
            .parameter_constraints
            .iter()
            .find(|c| !c.check_parameterization(parameterization))
        {
            return Err(SearchSpaceError::ConstraintViolated {
                constraint: violated.to_string(),
            });
        }
        Ok(())
    }

    /// Whether each present value has the right type for its parameter.
    /// Bounds and constraints are ignored; unset values are skipped.
    pub fn check_types(&self, parameterization: &Parameterization) -> bool {
        self.validate_types(parameterization).is_ok()
    }

    pub fn validate_types(&self, parameterization: &Parameterization) -> Result<(), SearchSpaceError> {
        for (name, value) in parameterization {
            let parameter =
                self.parameters
                    .get(name)
                    .ok_or_else(|| SearchSpaceError::UnknownParameters {
                        parameters: vec![name.clone()],
                    })?;
            if let Some(v) = value {
                if !parameter.is_valid_type(v) {
                    return Err(SearchSpaceError::InvalidType {
                        parameter: name.clone(),
                        value: v.repr(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Cast each known parameter's value to its canonical type. Unknown names
    /// and unset values pass through untouched.
    pub fn cast_arm(&self, arm: &Arm) -> PsResult<Arm> {
        let mut parameters = arm.parameters.clone();
        for (name, value) in parameters.iter_mut() {
            if let (Some(parameter), Some(v)) = (self.parameters.get(name), value.as_mut()) {
                *v = parameter.cast(v)?;
            }
        }
        Ok(Arm {
            name: arm.name.clone(),
            parameters,
        })
    }

    /// An arm marking a point outside the design: every parameter unset.
    pub fn out_of_design_arm(&self) -> Arm {
        Arm::new(self.unset_parameterization())
    }

    /// Build an arm with every parameter unset except those in `parameters`.
    pub fn construct_arm(
        &self,
        parameters: Option<&Parameterization>,
        name: Option<&str>,
    ) -> PsResult<Arm> {
        let mut values = self.unset_parameterization();
        for (p_name, value) in parameters.into_iter().flatten() {
            let parameter =
                self.parameters
                    .get(p_name)
                    .ok_or_else(|| SearchSpaceError::UnknownParameters {
                        parameters: vec![p_name.clone()],
                    })?;
            if let Some(v) = value {
                if !parameter.validate(v) {
                    return Err(SearchSpaceError::OutOfDomain {
                        parameters: vec![p_name.clone()],
                        values: vec![v.repr()],
                    }
                    .into());
                }
            }
            values.insert(p_name.clone(), value.clone());
        }
        Ok(Arm {
            name: name.map(str::to_string),
            parameters: values,
        })
    }

    fn unset_parameterization(&self) -> Parameterization {
        self.parameters.keys().map(|name| (name.clone(), None)).collect()
    }

    /// Numeric digest of this space for model consumption.
    pub fn digest(&self) -> Result<SearchSpaceDigest, DigestError> {
        SearchSpaceDigest::from_search_space(self)
    }

    pub(crate) fn fmt_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: Vec<String> = self.parameters.values().map(ToString::to_string).collect();
        let constraints: Vec<String> = self
            .parameter_constraints
            .iter()
            .map(ToString::to_string)
            .collect();
        write!(
            f,
            "(parameters=[{}], parameter_constraints=[{}])",
            parameters.join(", "),
            constraints.join(", ")
        )
    }
}

fn repr_or_none(value: Option<&ParameterValue>) -> String {
    value.map_or_else(|| "None".to_string(), ParameterValue::repr)
}

fn validate_parameter_constraints(
    parameters: &IndexMap<String, Parameter>,
    constraints: &[ParameterConstraint],
) -> Result<(), ConstraintError> {
    for constraint in constraints {
        for name in constraint.constraint_dict().keys() {
            let parameter = parameters
                .get(name)
                .ok_or_else(|| ConstraintError::UnknownParameter {
                    parameter: name.clone(),
                })?;
            validate_constraint_parameter(parameter)?;
        }
        for referenced in constraint.referenced_parameters() {
            if parameters.get(referenced.name()) != Some(referenced) {
                return Err(ConstraintError::ParameterMismatch {
                    parameter: referenced.name().to_string(),
                });
            }
        }
    }
    Ok(())
}

impl PartialEq for SearchSpace {
    /// Parameters compare by content; constraints compare as multisets.
    fn eq(&self, other: &Self) -> bool {
        let count = |list: &[ParameterConstraint], c: &ParameterConstraint| {
            list.iter().filter(|x| *x == c).count()
        };
        self.parameters == other.parameters
            && self.parameter_constraints.len() == other.parameter_constraints.len()
            && self.parameter_constraints.iter().all(|c| {
                count(&self.parameter_constraints, c) == count(&other.parameter_constraints, c)
            })
    }
}

impl fmt::Display for SearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SearchSpace")?;
        self.fmt_body(f)
    }
}

// ---------------------------------------------------------------------------
// Common seam for model-layer consumers
// ---------------------------------------------------------------------------

/// Behavior shared by flat and hierarchical search spaces.
pub trait ParameterSpace: fmt::Display + Send + Sync {
    /// The flat view: every parameter and constraint.
    fn search_space(&self) -> &SearchSpace;

    fn is_hierarchical(&self) -> bool {
        false
    }

    /// Reduce observation features to the parameters this space considers
    /// active. A no-op for flat spaces.
    fn cast_observation_features(
        &self,
        observation_features: &ObservationFeatures,
    ) -> PsResult<ObservationFeatures>;

    /// Undo [`cast_observation_features`](Self::cast_observation_features).
    fn flatten_observation_features(
        &self,
        observation_features: &ObservationFeatures,
    ) -> ObservationFeatures;

    /// Human-readable space kind.
    fn name(&self) -> &str;
}

impl ParameterSpace for SearchSpace {
    fn search_space(&self) -> &SearchSpace {
        self
    }

    fn cast_observation_features(
        &self,
        observation_features: &ObservationFeatures,
    ) -> PsResult<ObservationFeatures> {
        Ok(observation_features.clone())
    }

    fn flatten_observation_features(
        &self,
        observation_features: &ObservationFeatures,
    ) -> ObservationFeatures {
        observation_features.clone()
    }

    fn name(&self) -> &str {
        "flat"
    }
}
