//! JSON search space definitions.
//!
//! ```json
//! {
//!   "parameters": [
//!     {"type": "choice", "name": "model", "parameter_type": "string",
//!      "values": ["Linear", "XGBoost"],
//!      "dependents": {"Linear": ["learning_rate"], "XGBoost": ["num_boost_rounds"]}},
//!     {"type": "range", "name": "learning_rate", "parameter_type": "float", "bounds": [0.001, 0.1]},
//!     {"type": "range", "name": "num_boost_rounds", "parameter_type": "int", "bounds": [10, 20]}
//!   ],
//!   "parameter_constraints": []
//! }
//! ```

use indexmap::IndexMap;
use ps_types::{
    config_error, ChoiceParameter, ConstraintError, Dependents, FixedParameter, Parameter,
    ParameterType, ParameterValue, PsResult, RangeParameter,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::constraint::{LinearConstraint, OrderConstraint, ParameterConstraint, SumConstraint};
use crate::hierarchical::HierarchicalSearchSpace;
use crate::search_space::{ParameterSpace, SearchSpace};

/// One parameter definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterConfig {
    Range {
        name: String,
        #[serde(alias = "value_type")]
        parameter_type: ParameterType,
        bounds: (f64, f64),
        #[serde(default)]
        log_scale: bool,
        #[serde(default)]
        digits: Option<u32>,
        #[serde(default)]
        is_fidelity: bool,
        #[serde(default)]
        target_value: Option<ParameterValue>,
    },
    Choice {
        name: String,
        #[serde(alias = "value_type")]
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
        dependents: IndexMap<String, Vec<String>>,
    },
    Fixed {
        name: String,
        #[serde(alias = "value_type")]
        parameter_type: ParameterType,
        value: ParameterValue,
        #[serde(default)]
        is_fidelity: bool,
        #[serde(default)]
        target_value: Option<ParameterValue>,
        #[serde(default)]
        dependents: IndexMap<String, Vec<String>>,
    },
}

impl ParameterConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Range { name, .. } | Self::Choice { name, .. } | Self::Fixed { name, .. } => name,
        }
    }

    pub fn build(&self) -> PsResult<Parameter> {
        match self {
            Self::Range {
                name,
                parameter_type,
                bounds,
                log_scale,
                digits,
                is_fidelity,
                target_value,
            } => {
                let mut range = RangeParameter::new(name, *parameter_type, bounds.0, bounds.1)?
                    .with_log_scale(*log_scale)?;
                if let Some(digits) = digits {
                    range = range.with_digits(*digits)?;
                }
                if *is_fidelity {
                    range = range.with_fidelity(fidelity_target(name, target_value)?)?;
                }
                Ok(range.into())
            }
            Self::Choice {
                name,
                parameter_type,
                values,
                is_ordered,
                sort_values,
                is_task,
                is_fidelity,
                target_value,
                dependents,
            } => {
                let mut choice = ChoiceParameter::new(name, *parameter_type, values.clone())?
                    .with_is_task(*is_task);
                if let Some(is_ordered) = is_ordered {
                    choice = choice.with_is_ordered(*is_ordered);
                }
                if let Some(sort_values) = sort_values {
                    choice = choice.with_sort_values(*sort_values);
                }
                if *is_fidelity {
                    choice = choice.with_fidelity(fidelity_target(name, target_value)?)?;
                }
                if !dependents.is_empty() {
                    choice = choice.with_dependents(parse_dependents(*parameter_type, dependents)?)?;
                }
                Ok(choice.into())
            }
            Self::Fixed {
                name,
                parameter_type,
                value,
                is_fidelity,
                target_value,
                dependents,
            } => {
                let mut fixed = FixedParameter::new(name, *parameter_type, value.clone())?;
                if *is_fidelity {
                    let target = target_value.clone().unwrap_or_else(|| value.clone());
                    fixed = fixed.with_fidelity(target)?;
                }
                if !dependents.is_empty() {
                    fixed = fixed.with_dependents(parse_dependents(*parameter_type, dependents)?)?;
                }
                Ok(fixed.into())
            }
        }
    }
}

fn fidelity_target(name: &str, target_value: &Option<ParameterValue>) -> PsResult<ParameterValue> {
    target_value
        .clone()
        .ok_or_else(|| config_error!("Fidelity parameter `{}` needs a target_value", name))
}

/// JSON object keys are strings; read them back as values of `parameter_type`.
fn parse_dependents(
    parameter_type: ParameterType,
    dependents: &IndexMap<String, Vec<String>>,
) -> PsResult<Dependents> {
    dependents
        .iter()
        .map(|(key, children)| Ok((parse_key(parameter_type, key)?, children.clone())))
        .collect()
}

fn parse_key(parameter_type: ParameterType, key: &str) -> PsResult<ParameterValue> {
    let value = match parameter_type {
        ParameterType::String => Some(ParameterValue::from(key)),
        ParameterType::Bool => key.parse::<bool>().ok().map(ParameterValue::Bool),
        ParameterType::Int => key.parse::<i64>().ok().map(ParameterValue::Int),
        ParameterType::Float => key.parse::<f64>().ok().map(ParameterValue::Float),
    };
    value.ok_or_else(|| config_error!("Dependents key `{}` is not a valid {} value", key, parameter_type))
}

/// One constraint definition. Order and sum constraints name their
/// parameters; they are resolved against the parameter list on build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConstraintConfig {
    Linear {
        constraint_dict: IndexMap<String, f64>,
        bound: f64,
    },
    Order {
        lower: String,
        upper: String,
    },
    Sum {
        parameters: Vec<String>,
        #[serde(default = "default_is_upper_bound")]
        is_upper_bound: bool,
        bound: f64,
    },
}

fn default_is_upper_bound() -> bool {
    true
}

impl ConstraintConfig {
    pub fn build(&self, parameters: &IndexMap<String, Parameter>) -> PsResult<ParameterConstraint> {
        let lookup = |name: &String| {
            parameters
                .get(name)
                .ok_or_else(|| ConstraintError::UnknownParameter {
                    parameter: name.clone(),
                })
        };
        let constraint = match self {
            Self::Linear {
                constraint_dict,
                bound,
            } => LinearConstraint::new(constraint_dict.clone(), *bound)?.into(),
            Self::Order { lower, upper } => {
                OrderConstraint::new(lookup(lower)?, lookup(upper)?)?.into()
            }
            Self::Sum {
                parameters: names,
                is_upper_bound,
                bound,
            } => {
                let resolved = names
                    .iter()
                    .map(|name| lookup(name).cloned())
                    .collect::<Result<Vec<_>, _>>()?;
                SumConstraint::new(&resolved, *is_upper_bound, *bound)?.into()
            }
        };
        Ok(constraint)
    }
}

/// A complete search space definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpaceConfig {
    pub parameters: Vec<ParameterConfig>,
    #[serde(default)]
    pub parameter_constraints: Vec<ConstraintConfig>,
}

impl SearchSpaceConfig {
    pub fn from_json_str(json: &str) -> PsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> PsResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading search space config from: {}", path.display());
        let config = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            "Loaded {} parameters and {} constraints from {}",
            config.parameters.len(),
            config.parameter_constraints.len(),
            path.display()
        );
        Ok(config)
    }

    /// Build the space: hierarchical when any parameter declares dependents,
    /// flat otherwise.
    pub fn build(&self) -> PsResult<AnySearchSpace> {
        let mut parameters = IndexMap::with_capacity(self.parameters.len());
        for config in &self.parameters {
            if parameters.contains_key(config.name()) {
                return Err(config_error!(
                    "Parameter `{}` is defined more than once",
                    config.name()
                ));
            }
            parameters.insert(config.name().to_string(), config.build()?);
        }
        let constraints = self
            .parameter_constraints
            .iter()
            .map(|c| c.build(&parameters))
            .collect::<PsResult<Vec<_>>>()?;

        let is_hierarchical = parameters.values().any(Parameter::is_hierarchical);
        let search_space = SearchSpace::new(parameters.into_values().collect(), constraints)?;
        if is_hierarchical {
            Ok(AnySearchSpace::Hierarchical(
                HierarchicalSearchSpace::from_search_space(search_space)?,
            ))
        } else {
            Ok(AnySearchSpace::Flat(search_space))
        }
    }
}

/// Either kind of search space, as produced from a config.
#[derive(Debug, Clone, PartialEq)]
pub enum AnySearchSpace {
    Flat(SearchSpace),
    Hierarchical(HierarchicalSearchSpace),
}

impl AnySearchSpace {
    pub fn as_parameter_space(&self) -> &dyn ParameterSpace {
        match self {
            Self::Flat(space) => space,
            Self::Hierarchical(space) => space,
        }
    }

    pub fn as_hierarchical(&self) -> Option<&HierarchicalSearchSpace> {
        match self {
            Self::Hierarchical(space) => Some(space),
            Self::Flat(_) => None,
        }
    }
}

impl fmt::Display for AnySearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat(space) => fmt::Display::fmt(space, f),
            Self::Hierarchical(space) => fmt::Display::fmt(space, f),
        }
    }
}
