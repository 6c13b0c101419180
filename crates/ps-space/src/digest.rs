//! A numeric summary of a search space for model consumption.

use indexmap::IndexMap;
use ps_types::{DigestError, Parameter, ParameterValue};
use serde::{Deserialize, Serialize};

use crate::search_space::SearchSpace;

/// Feature names with bounds, plus index lists flagging ordinal,
/// categorical, task and fidelity features.
///
/// Every stored index is smaller than `feature_names.len()`; this holds for
/// digests built with [`SearchSpaceDigestBuilder`] and for deserialized ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDigest")]
pub struct SearchSpaceDigest {
    feature_names: Vec<String>,
    bounds: Vec<(f64, f64)>,
    ordinal_features: Vec<usize>,
    categorical_features: Vec<usize>,
    task_features: Vec<usize>,
    fidelity_features: Vec<usize>,
    discrete_choices: IndexMap<usize, Vec<f64>>,
    target_fidelities: IndexMap<usize, f64>,
}

impl SearchSpaceDigest {
    pub fn builder(feature_names: Vec<String>, bounds: Vec<(f64, f64)>) -> SearchSpaceDigestBuilder {
        SearchSpaceDigestBuilder {
            raw: RawDigest {
                feature_names,
                bounds,
                ..RawDigest::default()
            },
        }
    }

    /// Flatten a search space into a digest, one feature per parameter in
    /// declaration order.
    pub fn from_search_space(search_space: &SearchSpace) -> Result<Self, DigestError> {
        let mut raw = RawDigest::default();

        for (index, parameter) in search_space.parameters().values().enumerate() {
            raw.feature_names.push(parameter.name().to_string());
            match parameter {
                Parameter::Range(range) => {
                    raw.bounds.push((range.lower(), range.upper()));
                }
                Parameter::Choice(choice) => {
                    let values = numeric_values(parameter.name(), choice.values())?;
                    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
                    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    raw.bounds.push((low, high));
                    raw.discrete_choices.insert(index, values);
                    if choice.is_task() {
                        raw.task_features.push(index);
                    } else if choice.is_ordered() {
                        raw.ordinal_features.push(index);
                    } else {
                        raw.categorical_features.push(index);
                    }
                }
                Parameter::Fixed(_) => {
                    return Err(DigestError::UnsupportedParameter {
                        parameter: parameter.name().to_string(),
                        reason: "fixed parameters carry no tunable dimension".to_string(),
                    });
                }
            }

            if parameter.is_fidelity() {
                raw.fidelity_features.push(index);
                if let Some(target) = parameter.target_value().and_then(ParameterValue::as_f64) {
                    raw.target_fidelities.insert(index, target);
                }
            }
        }

        Self::try_from(raw)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    pub fn ordinal_features(&self) -> &[usize] {
        &self.ordinal_features
    }

    pub fn categorical_features(&self) -> &[usize] {
        &self.categorical_features
    }

    pub fn task_features(&self) -> &[usize] {
        &self.task_features
    }

    pub fn fidelity_features(&self) -> &[usize] {
        &self.fidelity_features
    }

    pub fn discrete_choices(&self) -> &IndexMap<usize, Vec<f64>> {
        &self.discrete_choices
    }

    pub fn target_fidelities(&self) -> &IndexMap<usize, f64> {
        &self.target_fidelities
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }
}

fn numeric_values(name: &str, values: &[ParameterValue]) -> Result<Vec<f64>, DigestError> {
    values
        .iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| DigestError::UnsupportedParameter {
                parameter: name.to_string(),
                reason: format!("choice value {} is not numeric", v.repr()),
            })
        })
        .collect()
}

/// Builder for [`SearchSpaceDigest`]; indices are checked in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SearchSpaceDigestBuilder {
    raw: RawDigest,
}

impl SearchSpaceDigestBuilder {
    pub fn ordinal_features(mut self, indices: Vec<usize>) -> Self {
        self.raw.ordinal_features = indices;
        self
    }

    pub fn categorical_features(mut self, indices: Vec<usize>) -> Self {
        self.raw.categorical_features = indices;
        self
    }

    pub fn task_features(mut self, indices: Vec<usize>) -> Self {
        self.raw.task_features = indices;
        self
    }

    pub fn fidelity_features(mut self, indices: Vec<usize>) -> Self {
        self.raw.fidelity_features = indices;
        self
    }

    pub fn discrete_choices(mut self, choices: IndexMap<usize, Vec<f64>>) -> Self {
        self.raw.discrete_choices = choices;
        self
    }

    pub fn target_fidelities(mut self, targets: IndexMap<usize, f64>) -> Self {
        self.raw.target_fidelities = targets;
        self
    }

    pub fn build(self) -> Result<SearchSpaceDigest, DigestError> {
        SearchSpaceDigest::try_from(self.raw)
    }
}

/// Unchecked wire form.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawDigest {
    feature_names: Vec<String>,
    bounds: Vec<(f64, f64)>,
    #[serde(default)]
    ordinal_features: Vec<usize>,
    #[serde(default)]
    categorical_features: Vec<usize>,
    #[serde(default)]
    task_features: Vec<usize>,
    #[serde(default)]
    fidelity_features: Vec<usize>,
    #[serde(default)]
    discrete_choices: IndexMap<usize, Vec<f64>>,
    #[serde(default)]
    target_fidelities: IndexMap<usize, f64>,
}

impl TryFrom<RawDigest> for SearchSpaceDigest {
    type Error = DigestError;

    fn try_from(raw: RawDigest) -> Result<Self, Self::Error> {
        let len = raw.feature_names.len();
        if raw.bounds.len() != len {
            return Err(DigestError::LengthMismatch {
                features: len,
                bounds: raw.bounds.len(),
            });
        }

        check_indices("ordinal_features", &raw.ordinal_features, len)?;
        check_indices("categorical_features", &raw.categorical_features, len)?;
        check_indices("task_features", &raw.task_features, len)?;
        check_indices("fidelity_features", &raw.fidelity_features, len)?;
        check_indices("discrete_choices", raw.discrete_choices.keys(), len)?;
        check_indices("target_fidelities", raw.target_fidelities.keys(), len)?;

        Ok(Self {
            feature_names: raw.feature_names,
            bounds: raw.bounds,
            ordinal_features: raw.ordinal_features,
            categorical_features: raw.categorical_features,
            task_features: raw.task_features,
            fidelity_features: raw.fidelity_features,
            discrete_choices: raw.discrete_choices,
            target_fidelities: raw.target_fidelities,
        })
    }
}

fn check_indices<'a>(
    field: &'static str,
    indices: impl IntoIterator<Item = &'a usize>,
    len: usize,
) -> Result<(), DigestError> {
    match indices.into_iter().find(|&&index| index >= len) {
        Some(&index) => Err(DigestError::IndexOutOfRange { field, index, len }),
        None => Ok(()),
    }
}
