//! Observation features: the parameter envelope handed to and from models.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::arm::Arm;
use crate::value::Parameterization;

/// Reserved metadata keys.
pub mod keys {
    /// Key under which the pre-cast parameterization of a hierarchical
    /// search space is stashed.
    pub const FULL_PARAMETERIZATION: &str = "full_parameterization";
}

/// Side-channel carried next to the parameters of an observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationMetadata {
    /// Full flat parameterization saved before casting to a subtree.
    #[serde(
        rename = "full_parameterization",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_parameterization: Option<Parameterization>,

    /// Any other metadata, keyed by name.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl ObservationMetadata {
    pub fn is_empty(&self) -> bool {
        self.full_parameterization.is_none() && self.extra.is_empty()
    }

    /// Look up a metadata entry by key, including the reserved key.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        if key == keys::FULL_PARAMETERIZATION {
            return self
                .full_parameterization
                .as_ref()
                .and_then(|p| serde_json::to_value(p).ok());
        }
        self.extra.get(key).cloned()
    }
}

/// Features of an observation: where in the search space, and when.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationFeatures {
    pub parameters: Parameterization,
    pub trial_index: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub random_split: Option<u64>,
    pub metadata: Option<ObservationMetadata>,
}

impl ObservationFeatures {
    pub fn new(parameters: Parameterization) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn from_arm(arm: &Arm) -> Self {
        Self::new(arm.parameters.clone())
    }

    pub fn with_trial_index(mut self, trial_index: u64) -> Self {
        self.trial_index = Some(trial_index);
        self
    }

    pub fn with_time_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }

    pub fn with_random_split(mut self, random_split: u64) -> Self {
        self.random_split = Some(random_split);
        self
    }

    pub fn with_metadata(mut self, metadata: ObservationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The stashed full parameterization, if one was saved.
    pub fn full_parameterization(&self) -> Option<&Parameterization> {
        self.metadata
            .as_ref()
            .and_then(|m| m.full_parameterization.as_ref())
    }
}
