//! Hierarchical search spaces: parameters that exist only under certain
//! values of a parent parameter.

use indexmap::{IndexMap, IndexSet};
use ps_types::{
    Arm, Dependents, HierarchyError, ObservationFeatures, Parameter, Parameterization, PsResult,
};
use std::fmt;
use tracing::debug;

use crate::constraint::ParameterConstraint;
use crate::search_space::{ParameterSpace, SearchSpace};

/// A search space whose parameters form a single-rooted tree through the
/// `dependents` of choice and fixed parameters.
///
/// The tree is derived from the parameters and rebuilt on every mutation.
/// Invariants: exactly one root, every dependent is a declared parameter,
/// sibling subtrees share no parameters, and every parameter is reachable
/// from the root exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalSearchSpace {
    search_space: SearchSpace,
    root: String,
    tree: IndexMap<String, Dependents>,
}

impl HierarchicalSearchSpace {
    pub fn new(
        parameters: Vec<Parameter>,
        parameter_constraints: Vec<ParameterConstraint>,
    ) -> PsResult<Self> {
        Self::from_search_space(SearchSpace::new(parameters, parameter_constraints)?)
    }

    /// Derive the dependency tree of an existing flat space.
    pub fn from_search_space(search_space: SearchSpace) -> PsResult<Self> {
        let (root, tree) = build_tree(&search_space)?;
        debug!(
            "Built hierarchical search space rooted at {} ({} parameters)",
            root,
            search_space.len()
        );
        Ok(Self {
            search_space,
            root,
            tree,
        })
    }

    /// The single parameter nothing depends on.
    pub fn root(&self) -> &Parameter {
        // build_tree only ever picks a declared parameter
        &self.search_space.parameters()[&self.root]
    }

    pub fn all_parameter_names(&self) -> IndexSet<&str> {
        self.search_space.parameter_names().collect()
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    /// A plain search space with the same parameters and constraints.
    pub fn flatten(&self) -> SearchSpace {
        self.search_space.clone()
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> PsResult<()> {
        self.mutate(|space| space.add_parameter(parameter))
    }

    pub fn update_parameter(&mut self, parameter: Parameter) -> PsResult<()> {
        self.mutate(|space| space.update_parameter(parameter))
    }

    /// Remove a parameter. Fails while another parameter still lists it as a
    /// dependent, or when its removal leaves more than one root.
    pub fn remove_parameter(&mut self, name: &str) -> PsResult<Parameter> {
        let mut removed = None;
        self.mutate(|space| {
            removed = Some(space.remove_parameter(name)?);
            Ok(())
        })?;
        removed.ok_or_else(|| ps_types::internal_error!("Parameter `{}` was not removed", name))
    }

    pub fn set_parameter_constraints(
        &mut self,
        parameter_constraints: Vec<ParameterConstraint>,
    ) -> PsResult<()> {
        self.mutate(|space| space.set_parameter_constraints(parameter_constraints))
    }

    pub fn add_parameter_constraints(
        &mut self,
        parameter_constraints: Vec<ParameterConstraint>,
    ) -> PsResult<()> {
        self.mutate(|space| space.add_parameter_constraints(parameter_constraints))
    }

    /// Apply `change` to a copy of the flat space and commit only if the
    /// tree still builds.
    fn mutate(&mut self, change: impl FnOnce(&mut SearchSpace) -> PsResult<()>) -> PsResult<()> {
        let mut search_space = self.search_space.clone();
        change(&mut search_space)?;
        *self = Self::from_search_space(search_space)?;
        Ok(())
    }

    /// Names active under `parameters`, found by walking from the root and
    /// following each node's value into its dependents.
    ///
    /// Every active name must be present; an unset value activates nothing.
    pub fn active_parameter_names(
        &self,
        parameters: &Parameterization,
    ) -> Result<IndexSet<String>, HierarchyError> {
        let mut active = IndexSet::new();
        let mut pending = vec![self.root.clone()];

        while let Some(name) = pending.pop() {
            let value = parameters
                .get(&name)
                .ok_or_else(|| HierarchyError::MissingActiveParameter {
                    parameter: name.clone(),
                })?;
            if let (Some(value), Some(dependents)) = (value, self.tree.get(&name)) {
                if let Some((_, children)) = dependents.iter().find(|(v, _)| v.matches(value)) {
                    pending.extend(children.iter().rev().cloned());
                }
            }
            active.insert(name);
        }
        Ok(active)
    }

    /// Keep only the parameters active in this arm, preserving the arm's
    /// name and key order.
    pub fn cast_arm_to_subtree(&self, arm: &Arm) -> Result<Arm, HierarchyError> {
        let active = self.active_parameter_names(&arm.parameters)?;
        let parameters: Parameterization = arm
            .parameters
            .iter()
            .filter(|(name, _)| active.contains(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        debug!(
            "Cast arm to subtree: kept {} of {} parameters",
            parameters.len(),
            arm.parameters.len()
        );
        Ok(Arm {
            name: arm.name.clone(),
            parameters,
        })
    }

    /// Tab-indented rendering of the tree: each node, then `(value)` one
    /// level deeper for every value with dependents, then those dependents
    /// one level deeper still.
    pub fn hierarchical_structure_str(&self, parameter_names_only: bool) -> String {
        let mut out = String::new();
        self.write_structure(&self.root, 0, parameter_names_only, &mut out);
        out
    }

    fn write_structure(&self, name: &str, depth: usize, names_only: bool, out: &mut String) {
        let Some(parameter) = self.search_space.parameter(name) else {
            return;
        };
        out.push_str(&"\t".repeat(depth));
        if names_only {
            out.push_str(name);
        } else {
            out.push_str(&parameter.to_string());
        }
        out.push('\n');

        for (value, children) in self.tree.get(name).into_iter().flatten() {
            out.push_str(&"\t".repeat(depth + 1));
            out.push_str(&format!("({value})\n"));
            for child in children {
                self.write_structure(child, depth + 2, names_only, out);
            }
        }
    }
}

fn build_tree(
    search_space: &SearchSpace,
) -> Result<(String, IndexMap<String, Dependents>), HierarchyError> {
    let mut tree = IndexMap::new();
    let mut dependent_names: IndexSet<&str> = IndexSet::new();

    for parameter in search_space.parameters().values() {
        for (_, children) in parameter.dependents() {
            for child in children {
                if search_space.parameter(child).is_none() {
                    return Err(HierarchyError::UnknownDependent {
                        parent: parameter.name().to_string(),
                        dependent: child.clone(),
                    });
                }
                dependent_names.insert(child);
            }
        }
        if parameter.is_hierarchical() {
            tree.insert(parameter.name().to_string(), parameter.dependents().to_vec());
        }
    }

    let candidates: Vec<String> = search_space
        .parameter_names()
        .filter(|name| !dependent_names.contains(name))
        .map(str::to_string)
        .collect();
    let root = match candidates.as_slice() {
        [root] => root.clone(),
        _ => return Err(HierarchyError::NoUniqueRoot { candidates }),
    };

    let reachable = collect_subtree(&root, &tree, &mut Vec::new())?;
    let unreachable: Vec<String> = search_space
        .parameter_names()
        .filter(|name| !reachable.contains(*name))
        .map(str::to_string)
        .collect();
    if !unreachable.is_empty() {
        return Err(HierarchyError::UnreachableParameters {
            root,
            parameters: unreachable,
        });
    }

    Ok((root, tree))
}

/// All names in the subtree under `name`, including itself. Fails on a
/// cycle through `path` or when two child subtrees of one node intersect.
fn collect_subtree(
    name: &str,
    tree: &IndexMap<String, Dependents>,
    path: &mut Vec<String>,
) -> Result<IndexSet<String>, HierarchyError> {
    if path.iter().any(|seen| seen == name) {
        return Err(HierarchyError::Cycle {
            parameter: name.to_string(),
        });
    }
    path.push(name.to_string());

    let mut below: IndexSet<String> = IndexSet::new();
    for (_, children) in tree.get(name).into_iter().flatten() {
        for child in children {
            let child_subtree = collect_subtree(child, tree, path)?;
            let shared: Vec<String> = child_subtree.intersection(&below).cloned().collect();
            if !shared.is_empty() {
                return Err(HierarchyError::OverlappingBranches {
                    parent: name.to_string(),
                    shared,
                });
            }
            below.extend(child_subtree);
        }
    }

    path.pop();
    let mut subtree = IndexSet::from([name.to_string()]);
    subtree.extend(below);
    Ok(subtree)
}

impl fmt::Display for HierarchicalSearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HierarchicalSearchSpace")?;
        self.search_space.fmt_body(f)
    }
}

impl ParameterSpace for HierarchicalSearchSpace {
    fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    fn is_hierarchical(&self) -> bool {
        true
    }

    /// Cast the parameters to the active subtree. The full parameterization
    /// is kept in metadata unless an earlier cast already stored one.
    fn cast_observation_features(
        &self,
        observation_features: &ObservationFeatures,
    ) -> PsResult<ObservationFeatures> {
        let arm = Arm::new(observation_features.parameters.clone());
        let cast = self.cast_arm_to_subtree(&arm)?;

        let mut metadata = observation_features.metadata.clone().unwrap_or_default();
        if metadata.full_parameterization.is_none() {
            metadata.full_parameterization = Some(observation_features.parameters.clone());
        }
        Ok(ObservationFeatures {
            parameters: cast.parameters,
            metadata: Some(metadata),
            ..observation_features.clone()
        })
    }

    /// Restore the stored full parameterization and drop it from metadata.
    /// Features without one are returned unchanged.
    fn flatten_observation_features(
        &self,
        observation_features: &ObservationFeatures,
    ) -> ObservationFeatures {
        let mut flattened = observation_features.clone();
        let Some(metadata) = flattened.metadata.as_mut() else {
            return flattened;
        };
        let Some(full) = metadata.full_parameterization.take() else {
            return flattened;
        };
        flattened.parameters = full;
        if metadata.is_empty() {
            flattened.metadata = None;
        }
        flattened
    }

    fn name(&self) -> &str {
        "hierarchical"
    }
}
