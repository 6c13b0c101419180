//! # ps-space
//!
//! Search spaces for parameter tuning in Paramspace.
//!
//! Provides flat and hierarchical search space definitions, linear parameter
//! constraints, membership and type checks, arm casting, numeric digests for
//! model consumption, and a JSON configuration layer.

mod config;
mod constraint;
mod digest;
mod hierarchical;
mod search_space;

pub use config::{AnySearchSpace, ConstraintConfig, ParameterConfig, SearchSpaceConfig};
pub use constraint::{
    LinearConstraint, OrderConstraint, ParameterConstraint, SumConstraint, CONSTRAINT_TOLERANCE,
};
pub use digest::{SearchSpaceDigest, SearchSpaceDigestBuilder};
pub use hierarchical::HierarchicalSearchSpace;
pub use search_space::{ParameterSpace, SearchSpace};
