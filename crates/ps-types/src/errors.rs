use thiserror::Error;

/// Main error type for the Paramspace system
#[derive(Error, Debug)]
pub enum PsError {
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Search space error: {0}")]
    SearchSpace(#[from] SearchSpaceError),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Digest error: {0}")]
    Digest(#[from] DigestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Invalid parameter definitions and values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Parameter {name}: {parameter_type} is not a numeric type")]
    NonNumericRange { name: String, parameter_type: String },

    #[error("Parameter {name}: upper bound {upper} must be strictly greater than lower bound {lower}")]
    InvalidRange { name: String, lower: f64, upper: f64 },

    #[error("Parameter {name}: bounds must be finite")]
    NonFiniteBounds { name: String },

    #[error("Parameter {name}: integer parameter bounds must be whole numbers, got [{lower}, {upper}]")]
    NonIntegralBounds { name: String, lower: f64, upper: f64 },

    #[error("Parameter {name}: log scale requires a positive lower bound, got {lower}")]
    InvalidLogBounds { name: String, lower: f64 },

    #[error("Parameter {name}: choice parameters need at least two values, got {count}")]
    TooFewValues { name: String, count: usize },

    #[error("Parameter {name}: duplicate value {value}")]
    DuplicateValue { name: String, value: String },

    #[error("Parameter {name}: {value} is not a valid {parameter_type} value")]
    InvalidType {
        name: String,
        value: String,
        parameter_type: String,
    },

    #[error("Parameter {name}: {value} is not a valid value")]
    InvalidValue { name: String, value: String },

    #[error("Parameter {name}: cannot cast {value} to {parameter_type}")]
    CannotCast {
        name: String,
        value: String,
        parameter_type: String,
    },

    #[error("Parameter {name}: dependents declared for {value}, which is not a valid value")]
    InvalidDependentValue { name: String, value: String },

    #[error("Parameter {name}: dependents for {value} are declared more than once")]
    DuplicateDependentValue { name: String, value: String },

    #[error("Parameter {name}: dependents for {value} must list at least one parameter")]
    EmptyDependents { name: String, value: String },

    #[error("Parameter {name}: {digits} digits exceeds the supported maximum of {max}")]
    InvalidDigits { name: String, digits: u32, max: u32 },

    #[error("Parameter {name}: fidelity parameters need a target value")]
    MissingTargetValue { name: String },
}

/// Parameter constraint errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("Parameter constraint must reference at least one parameter")]
    Empty,

    #[error("Parameter constraint coefficient for {parameter} must be finite")]
    NonFiniteCoefficient { parameter: String },

    #[error("Parameter constraint bound must be finite, got {bound}")]
    NonFiniteBound { bound: f64 },

    #[error("`{parameter}` does not exist in search space")]
    UnknownParameter { parameter: String },

    #[error("Parameter constraints are only supported for numeric parameters, `{parameter}` is {parameter_type}")]
    NonNumericParameter {
        parameter: String,
        parameter_type: String,
    },

    #[error("Parameter constraints are not supported for log-scale parameter `{parameter}`")]
    LogScaleParameter { parameter: String },

    #[error("Parameter constraints are not supported for choice parameter `{parameter}`")]
    ChoiceParameter { parameter: String },

    #[error("Parameter constraints are not supported for fixed parameter `{parameter}`")]
    FixedParameter { parameter: String },

    #[error("Parameter `{parameter}` appears more than once in the constraint")]
    DuplicateParameter { parameter: String },

    #[error("Parameter `{parameter}` in constraint does not match the search space definition")]
    ParameterMismatch { parameter: String },
}

/// Search space construction, mutation and membership errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchSpaceError {
    #[error("Parameter names must be unique, `{parameter}` appears more than once")]
    DuplicateParameter { parameter: String },

    #[error("Parameter `{parameter}` does not exist in search space")]
    ParameterNotFound { parameter: String },

    #[error("Parameter `{parameter}` cannot change type from {from} to {to}")]
    TypeChange {
        parameter: String,
        from: String,
        to: String,
    },

    #[error("Parameterization contains parameters not in the search space: {parameters:?}")]
    UnknownParameters { parameters: Vec<String> },

    #[error("Parameterization is missing parameters: {parameters:?}")]
    MissingParameters { parameters: Vec<String> },

    #[error("Values {values:?} are not valid for parameters {parameters:?}")]
    OutOfDomain {
        parameters: Vec<String>,
        values: Vec<String>,
    },

    #[error("{value} is not a valid type for parameter {parameter}")]
    InvalidType { parameter: String, value: String },

    #[error("Parameter constraint {constraint} is violated")]
    ConstraintViolated { constraint: String },
}

/// Dependency-tree errors of hierarchical search spaces
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HierarchyError {
    #[error("Could not find the root parameter; candidates are {candidates:?} (exactly one is required)")]
    NoUniqueRoot { candidates: Vec<String> },

    #[error("Dependent parameter '{dependent}' of '{parent}' is not part of the search space")]
    UnknownDependent { parent: String, dependent: String },

    #[error("Subtrees under '{parent}' contain the same parameters: {shared:?}")]
    OverlappingBranches { parent: String, shared: Vec<String> },

    #[error("Parameter '{parameter}' depends on itself through its dependents")]
    Cycle { parameter: String },

    #[error("Parameters {parameters:?} are not reachable from root '{root}'")]
    UnreachableParameters { root: String, parameters: Vec<String> },

    #[error("Parameter '{parameter}' must be active for this parameterization but has no value")]
    MissingActiveParameter { parameter: String },
}

/// Search space digest errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DigestError {
    #[error("Digest has {features} feature names but {bounds} bounds")]
    LengthMismatch { features: usize, bounds: usize },

    #[error("Digest field {field} references index {index}, but there are only {len} features")]
    IndexOutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Parameter `{parameter}` cannot be represented in a digest: {reason}")]
    UnsupportedParameter { parameter: String, reason: String },
}

/// Result type alias for Paramspace operations
pub type PsResult<T> = Result<T, PsError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::PsError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::PsError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::PsError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = HierarchyError::UnknownDependent {
            parent: "model".to_string(),
            dependent: "l2_reg_weight".to_string(),
        };

        assert!(error.to_string().contains("'l2_reg_weight' of 'model' is not part"));
    }

    #[test]
    fn test_error_conversion() {
        let space_error = SearchSpaceError::ParameterNotFound {
            parameter: "g".to_string(),
        };
        let ps_error: PsError = space_error.into();

        match ps_error {
            PsError::SearchSpace(_) => (),
            _ => panic!("Expected SearchSpace error"),
        }
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(matches!(validation_err, PsError::Validation(ref m) if m == "Invalid value: 42"));
        let _internal_err = internal_error!("Something went wrong");
        let _config_err = config_error!("Missing required field: {}", "parameters");
    }
}
