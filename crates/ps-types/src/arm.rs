use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::{format_parameterization, Parameterization};

/// A named point in a search space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    pub name: Option<String>,
    pub parameters: Parameterization,
}

impl Arm {
    pub fn new(parameters: Parameterization) -> Self {
        Self {
            name: None,
            parameters,
        }
    }

    pub fn named(name: impl Into<String>, parameters: Parameterization) -> Self {
        Self {
            name: Some(name.into()),
            parameters,
        }
    }

    /// Whether every parameter carries the unset sentinel.
    pub fn is_out_of_design(&self) -> bool {
        self.parameters.values().all(Option::is_none)
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "Arm(name='{name}', parameters={})",
                format_parameterization(&self.parameters)
            ),
            None => write!(f, "Arm(parameters={})", format_parameterization(&self.parameters)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameterization;

    #[test]
    fn display_includes_name_when_present() {
        let arm = Arm::named("0_0", parameterization! { "x" => 1.5 });
        assert_eq!(arm.to_string(), "Arm(name='0_0', parameters={'x': 1.5})");
        assert_eq!(
            Arm::new(parameterization! { "x" => "a" }).to_string(),
            "Arm(parameters={'x': 'a'})"
        );
    }

    #[test]
    fn out_of_design_detection() {
        let mut parameters = Parameterization::new();
        parameters.insert("x".to_string(), None);
        assert!(Arm::new(parameters).is_out_of_design());
        assert!(!Arm::new(parameterization! { "x" => 1 }).is_out_of_design());
    }
}
