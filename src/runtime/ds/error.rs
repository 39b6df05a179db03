use crate::runtime::ds::value::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Uncaught type error: {0}.")]
    TypeError(String),
    #[error("Uncaught reference error: {0}.")]
    ReferenceError(String),
    #[error("Cyclic inclusion: including `{included}` into `{module}` would make `{module}` its own ancestor.")]
    CyclicInclusion { module: String, included: String },
    #[error("Use of destroyed entity: {0}.")]
    Destroyed(String),
    #[error("Uncaught {0}")]
    Thrown(Value),
    #[error("Config error: {0}.")]
    ConfigError(String),
}

impl ModelError {
    pub fn not_callable(what: &str) -> Self {
        ModelError::TypeError(format!("{} is not callable", what))
    }

    pub fn no_method(receiver: &str, name: &str) -> Self {
        ModelError::ReferenceError(format!("undefined method `{}` for {}", name, receiver))
    }
}
