//! Error types for the composition engine

use thiserror::Error;

/// Result type alias for DI operations
pub type DiResult<T> = Result<T, DiError>;

/// Errors that can occur while configuring or resolving services
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Malformed or incompatible registration or decorator declaration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No registration exists for the requested service (and name)
    #[error("No registration found for {service}{}", describe_name(.name))]
    MissingRegistration {
        service: String,
        name: Option<String>,
    },

    /// Circular dependency detected while building a plan
    #[error("Circular dependency detected: {path}")]
    CircularDependency {
        path: String,
    },

    /// The default of a family cannot be determined
    #[error("Ambiguous default for {service}: candidates {}", .candidates.join(", "))]
    AmbiguousDefault {
        service: String,
        candidates: Vec<String>,
    },

    /// A constructor or upcast failed while executing a plan
    #[error("Failed to create service: {service_type}: {reason}")]
    ServiceCreationFailed {
        service_type: String,
        reason: String,
    },

    /// Configuration file could not be parsed
    #[cfg(feature = "config")]
    #[error("Failed to parse configuration: {0}")]
    ConfigError(String),
}

impl DiError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        DiError::Configuration(message.into())
    }

    pub(crate) fn creation_failed(service_type: &str, reason: impl Into<String>) -> Self {
        DiError::ServiceCreationFailed {
            service_type: service_type.to_string(),
            reason: reason.into(),
        }
    }
}

fn describe_name(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" named '{}'", name),
        None => String::new(),
    }
}
