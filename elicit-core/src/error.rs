use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElicitError {
    #[error("Generation capability failed: {0}")]
    Capability(String),
    #[error("Structured output did not match '{shape}': {reason}")]
    SchemaMismatch { shape: String, reason: String },
    #[error("{component} failed: {source}")]
    GenerationFailed {
        component: String,
        #[source]
        source: Box<ElicitError>,
    },
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl ElicitError {
    /// Wraps a capability-level error at a component boundary.
    ///
    /// Errors that are already wrapped keep their original component.
    pub fn generation_failed(component: impl Into<String>, source: ElicitError) -> Self {
        match source {
            already @ ElicitError::GenerationFailed { .. } => already,
            other => ElicitError::GenerationFailed {
                component: component.into(),
                source: Box::new(other),
            },
        }
    }

    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            ElicitError::GenerationFailed { .. }
                | ElicitError::Capability(_)
                | ElicitError::SchemaMismatch { .. }
        )
    }

    /// The innermost error, looking through `GenerationFailed` wrappers.
    pub fn root_cause(&self) -> &ElicitError {
        match self {
            ElicitError::GenerationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
