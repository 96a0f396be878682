use std::time::Duration;

use elicit_core::ElicitError;
use elicit_graph::GraphError;
use thiserror::Error;

use crate::stage::Stage;

/// Why a requirements run ended without a document.
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("requirements run failed in {stage}: {cause}")]
    Generation {
        stage: Stage,
        #[source]
        cause: ElicitError,
    },
    #[error("requirements run was cancelled")]
    Cancelled,
    #[error("requirements run timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid agent configuration: {0}")]
    InvalidConfig(String),
    #[error("workflow aborted: {0}")]
    Workflow(#[source] GraphError),
}

impl RunFailure {
    /// The generation failure that ended the run, if any.
    pub fn cause(&self) -> Option<&ElicitError> {
        match self {
            RunFailure::Generation { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            RunFailure::Generation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<GraphError> for RunFailure {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::NodeFailed { node, source } => match (Stage::from_node_name(&node), source)
            {
                (_, ElicitError::Cancelled) => RunFailure::Cancelled,
                (_, ElicitError::Timeout(limit)) => RunFailure::Timeout(limit),
                (Some(stage), cause) => RunFailure::Generation { stage, cause },
                (None, source) => RunFailure::Workflow(GraphError::NodeFailed { node, source }),
            },
            GraphError::Cancelled => RunFailure::Cancelled,
            GraphError::Timeout { elapsed } => RunFailure::Timeout(elapsed),
            other => RunFailure::Workflow(other),
        }
    }
}
