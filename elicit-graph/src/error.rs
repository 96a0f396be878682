use std::time::Duration;

use elicit_core::ElicitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node failed: {node}: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: ElicitError,
    },
    #[error("graph has no entry node")]
    MissingEntry,
    #[error("missing node: {node}")]
    MissingNode { node: String },
    #[error("invalid edge to '{node}'")]
    InvalidEdge { node: String },
    #[error("Max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
    #[error("graph execution timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
    #[error("graph execution was cancelled")]
    Cancelled,
}
