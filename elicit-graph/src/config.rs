use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::Observer;

#[derive(Clone, Debug)]
pub struct ExecutionConfig {
    pub max_steps: Option<usize>,
    pub node_timeout: Option<Duration>,
    pub max_duration: Option<Duration>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_steps: Some(50),
            node_timeout: None,
            max_duration: None,
        }
    }
}

impl ExecutionConfig {
    pub fn merge(&self, overrides: &ExecutionOptions) -> Self {
        Self {
            max_steps: overrides.max_steps.or(self.max_steps),
            node_timeout: overrides.node_timeout.or(self.node_timeout),
            max_duration: overrides.max_duration.or(self.max_duration),
        }
    }
}

/// Per-invocation overrides and hooks.
#[derive(Clone, Default)]
pub struct ExecutionOptions {
    pub max_steps: Option<usize>,
    pub node_timeout: Option<Duration>,
    pub max_duration: Option<Duration>,
    pub observer: Option<Arc<dyn Observer>>,
    pub cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("max_steps", &self.max_steps)
            .field("node_timeout", &self.node_timeout)
            .field("max_duration", &self.max_duration)
            .field("observer", &self.observer.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}
