use std::time::Duration;

use elicit_core::DEFAULT_BATCH_CONCURRENCY;
use elicit_graph::ExecutionConfig;
use serde::{Deserialize, Serialize};

use crate::error::RunFailure;
use crate::stage::max_steps_for;

pub const DEFAULT_PERSONA_BATCH_SIZE: usize = 5;
pub const DEFAULT_ITERATION_CEILING: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Personas requested per round.
    pub persona_batch_size: usize,
    /// Maximum number of persona rounds.
    pub iteration_ceiling: u32,
    /// How many of the latest personas a round interviews. Defaults to the
    /// batch size.
    pub interview_window: Option<usize>,
    /// Fan-out width for batched generation in backends built from this
    /// config.
    pub max_concurrency: usize,
    pub step_timeout_secs: Option<u64>,
    pub run_timeout_secs: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona_batch_size: DEFAULT_PERSONA_BATCH_SIZE,
            iteration_ceiling: DEFAULT_ITERATION_CEILING,
            interview_window: None,
            max_concurrency: DEFAULT_BATCH_CONCURRENCY,
            step_timeout_secs: None,
            run_timeout_secs: None,
        }
    }
}

impl AgentConfig {
    pub fn new(persona_batch_size: usize, iteration_ceiling: u32) -> Self {
        Self {
            persona_batch_size,
            iteration_ceiling,
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, RunFailure> {
        let config: Self =
            toml::from_str(source).map_err(|err| RunFailure::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RunFailure> {
        if self.persona_batch_size == 0 {
            return Err(RunFailure::InvalidConfig(
                "persona_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.iteration_ceiling == 0 {
            return Err(RunFailure::InvalidConfig(
                "iteration_ceiling must be greater than zero".to_string(),
            ));
        }
        if self.interview_window == Some(0) {
            return Err(RunFailure::InvalidConfig(
                "interview_window must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(RunFailure::InvalidConfig(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.step_timeout_secs == Some(0) || self.run_timeout_secs == Some(0) {
            return Err(RunFailure::InvalidConfig(
                "timeouts must be greater than zero seconds".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interview_window(&self) -> usize {
        self.interview_window.unwrap_or(self.persona_batch_size)
    }

    /// Executor guards for a run under this config.
    pub fn execution_config(&self) -> ExecutionConfig {
        ExecutionConfig {
            max_steps: Some(max_steps_for(self.iteration_ceiling)),
            node_timeout: self.step_timeout_secs.map(Duration::from_secs),
            max_duration: self.run_timeout_secs.map(Duration::from_secs),
        }
    }
}
