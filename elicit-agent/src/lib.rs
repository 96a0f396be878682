//! Iterative requirements elicitation.
//!
//! A run generates personas for a user request, interviews them, asks an
//! evaluator whether the answers are enough, and loops until they are or the
//! iteration ceiling is hit. The accumulated interviews are then synthesized
//! into a requirements document.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use elicit_agent::{AgentConfig, RequirementsAgent};
//! # async fn demo(generation: Arc<dyn elicit_core::Generation>) -> Result<(), elicit_agent::RunFailure> {
//! let agent = RequirementsAgent::new(generation, AgentConfig::new(5, 5))?;
//! let document = agent.run("build a grocery list app").await?;
//! println!("{document}");
//! # Ok(())
//! # }
//! ```

mod agent;
mod config;
mod error;
mod evaluator;
mod interview;
mod model;
mod nodes;
mod persona;
pub mod prompts;
mod stage;
mod state;
mod synthesizer;

pub use agent::{run, RequirementsAgent, RunOptions};
pub use config::{AgentConfig, DEFAULT_ITERATION_CEILING, DEFAULT_PERSONA_BATCH_SIZE};
pub use error::RunFailure;
pub use evaluator::SufficiencyEvaluator;
pub use interview::InterviewConductor;
pub use model::{EvaluationVerdict, Interview, Persona, PersonaBatch};
pub use persona::PersonaGenerator;
pub use stage::{max_steps_for, needs_another_round, next_stage, Stage};
pub use state::{WorkflowDelta, WorkflowState};
pub use synthesizer::DocumentSynthesizer;
