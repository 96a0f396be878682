use std::sync::Arc;

use elicit_core::{Generation, GraphState};
use elicit_graph::{ExecutableGraph, ExecutionOptions, GraphBuilder, Observer, END};
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::error::RunFailure;
use crate::evaluator::SufficiencyEvaluator;
use crate::interview::InterviewConductor;
use crate::nodes::{
    ConductInterviewsNode, EvaluateInformationNode, GeneratePersonasNode,
    GenerateRequirementsNode,
};
use crate::persona::PersonaGenerator;
use crate::stage::{next_stage, Stage};
use crate::state::WorkflowState;
use crate::synthesizer::DocumentSynthesizer;

/// Per-run hooks.
#[derive(Clone, Default)]
pub struct RunOptions {
    pub observer: Option<Arc<dyn Observer>>,
    pub cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions")
            .field("observer", &self.observer.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

/// Drives persona rounds until the evaluator is satisfied or the iteration
/// ceiling is reached, then writes the requirements document.
///
/// The agent holds no per-run state; one instance can serve concurrent runs.
pub struct RequirementsAgent {
    graph: ExecutableGraph<WorkflowState>,
    config: AgentConfig,
}

impl RequirementsAgent {
    pub fn new(generation: Arc<dyn Generation>, config: AgentConfig) -> Result<Self, RunFailure> {
        config.validate()?;
        let ceiling = config.iteration_ceiling;

        let mut builder = GraphBuilder::new()
            .with_default_config(config.execution_config())
            .add_node(
                Stage::GeneratingPersonas.node_name(),
                GeneratePersonasNode {
                    generator: PersonaGenerator::new(generation.clone()),
                    batch_size: config.persona_batch_size,
                },
            )
            .add_node(
                Stage::ConductingInterviews.node_name(),
                ConductInterviewsNode {
                    conductor: InterviewConductor::new(generation.clone()),
                    window: config.interview_window(),
                },
            )
            .add_node(
                Stage::EvaluatingInformation.node_name(),
                EvaluateInformationNode {
                    evaluator: SufficiencyEvaluator::new(generation.clone()),
                },
            )
            .add_node(
                Stage::SynthesizingDocument.node_name(),
                GenerateRequirementsNode {
                    synthesizer: DocumentSynthesizer::new(generation),
                },
            )
            .set_entry(Stage::ENTRY.node_name());

        for stage in Stage::ALL {
            builder = builder.add_conditional_edge(
                stage.node_name(),
                move |state: &GraphState<WorkflowState>| {
                    next_stage(stage, &state.data, ceiling)
                        .map_or(END, Stage::node_name)
                        .to_string()
                },
            );
        }

        Ok(Self {
            graph: builder.build(),
            config,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub async fn run(&self, user_request: &str) -> Result<String, RunFailure> {
        self.run_with_options(user_request, RunOptions::default())
            .await
    }

    pub async fn run_with_options(
        &self,
        user_request: &str,
        options: RunOptions,
    ) -> Result<String, RunFailure> {
        let state = self.run_to_completion(user_request, options).await?;
        Ok(state.requirement_doc)
    }

    /// Runs the workflow and returns the final state, transcript included.
    pub async fn run_to_completion(
        &self,
        user_request: &str,
        options: RunOptions,
    ) -> Result<WorkflowState, RunFailure> {
        tracing::info!(
            persona_batch_size = self.config.persona_batch_size,
            iteration_ceiling = self.config.iteration_ceiling,
            "starting requirements run"
        );

        let options = ExecutionOptions {
            observer: options.observer,
            cancellation: options.cancellation,
            ..ExecutionOptions::default()
        };
        let initial = GraphState::new(WorkflowState::new(user_request));
        let result = self.graph.invoke_with_options(initial, options).await;

        match result {
            Ok(state) => {
                tracing::info!(
                    iteration = state.data.iteration,
                    personas = state.data.personas.len(),
                    interviews = state.data.interviews.len(),
                    "requirements run finished"
                );
                Ok(state.data)
            }
            Err(error) => {
                let failure = RunFailure::from(error);
                tracing::warn!(error = %failure, "requirements run failed");
                Err(failure)
            }
        }
    }
}

/// One-shot convenience: build an agent and run it.
pub async fn run(
    generation: Arc<dyn Generation>,
    user_request: &str,
    persona_batch_size: usize,
    iteration_ceiling: u32,
) -> Result<String, RunFailure> {
    RequirementsAgent::new(
        generation,
        AgentConfig::new(persona_batch_size, iteration_ceiling),
    )?
    .run(user_request)
    .await
}
