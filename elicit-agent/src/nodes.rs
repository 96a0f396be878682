use elicit_core::{ElicitError, GraphState, StateUpdate};
use elicit_graph::{GraphContext, GraphNode};

use crate::evaluator::SufficiencyEvaluator;
use crate::interview::InterviewConductor;
use crate::persona::PersonaGenerator;
use crate::state::{WorkflowDelta, WorkflowState};
use crate::synthesizer::DocumentSynthesizer;

pub(crate) struct GeneratePersonasNode {
    pub(crate) generator: PersonaGenerator,
    pub(crate) batch_size: usize,
}

#[async_trait::async_trait]
impl GraphNode<WorkflowState> for GeneratePersonasNode {
    async fn invoke_with_context(
        &self,
        input: GraphState<WorkflowState>,
        context: &GraphContext,
    ) -> Result<StateUpdate<WorkflowState>, ElicitError> {
        let state = input.data;
        let personas = self
            .generator
            .generate(&state.user_request, self.batch_size)
            .await?;
        tracing::info!(
            run_id = %context.run_id,
            iteration = state.iteration + 1,
            personas = personas.len(),
            "generated personas"
        );
        Ok(StateUpdate::new(WorkflowDelta {
            personas,
            advance_iteration: true,
            ..Default::default()
        }))
    }
}

pub(crate) struct ConductInterviewsNode {
    pub(crate) conductor: InterviewConductor,
    pub(crate) window: usize,
}

#[async_trait::async_trait]
impl GraphNode<WorkflowState> for ConductInterviewsNode {
    async fn invoke_with_context(
        &self,
        input: GraphState<WorkflowState>,
        context: &GraphContext,
    ) -> Result<StateUpdate<WorkflowState>, ElicitError> {
        let state = input.data;
        let pending = state.pending_interviews(self.window);
        let interviews = self.conductor.conduct(&state.user_request, pending).await?;
        tracing::info!(
            run_id = %context.run_id,
            iteration = state.iteration,
            interviews = interviews.len(),
            "conducted interviews"
        );
        Ok(StateUpdate::new(WorkflowDelta {
            interviews,
            ..Default::default()
        }))
    }
}

pub(crate) struct EvaluateInformationNode {
    pub(crate) evaluator: SufficiencyEvaluator,
}

#[async_trait::async_trait]
impl GraphNode<WorkflowState> for EvaluateInformationNode {
    async fn invoke_with_context(
        &self,
        input: GraphState<WorkflowState>,
        context: &GraphContext,
    ) -> Result<StateUpdate<WorkflowState>, ElicitError> {
        let state = input.data;
        let verdict = self
            .evaluator
            .evaluate(&state.user_request, &state.interviews)
            .await?;
        tracing::info!(
            run_id = %context.run_id,
            iteration = state.iteration,
            interviews = state.interviews.len(),
            is_sufficient = verdict.is_sufficient,
            reason = %verdict.reason,
            "evaluated information"
        );
        Ok(StateUpdate::new(WorkflowDelta {
            is_information_sufficient: Some(verdict.is_sufficient),
            ..Default::default()
        }))
    }
}

pub(crate) struct GenerateRequirementsNode {
    pub(crate) synthesizer: DocumentSynthesizer,
}

#[async_trait::async_trait]
impl GraphNode<WorkflowState> for GenerateRequirementsNode {
    async fn invoke_with_context(
        &self,
        input: GraphState<WorkflowState>,
        context: &GraphContext,
    ) -> Result<StateUpdate<WorkflowState>, ElicitError> {
        let state = input.data;
        let document = self
            .synthesizer
            .synthesize(&state.user_request, &state.interviews)
            .await?;
        tracing::info!(
            run_id = %context.run_id,
            interviews = state.interviews.len(),
            chars = document.len(),
            "synthesized requirements document"
        );
        Ok(StateUpdate::new(WorkflowDelta {
            requirement_doc: Some(document),
            ..Default::default()
        }))
    }
}
