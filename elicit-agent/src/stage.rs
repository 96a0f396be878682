use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::WorkflowState;

/// The four steps of an elicitation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GeneratingPersonas,
    ConductingInterviews,
    EvaluatingInformation,
    SynthesizingDocument,
}

impl Stage {
    pub const ENTRY: Stage = Stage::GeneratingPersonas;

    pub const ALL: [Stage; 4] = [
        Stage::GeneratingPersonas,
        Stage::ConductingInterviews,
        Stage::EvaluatingInformation,
        Stage::SynthesizingDocument,
    ];

    /// Name of the workflow node that executes this stage.
    pub const fn node_name(self) -> &'static str {
        match self {
            Stage::GeneratingPersonas => "generate_personas",
            Stage::ConductingInterviews => "conduct_interviews",
            Stage::EvaluatingInformation => "evaluate_information",
            Stage::SynthesizingDocument => "generate_requirements",
        }
    }

    pub fn from_node_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.node_name() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_name())
    }
}

/// True when the evaluator asked for more information and the ceiling still
/// allows another persona round.
pub fn needs_another_round(state: &WorkflowState, iteration_ceiling: u32) -> bool {
    !state.is_information_sufficient && state.iteration < iteration_ceiling
}

/// The stage that follows `completed`, given the state after its delta was
/// merged. `None` means the run is finished.
pub fn next_stage(completed: Stage, state: &WorkflowState, iteration_ceiling: u32) -> Option<Stage> {
    match completed {
        Stage::GeneratingPersonas => Some(Stage::ConductingInterviews),
        Stage::ConductingInterviews => Some(Stage::EvaluatingInformation),
        Stage::EvaluatingInformation if needs_another_round(state, iteration_ceiling) => {
            Some(Stage::GeneratingPersonas)
        }
        Stage::EvaluatingInformation => Some(Stage::SynthesizingDocument),
        Stage::SynthesizingDocument => None,
    }
}

/// Upper bound on executed steps for a given ceiling: three steps per round
/// plus the final synthesis.
pub fn max_steps_for(iteration_ceiling: u32) -> usize {
    3 * iteration_ceiling as usize + 1
}
