mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{answer_for, question_for, ScriptedGeneration};
use elicit_agent::{run, AgentConfig, RequirementsAgent, RunFailure, RunOptions, Stage, WorkflowState};
use elicit_core::{ElicitError, Value};
use elicit_graph::{ChannelObserver, GraphEvent, Observer};
use tokio_util::sync::CancellationToken;

fn agent(generation: &Arc<ScriptedGeneration>, batch: usize, ceiling: u32) -> RequirementsAgent {
    RequirementsAgent::new(generation.clone(), AgentConfig::new(batch, ceiling)).unwrap()
}

#[tokio::test]
async fn always_insufficient_stops_at_iteration_ceiling() {
    let generation = Arc::new(ScriptedGeneration::new(2));
    let state = agent(&generation, 2, 3)
        .run_to_completion("build a grocery list app", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(generation.persona_rounds(), 3);
    assert_eq!(state.iteration, 3);
    assert_eq!(state.personas.len(), 6);
    assert_eq!(state.interviews.len(), 6);
    assert!(!state.is_information_sufficient);
    assert_eq!(generation.evaluated_sizes(), vec![2, 4, 6]);
    assert_eq!(generation.synthesized_sizes(), vec![6]);
    assert!(!state.requirement_doc.is_empty());
}

#[tokio::test]
async fn sufficient_verdict_ends_rounds_early() {
    let generation = Arc::new(ScriptedGeneration::new(2).with_verdicts([false, false, true]));
    let state = agent(&generation, 2, 5)
        .run_to_completion("build a grocery list app", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(generation.persona_rounds(), 3);
    assert_eq!(state.iteration, 3);
    assert!(state.is_information_sufficient);
    assert_eq!(generation.synthesized_sizes(), vec![6]);
}

#[tokio::test]
async fn grocery_list_request_end_to_end() {
    let generation = Arc::new(ScriptedGeneration::new(2).with_verdicts([false, true]));
    let state = agent(&generation, 2, 3)
        .run_to_completion("build a grocery list app", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(state.user_request, "build a grocery list app");
    assert_eq!(state.iteration, 2);
    assert_eq!(state.personas.len(), 4);
    assert_eq!(state.interviews.len(), 4);
    assert_eq!(generation.evaluated_sizes(), vec![2, 4]);
    assert_eq!(generation.synthesized_sizes(), vec![4]);
    assert_eq!(state.requirement_doc, "# Requirements\n\nBased on 4 interviews.");
}

#[tokio::test]
async fn interviews_line_up_with_personas() {
    let generation = Arc::new(ScriptedGeneration::new(3).with_verdicts([false, true]));
    let state = agent(&generation, 3, 4)
        .run_to_completion("build a grocery list app", RunOptions::default())
        .await
        .unwrap();

    let names: Vec<_> = state.personas.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["P1", "P2", "P3", "P4", "P5", "P6"]);
    for (persona, interview) in state.personas.iter().zip(&state.interviews) {
        assert_eq!(&interview.persona, persona);
        let question = question_for(&persona.name);
        assert_eq!(interview.answer, answer_for(&persona.name, &question));
        assert_eq!(interview.question, question);
    }
}

#[derive(Default)]
struct StateRecorder {
    snapshots: Mutex<Vec<Value>>,
}

#[async_trait::async_trait]
impl Observer for StateRecorder {
    async fn on_node_start(&self, _node: &str, _step: usize, state: &Value) {
        self.snapshots.lock().unwrap().push(state.clone());
    }
}

#[tokio::test]
async fn accumulated_sequences_only_grow() {
    let generation = Arc::new(ScriptedGeneration::new(2));
    let recorder = Arc::new(StateRecorder::default());
    let options = RunOptions {
        observer: Some(recorder.clone()),
        ..RunOptions::default()
    };

    let final_state = agent(&generation, 2, 3)
        .run_to_completion("build a grocery list app", options)
        .await
        .unwrap();

    let mut snapshots: Vec<WorkflowState> = recorder
        .snapshots
        .lock()
        .unwrap()
        .iter()
        .map(|value| serde_json::from_value(value.clone()).unwrap())
        .collect();
    assert_eq!(snapshots.len(), 10);
    snapshots.push(final_state);

    for pair in snapshots.windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        assert!(after.personas.len() >= before.personas.len());
        assert!(after.interviews.len() >= before.interviews.len());
        assert_eq!(&after.personas[..before.personas.len()], &before.personas[..]);
        assert_eq!(&after.interviews[..before.interviews.len()], &before.interviews[..]);
        assert!(after.interviews.len() <= after.personas.len());
        assert!(after.iteration >= before.iteration);
    }
}

#[tokio::test]
async fn event_stream_reports_every_step_with_its_delta() {
    let generation = Arc::new(ScriptedGeneration::new(2).with_verdicts([false, true]));
    let (observer, mut events) = ChannelObserver::new();
    let options = RunOptions {
        observer: Some(Arc::new(observer)),
        ..RunOptions::default()
    };

    agent(&generation, 2, 3)
        .run_with_options("build a grocery list app", options)
        .await
        .unwrap();

    let mut finished = Vec::new();
    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            GraphEvent::NodeFinished { node, delta, .. } => finished.push((node, delta)),
            GraphEvent::Transition { from, to } => transitions.push((from, to)),
            _ => {}
        }
    }

    let nodes: Vec<_> = finished.iter().map(|(node, _)| node.as_str()).collect();
    assert_eq!(
        nodes,
        vec![
            "generate_personas",
            "conduct_interviews",
            "evaluate_information",
            "generate_personas",
            "conduct_interviews",
            "evaluate_information",
            "generate_requirements",
        ]
    );

    let (_, first_delta) = &finished[0];
    assert_eq!(first_delta["personas"].as_array().unwrap().len(), 2);
    assert_eq!(first_delta["advance_iteration"], true);
    assert_eq!(finished[2].1["is_information_sufficient"], false);
    assert_eq!(finished[5].1["is_information_sufficient"], true);
    assert!(finished[6].1["requirement_doc"].is_string());

    assert_eq!(
        transitions.last().unwrap(),
        &("generate_requirements".to_string(), "__end__".to_string())
    );
}

#[tokio::test]
async fn interview_failure_in_second_round_aborts_run() {
    let generation = Arc::new(ScriptedGeneration::new(2).failing_answers_in_round(2));
    let err = agent(&generation, 2, 3)
        .run("build a grocery list app")
        .await
        .unwrap_err();

    match &err {
        RunFailure::Generation { stage, cause } => {
            assert_eq!(*stage, Stage::ConductingInterviews);
            assert!(matches!(
                cause,
                ElicitError::GenerationFailed { component, .. } if component == "interview_conductor"
            ));
            assert!(matches!(cause.root_cause(), ElicitError::Capability(msg) if msg == "model overloaded"));
        }
        other => panic!("unexpected failure: {other:?}"),
    }
    assert_eq!(err.stage(), Some(Stage::ConductingInterviews));
    assert_eq!(generation.persona_rounds(), 2);
    assert_eq!(generation.evaluated_sizes(), vec![2]);
    assert!(generation.synthesized_sizes().is_empty());
}

#[tokio::test]
async fn empty_persona_batch_fails_in_generation_stage() {
    let generation = Arc::new(ScriptedGeneration::new(0));
    let err = agent(&generation, 2, 3)
        .run("build a grocery list app")
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::GeneratingPersonas));
    assert!(matches!(
        err.cause().map(ElicitError::root_cause),
        Some(ElicitError::SchemaMismatch { shape, .. }) if shape == "PersonaBatch"
    ));
}

#[tokio::test]
async fn cancellation_interrupts_in_flight_calls() {
    let generation =
        Arc::new(ScriptedGeneration::new(2).with_text_delay(Duration::from_millis(500)));
    let token = CancellationToken::new();
    let options = RunOptions {
        cancellation: Some(token.clone()),
        ..RunOptions::default()
    };

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = agent(&generation, 2, 3)
        .run_with_options("build a grocery list app", options)
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, RunFailure::Cancelled));
    assert_eq!(generation.answer_calls(), 0);
}

#[tokio::test]
async fn step_timeout_surfaces_as_run_timeout() {
    let generation = Arc::new(ScriptedGeneration::new(1).with_text_delay(Duration::from_secs(5)));
    let config = AgentConfig {
        step_timeout_secs: Some(1),
        ..AgentConfig::new(1, 1)
    };
    let agent = RequirementsAgent::new(generation, config).unwrap();

    let err = agent.run("build a grocery list app").await.unwrap_err();
    assert!(matches!(err, RunFailure::Timeout(limit) if limit == Duration::from_secs(1)));
}

#[tokio::test]
async fn run_budget_surfaces_as_run_timeout() {
    let generation = Arc::new(ScriptedGeneration::new(1).with_text_delay(Duration::from_secs(5)));
    let config = AgentConfig {
        run_timeout_secs: Some(1),
        ..AgentConfig::new(1, 3)
    };
    let agent = RequirementsAgent::new(generation.clone(), config).unwrap();

    let err = agent.run("build a grocery list app").await.unwrap_err();

    assert!(matches!(err, RunFailure::Timeout(elapsed) if elapsed >= Duration::from_secs(1)));
    assert_eq!(generation.persona_rounds(), 1);
    assert_eq!(generation.answer_calls(), 0);
}

#[tokio::test]
async fn default_config_runs_five_rounds_when_never_sufficient() {
    let generation = Arc::new(ScriptedGeneration::new(5));
    let state = RequirementsAgent::new(generation.clone(), AgentConfig::default())
        .unwrap()
        .run_to_completion("build a grocery list app", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(generation.persona_rounds(), 5);
    assert_eq!(state.iteration, 5);
    assert_eq!(state.personas.len(), 25);
    assert_eq!(state.interviews.len(), 25);
    assert_eq!(generation.evaluated_sizes(), vec![5, 10, 15, 20, 25]);
    assert_eq!(generation.synthesized_sizes(), vec![25]);
}

#[tokio::test]
async fn concurrent_runs_do_not_share_state() {
    let generation = Arc::new(ScriptedGeneration::new(2).with_text_delay(Duration::from_millis(5)));
    let agent = agent(&generation, 2, 2);

    let (first, second) = tokio::join!(
        agent.run_to_completion("build a grocery list app", RunOptions::default()),
        agent.run_to_completion("build a recipe sharing site", RunOptions::default()),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.user_request, "build a grocery list app");
    assert_eq!(second.user_request, "build a recipe sharing site");
    for state in [&first, &second] {
        assert_eq!(state.iteration, 2);
        assert_eq!(state.personas.len(), 4);
        assert_eq!(state.interviews.len(), 4);
    }
    assert_eq!(generation.persona_rounds(), 4);
}

#[tokio::test]
async fn interview_window_can_exceed_batch_without_repeats() {
    let generation = Arc::new(ScriptedGeneration::new(2));
    let config = AgentConfig {
        interview_window: Some(10),
        ..AgentConfig::new(2, 2)
    };
    let state = RequirementsAgent::new(generation, config)
        .unwrap()
        .run_to_completion("build a grocery list app", RunOptions::default())
        .await
        .unwrap();

    assert_eq!(state.interviews.len(), state.personas.len());
    for (persona, interview) in state.personas.iter().zip(&state.interviews) {
        assert_eq!(&interview.persona, persona);
    }
}

#[tokio::test]
async fn run_entry_point_returns_document() {
    let generation = Arc::new(ScriptedGeneration::new(2).with_verdicts([true]));
    let document = run(generation.clone(), "build a grocery list app", 2, 5)
        .await
        .unwrap();

    assert_eq!(document, "# Requirements\n\nBased on 2 interviews.");
    assert_eq!(generation.persona_rounds(), 1);
}

#[tokio::test]
async fn run_entry_point_rejects_zero_sizes() {
    let generation = Arc::new(ScriptedGeneration::new(2));
    let err = run(generation.clone(), "build a grocery list app", 0, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, RunFailure::InvalidConfig(_)));

    let err = run(generation.clone(), "build a grocery list app", 2, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RunFailure::InvalidConfig(_)));
    assert_eq!(generation.persona_rounds(), 0);
}
