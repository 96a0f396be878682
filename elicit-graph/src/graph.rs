use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use elicit_core::{ElicitError, GraphState, StateSchema, StateUpdate, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{ExecutionConfig, ExecutionOptions, GraphError};

/// Routing target that terminates the run.
pub const END: &str = "__end__";

/// Per-step information handed to a node.
#[derive(Clone, Debug)]
pub struct GraphContext {
    pub run_id: Uuid,
    pub node_id: String,
    pub step: usize,
    pub cancellation: CancellationToken,
}

#[async_trait::async_trait]
pub trait GraphNode<S: StateSchema>: Send + Sync {
    async fn invoke_with_context(
        &self,
        input: GraphState<S>,
        context: &GraphContext,
    ) -> Result<StateUpdate<S>, ElicitError>;
}

type Router<S> = Arc<dyn Fn(&GraphState<S>) -> String + Send + Sync>;

enum Edge<S: StateSchema> {
    Direct(String),
    Conditional(Router<S>),
}

pub struct GraphBuilder<S: StateSchema> {
    nodes: HashMap<String, Arc<dyn GraphNode<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    default_config: ExecutionConfig,
}

impl<S: StateSchema> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSchema> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            default_config: ExecutionConfig::default(),
        }
    }

    pub fn add_node<N>(mut self, name: &str, node: N) -> Self
    where
        N: GraphNode<S> + 'static,
    {
        self.nodes.insert(name.to_string(), Arc::new(node));
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges
            .insert(from.to_string(), Edge::Direct(to.to_string()));
        self
    }

    /// Routes out of `from` by calling `router` on the state after `from`'s
    /// update has been applied. Returning [`END`] terminates the run.
    pub fn add_conditional_edge<F>(mut self, from: &str, router: F) -> Self
    where
        F: Fn(&GraphState<S>) -> String + Send + Sync + 'static,
    {
        self.edges
            .insert(from.to_string(), Edge::Conditional(Arc::new(router)));
        self
    }

    pub fn with_default_config(mut self, config: ExecutionConfig) -> Self {
        self.default_config = config;
        self
    }

    pub fn build(self) -> ExecutableGraph<S> {
        ExecutableGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry: self.entry,
            default_config: self.default_config,
        }
    }
}

/// A sequential executor over a static transition table.
///
/// Each step runs one node on a copy of the current state, folds the returned
/// update into the state, then asks the node's outgoing edge for the next
/// node. A node without an outgoing edge ends the run.
pub struct ExecutableGraph<S: StateSchema> {
    nodes: HashMap<String, Arc<dyn GraphNode<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    default_config: ExecutionConfig,
}

impl<S: StateSchema> ExecutableGraph<S> {
    pub async fn invoke(&self, state: GraphState<S>) -> Result<GraphState<S>, GraphError> {
        self.invoke_with_options(state, ExecutionOptions::default())
            .await
    }

    pub async fn invoke_with_options(
        &self,
        mut state: GraphState<S>,
        options: ExecutionOptions,
    ) -> Result<GraphState<S>, GraphError> {
        let config = self.default_config.merge(&options);
        let observer = options.observer.clone();
        let cancellation = options.cancellation.clone().unwrap_or_default();
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        let mut current = self.entry.clone().ok_or(GraphError::MissingEntry)?;
        let mut step = 0usize;

        while current != END {
            if let Some(max) = config.max_steps {
                if step >= max {
                    return Err(GraphError::MaxStepsExceeded {
                        max,
                        reached: step + 1,
                    });
                }
            }
            if cancellation.is_cancelled() {
                return Err(GraphError::Cancelled);
            }
            step += 1;

            let node = self
                .nodes
                .get(&current)
                .cloned()
                .ok_or_else(|| GraphError::MissingNode {
                    node: current.clone(),
                })?;
            let context = GraphContext {
                run_id,
                node_id: current.clone(),
                step,
                cancellation: cancellation.clone(),
            };

            tracing::debug!(%run_id, node = %current, step, "entering node");
            if let Some(observer) = &observer {
                observer
                    .on_node_start(&current, step, &to_value(&state.data))
                    .await;
            }

            let node_started = Instant::now();
            let update = match self
                .run_node(node.as_ref(), state.clone(), &context, &config, started)
                .await
            {
                Ok(update) => update,
                Err(error) => {
                    tracing::debug!(%run_id, node = %current, step, error = %error, "node aborted run");
                    if let Some(observer) = &observer {
                        observer.on_error(&current, &error).await;
                    }
                    return Err(error);
                }
            };

            if let Some(observer) = &observer {
                observer
                    .on_node_end(
                        &current,
                        step,
                        &to_value(&update.data),
                        node_started.elapsed().as_millis(),
                    )
                    .await;
            }
            state = state.apply(update);

            let next = self.next_node(&current, &state);
            if next != END && !self.nodes.contains_key(&next) {
                return Err(GraphError::InvalidEdge { node: next });
            }
            if let Some(observer) = &observer {
                observer.on_transition(&current, &next).await;
            }
            current = next;
        }

        tracing::debug!(%run_id, steps = step, "run finished");
        Ok(state)
    }

    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    fn next_node(&self, current: &str, state: &GraphState<S>) -> String {
        match self.edges.get(current) {
            Some(Edge::Direct(next)) => next.clone(),
            Some(Edge::Conditional(router)) => router(state),
            None => END.to_string(),
        }
    }

    async fn run_node(
        &self,
        node: &dyn GraphNode<S>,
        state: GraphState<S>,
        context: &GraphContext,
        config: &ExecutionConfig,
        started: Instant,
    ) -> Result<StateUpdate<S>, GraphError> {
        let remaining = match config.max_duration {
            Some(max) => {
                let elapsed = started.elapsed();
                if elapsed >= max {
                    return Err(GraphError::Timeout { elapsed });
                }
                Some(max - elapsed)
            }
            None => None,
        };

        let call = async {
            let invocation = node.invoke_with_context(state, context);
            match config.node_timeout {
                Some(limit) => tokio::time::timeout(limit, invocation)
                    .await
                    .unwrap_or_else(|_| Err(ElicitError::Timeout(limit))),
                None => invocation.await,
            }
        };
        let budget = sleep_or_forever(remaining);

        tokio::select! {
            biased;
            _ = context.cancellation.cancelled() => Err(GraphError::Cancelled),
            _ = budget => Err(GraphError::Timeout { elapsed: started.elapsed() }),
            result = call => result.map_err(|source| GraphError::NodeFailed {
                node: context.node_id.clone(),
                source,
            }),
        }
    }
}

async fn sleep_or_forever(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
