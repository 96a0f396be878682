use serde::Serialize;
use tokio::sync::mpsc;

use crate::GraphError;
use elicit_core::Value;

/// Read-only hooks around node execution. Observers see serialized state and
/// deltas; nothing they do can change routing.
#[async_trait::async_trait]
pub trait Observer: Send + Sync {
    async fn on_node_start(&self, _node: &str, _step: usize, _state: &Value) {}
    async fn on_node_end(&self, _node: &str, _step: usize, _delta: &Value, _duration_ms: u128) {}
    async fn on_transition(&self, _from: &str, _to: &str) {}
    async fn on_error(&self, _node: &str, _error: &GraphError) {}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    NodeStarted {
        node: String,
        step: usize,
    },
    NodeFinished {
        node: String,
        step: usize,
        delta: Value,
        duration_ms: u64,
    },
    Transition {
        from: String,
        to: String,
    },
    Failed {
        node: String,
        message: String,
    },
}

impl GraphEvent {
    pub fn node(&self) -> &str {
        match self {
            Self::NodeStarted { node, .. }
            | Self::NodeFinished { node, .. }
            | Self::Failed { node, .. } => node,
            Self::Transition { from, .. } => from,
        }
    }
}

/// Forwards every event into an unbounded channel.
#[derive(Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<GraphEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GraphEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn emit(&self, event: GraphEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.sender.send(event);
    }
}

#[async_trait::async_trait]
impl Observer for ChannelObserver {
    async fn on_node_start(&self, node: &str, step: usize, _state: &Value) {
        self.emit(GraphEvent::NodeStarted {
            node: node.to_string(),
            step,
        });
    }

    async fn on_node_end(&self, node: &str, step: usize, delta: &Value, duration_ms: u128) {
        self.emit(GraphEvent::NodeFinished {
            node: node.to_string(),
            step,
            delta: delta.clone(),
            duration_ms: duration_ms as u64,
        });
    }

    async fn on_transition(&self, from: &str, to: &str) {
        self.emit(GraphEvent::Transition {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    async fn on_error(&self, node: &str, error: &GraphError) {
        self.emit(GraphEvent::Failed {
            node: node.to_string(),
            message: error.to_string(),
        });
    }
}

/// Logs every event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

#[async_trait::async_trait]
impl Observer for TracingObserver {
    async fn on_node_start(&self, node: &str, step: usize, _state: &Value) {
        tracing::debug!(node, step, "node started");
    }

    async fn on_node_end(&self, node: &str, step: usize, delta: &Value, duration_ms: u128) {
        tracing::info!(node, step, duration_ms = duration_ms as u64, delta = %delta, "node finished");
    }

    async fn on_transition(&self, from: &str, to: &str) {
        tracing::debug!(from, to, "transition");
    }

    async fn on_error(&self, node: &str, error: &GraphError) {
        tracing::error!(node, error = %error, "node failed");
    }
}
