mod config;
mod error;
mod graph;
mod observer;

pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::GraphError;
pub use graph::{ExecutableGraph, GraphBuilder, GraphContext, GraphNode, END};
pub use observer::{ChannelObserver, GraphEvent, Observer, TracingObserver};

pub use elicit_core::{GraphState, StateSchema, StateUpdate};
pub use elicit_core::state;
