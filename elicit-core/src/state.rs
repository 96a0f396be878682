use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Trait for defining how a single field folds an update into its current value.
pub trait Reducer<T>: Send + Sync {
    fn reduce(&self, current: T, update: T) -> T;
}

/// Last-write-wins.
pub struct Overwrite;
impl<T> Reducer<T> for Overwrite {
    fn reduce(&self, _current: T, update: T) -> T {
        update
    }
}

/// Appends the update after the current elements, preserving both orders.
pub struct Append;
impl<T> Reducer<Vec<T>> for Append {
    fn reduce(&self, mut current: Vec<T>, mut update: Vec<T>) -> Vec<T> {
        current.append(&mut update);
        current
    }
}

/// A workflow state and the partial update ("delta") a step produces for it.
///
/// Steps never mutate state in place: they receive a copy and return an
/// `Update`, which the executor folds in with [`StateSchema::apply`].
pub trait StateSchema:
    Serialize + DeserializeOwned + Clone + Default + Send + Sync + std::fmt::Debug + 'static
{
    type Update: Serialize
        + DeserializeOwned
        + Clone
        + Default
        + Send
        + Sync
        + std::fmt::Debug
        + 'static;

    fn apply(current: &Self, update: Self::Update) -> Self;

    /// Human-readable representation for tracing/debugging.
    fn trace_repr(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "<unserializable>".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct GraphState<S: StateSchema> {
    pub data: S,
}

impl<S: StateSchema> GraphState<S> {
    pub fn new(data: S) -> Self {
        Self { data }
    }

    pub fn apply(self, update: StateUpdate<S>) -> Self {
        Self {
            data: S::apply(&self.data, update.data),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct StateUpdate<S: StateSchema> {
    pub data: S::Update,
}

impl<S: StateSchema> StateUpdate<S> {
    pub fn new(data: S::Update) -> Self {
        Self { data }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
