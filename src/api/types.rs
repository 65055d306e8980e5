//! Shared state for the API layer.

use std::sync::Arc;

use crate::db::DocumentStore;
use crate::pipeline::TriageFlow;

/// Handed to every handler through `State`.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn DocumentStore>,
    pub flow: Arc<TriageFlow>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn DocumentStore>, flow: Arc<TriageFlow>) -> Self {
        Self { store, flow }
    }
}
