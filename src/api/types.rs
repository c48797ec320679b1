//! Shared types for the API layer.

use std::sync::Arc;

use crate::followup::{ActionDispatcher, FollowUpEngine, TracingDispatcher};

/// Shared context for all API routes. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<FollowUpEngine>,
    pub dispatcher: Arc<dyn ActionDispatcher>,
}

impl ApiContext {
    /// Actions are written to the log until a delivery channel is plugged in.
    pub fn new(engine: Arc<FollowUpEngine>) -> Self {
        Self {
            engine,
            dispatcher: Arc::new(TracingDispatcher),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}
