//! HTTP adapter for the follow-up engine.
//!
//! Exposes the four read-only follow-up queries as JSON endpoints nested
//! under `/api/followup/`, plus one endpoint that forwards a patient's
//! actions to the configured dispatcher. The router is composable: `followup_router()`
//! returns a `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::{followup_router, followup_router_with_ctx};
pub use server::{start_followup_server, FollowUpServer, ServerSession};
pub use types::ApiContext;
