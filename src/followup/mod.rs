//! Follow-up analytics: recurring and inactive patient reports, per-patient
//! visit patterns, and rule-based retention recommendations.
//!
//! All computation is pure over data read through `VisitReader`; nothing is
//! cached or written back.

pub mod dispatch;
pub mod engine;
pub mod inactivity;
pub mod messages;
pub mod pattern;
pub mod recurrence;
pub mod rules;
pub mod types;

pub use dispatch::{forward_actions, ActionDispatcher, DispatchError, DispatchReport, TracingDispatcher};
pub use engine::FollowUpEngine;
pub use types::*;
