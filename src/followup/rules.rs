//! Recommendation rules. Each rule is independent: a predicate over the
//! visit pattern plus an emitter. The engine runs them in list order and
//! accumulates everything they emit.

use chrono::{Duration, NaiveDateTime};

use crate::config::FollowUpConfig;
use crate::models::enums::{ActionKind, ActionPriority};

use super::messages::FollowUpMessages;
use super::pattern::days_between;
use super::types::{Action, VisitPattern};

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub pattern: &'a VisitPattern,
    pub now: NaiveDateTime,
    pub config: &'a FollowUpConfig,
}

impl RuleContext<'_> {
    pub fn days_since_last_visit(&self) -> i64 {
        days_between(self.now, self.pattern.last_visit)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub messages: Vec<String>,
    pub actions: Vec<Action>,
}

impl RuleOutcome {
    fn message(mut self, text: String) -> Self {
        self.messages.push(text);
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn merge(&mut self, other: RuleOutcome) {
        self.messages.extend(other.messages);
        self.actions.extend(other.actions);
    }
}

pub trait FollowUpRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn applies(&self, ctx: &RuleContext<'_>) -> bool;

    /// Only called when `applies` returned true.
    fn emit(&self, ctx: &RuleContext<'_>) -> RuleOutcome;
}

/// The standard rule list, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn FollowUpRule>> {
    vec![
        Box::new(StalenessRule),
        Box::new(ServiceAffinityRule),
        Box::new(PreferenceRule),
        Box::new(ProjectionRule),
    ]
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|n| !n.is_empty() && haystack.contains(&n.to_lowercase()))
}

// ─── Staleness ───────────────────────────────────────────────────────────────

/// Overdue above `avg × overdue_factor`, due soon above
/// `avg × near_interval_factor`. Below both bands nothing is emitted.
pub struct StalenessRule;

impl FollowUpRule for StalenessRule {
    fn name(&self) -> &'static str {
        "staleness"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        ctx.days_since_last_visit() as f64
            > ctx.pattern.average_interval_days * ctx.config.near_interval_factor
    }

    fn emit(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let days = ctx.days_since_last_visit();
        let avg = ctx.pattern.average_interval_days;

        if days as f64 > avg * ctx.config.overdue_factor {
            RuleOutcome::default()
                .message(FollowUpMessages::overdue(days, avg))
                .action(Action::new(
                    ActionKind::Contact,
                    ActionPriority::High,
                    FollowUpMessages::contact_overdue(),
                ))
        } else {
            RuleOutcome::default()
                .message(FollowUpMessages::near_interval(days, avg))
                .action(Action::new(
                    ActionKind::Reminder,
                    ActionPriority::Medium,
                    FollowUpMessages::reminder_near_interval(),
                ))
        }
    }
}

// ─── Service affinity ────────────────────────────────────────────────────────

pub struct ServiceAffinityRule;

impl FollowUpRule for ServiceAffinityRule {
    fn name(&self) -> &'static str {
        "service_affinity"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        !ctx.pattern.top_services.is_empty()
    }

    fn emit(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let Some(top) = ctx.pattern.top_services.first() else {
            return RuleOutcome::default();
        };

        let mut outcome =
            RuleOutcome::default().message(FollowUpMessages::top_service(&top.name, top.count));

        if contains_any(&top.name, &ctx.config.maintenance_keywords) {
            outcome = outcome.action(Action::new(
                ActionKind::Program,
                ActionPriority::Medium,
                FollowUpMessages::maintenance_program(&top.name),
            ));
        }

        if contains_any(&top.name, &ctx.config.ongoing_treatment_keywords) {
            outcome = outcome
                .message(FollowUpMessages::ongoing_treatment(&top.name))
                .action(Action::new(
                    ActionKind::FollowUp,
                    ActionPriority::High,
                    FollowUpMessages::ongoing_follow_up(&top.name),
                ));
        }

        outcome
    }
}

// ─── Preference ──────────────────────────────────────────────────────────────

pub struct PreferenceRule;

impl FollowUpRule for PreferenceRule {
    fn name(&self) -> &'static str {
        "preference"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        !ctx.pattern.preferred_weekdays.is_empty() || !ctx.pattern.preferred_hours.is_empty()
    }

    fn emit(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let pattern = ctx.pattern;
        RuleOutcome::default()
            .message(FollowUpMessages::preferences(
                &pattern.preferred_weekdays,
                &pattern.preferred_hours,
            ))
            .action(Action::new(
                ActionKind::Preference,
                ActionPriority::Low,
                FollowUpMessages::preferred_slot(
                    pattern.preferred_weekdays.first().copied(),
                    pattern.preferred_hours.first().copied(),
                ),
            ))
    }
}

/// Window end past the representable range covers every future date.
fn within_window(projected: NaiveDateTime, ctx: &RuleContext<'_>) -> bool {
    Duration::try_days(ctx.config.projection_window_days)
        .and_then(|span| ctx.now.checked_add_signed(span))
        .map_or(true, |end| projected <= end)
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// Passed projection → contact; within the window → dated reminder;
/// further out → message only.
pub struct ProjectionRule;

impl FollowUpRule for ProjectionRule {
    fn name(&self) -> &'static str {
        "projection"
    }

    fn applies(&self, _ctx: &RuleContext<'_>) -> bool {
        true
    }

    fn emit(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let projected = ctx.pattern.projected_next_visit;
        let outcome = RuleOutcome::default().message(FollowUpMessages::projection(projected));

        if projected <= ctx.now {
            outcome.action(Action::new(
                ActionKind::Contact,
                ActionPriority::High,
                FollowUpMessages::projection_passed(),
            ))
        } else if within_window(projected, ctx) {
            outcome.action(
                Action::new(
                    ActionKind::Reminder,
                    ActionPriority::Medium,
                    FollowUpMessages::projection_upcoming(projected),
                )
                .on(projected.date()),
            )
        } else {
            outcome
        }
    }
}
