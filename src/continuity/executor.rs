//! Failover Executor
//!
//! Runs a plan's actions in ascending `sequence` order through an
//! [`ActionHandler`]. A failing action is recorded and execution moves on
//! to the next one; a failover is never abandoned halfway.
//!
//! Effects are declarative: the bundled [`RecordingHandler`] records each
//! intent instead of calling DNS providers or node-management APIs.
//! Production adapters implement `ActionHandler` and own their retries.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{ContinuityError, ContinuityResult};
use super::model::{
    new_id, ActionOutcome, ActionStatus, ActionType, ContinuityPlan, FailoverAction,
    FailoverResult, Metadata, Params,
};
use crate::clock::SharedClock;
use crate::observability::{log_event_with_fields, Event, ObservationScope};

/// Adapter interface for applying actions.
///
/// A handler either completes or returns an error. Timeouts, if an adapter
/// enforces them, are reported as errors.
pub trait ActionHandler {
    fn demote(&mut self, action: &FailoverAction) -> ContinuityResult<()>;
    fn promote(&mut self, action: &FailoverAction) -> ContinuityResult<()>;
    fn dns_flip(&mut self, action: &FailoverAction) -> ContinuityResult<()>;
    fn notify(&mut self, action: &FailoverAction) -> ContinuityResult<()>;
    fn verify(&mut self, action: &FailoverAction) -> ContinuityResult<()>;
    fn restart(&mut self, action: &FailoverAction) -> ContinuityResult<()>;
}

/// A recorded action effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionIntent {
    pub action_id: String,
    pub action_type: ActionType,
    pub target_node_id: String,
    pub params: Params,
}

impl ActionIntent {
    fn from_action(action: &FailoverAction) -> Self {
        Self {
            action_id: action.action_id.clone(),
            action_type: action.action_type,
            target_node_id: action.target_node_id.clone(),
            params: action.params.clone(),
        }
    }
}

/// Records every applied action as an [`ActionIntent`].
#[derive(Debug, Default)]
pub struct RecordingHandler {
    intents: Vec<ActionIntent>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intents in the order they were applied.
    pub fn intents(&self) -> &[ActionIntent] {
        &self.intents
    }

    fn record(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.intents.push(ActionIntent::from_action(action));
        Ok(())
    }
}

impl ActionHandler for RecordingHandler {
    fn demote(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.record(action)
    }

    fn promote(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.record(action)
    }

    fn dns_flip(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        for key in ["old_host", "new_host"] {
            let present = action
                .params
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| !s.is_empty())
                .unwrap_or(false);
            if !present {
                return Err(ContinuityError::action_failed(
                    action.action_type.as_str(),
                    &action.target_node_id,
                    format!("missing '{}' parameter", key),
                ));
            }
        }
        self.record(action)
    }

    fn notify(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.record(action)
    }

    fn verify(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        check_verify_params(action)?;
        self.record(action)
    }

    fn restart(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.record(action)
    }
}

/// A `verify` action must name at least one check.
pub fn check_verify_params(action: &FailoverAction) -> ContinuityResult<()> {
    let has_checks = action
        .params
        .get("checks")
        .and_then(|v| v.as_array())
        .map(|checks| !checks.is_empty())
        .unwrap_or(false);
    if has_checks {
        Ok(())
    } else {
        Err(ContinuityError::action_failed(
            action.action_type.as_str(),
            &action.target_node_id,
            "no checks requested",
        ))
    }
}

/// Executes continuity plans.
pub struct FailoverExecutor<H: ActionHandler> {
    clock: SharedClock,
    handler: H,
    dry_run: bool,
}

impl FailoverExecutor<RecordingHandler> {
    /// Executor that records intents.
    pub fn recording(clock: SharedClock) -> Self {
        Self::new(clock, RecordingHandler::new())
    }
}

impl<H: ActionHandler> FailoverExecutor<H> {
    pub fn new(clock: SharedClock, handler: H) -> Self {
        Self {
            clock,
            handler,
            dry_run: false,
        }
    }

    /// In dry-run mode mutating actions are skipped. `verify` always runs.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Execute every action of `plan`.
    ///
    /// Never fails: handler errors are collected into the result and the
    /// remaining actions still run. `success` is true iff no action failed.
    pub fn execute_plan(&mut self, plan: &ContinuityPlan) -> FailoverResult {
        let execution_id = new_id();
        let scope = ObservationScope::open(
            "EXECUTION",
            self.clock.clone(),
            &[
                ("execution_id", execution_id.as_str()),
                ("plan_id", plan.plan_id.as_str()),
            ],
        );

        let started_at = self.clock.now();

        let mut outcomes = Vec::with_capacity(plan.actions.len());
        let mut errors = Vec::new();
        let mut actions_executed = 0;
        let mut actions_failed = 0;

        for action in plan.ordered_actions() {
            let action_start = self.clock.monotonic();
            let dispatched = self.dispatch(action);
            let duration_ms = elapsed_ms(action_start, self.clock.monotonic());

            let (status, error) = match dispatched {
                Ok(status) => {
                    actions_executed += 1;
                    (status, None)
                }
                Err(err) => {
                    actions_failed += 1;
                    let message = format!("Action {} failed: {}", action.action_id, err);
                    errors.push(message);
                    (ActionStatus::Failed, Some(err.to_string()))
                }
            };

            Self::log_outcome(action, status, error.as_deref());
            outcomes.push(ActionOutcome {
                action_id: action.action_id.clone(),
                action_type: action.action_type,
                target_node_id: action.target_node_id.clone(),
                sequence: action.sequence,
                status,
                duration_ms,
                error,
            });
        }

        let total_duration_ms = scope.elapsed_ms();
        let completed_at = self.clock.now();

        let mut metadata = Metadata::new();
        metadata.insert("dry_run".into(), json!(self.dry_run));
        metadata.insert("estimated_total_ms".into(), json!(plan.estimated_total_ms));
        metadata.insert("failover_target_id".into(), json!(plan.failover_target_id));

        let result = FailoverResult {
            execution_id,
            plan_id: plan.plan_id.clone(),
            started_at,
            completed_at,
            success: actions_failed == 0,
            actions_executed,
            actions_failed,
            total_duration_ms,
            errors,
            action_outcomes: outcomes,
            metadata,
        };

        let executed = result.actions_executed.to_string();
        let failed = result.actions_failed.to_string();
        scope.complete(&[
            ("actions_executed", executed.as_str()),
            ("actions_failed", failed.as_str()),
        ]);
        result
    }

    fn dispatch(&mut self, action: &FailoverAction) -> ContinuityResult<ActionStatus> {
        if self.dry_run && action.action_type.is_mutating() {
            return Ok(ActionStatus::Skipped);
        }

        match action.action_type {
            ActionType::Demote => self.handler.demote(action),
            ActionType::Promote => self.handler.promote(action),
            ActionType::DnsFlip => self.handler.dns_flip(action),
            ActionType::Notify => self.handler.notify(action),
            ActionType::Verify => self.handler.verify(action),
            ActionType::Restart => self.handler.restart(action),
        }?;
        Ok(ActionStatus::Applied)
    }

    fn log_outcome(action: &FailoverAction, status: ActionStatus, error: Option<&str>) {
        let event = match status {
            ActionStatus::Applied => Event::ActionExecuted,
            ActionStatus::Skipped => Event::ActionSkipped,
            ActionStatus::Failed => Event::ActionFailed,
        };
        let sequence = action.sequence.to_string();
        let mut fields = vec![
            ("action_type", action.action_type.as_str()),
            ("sequence", sequence.as_str()),
            ("target", action.target_node_id.as_str()),
        ];
        if let Some(error) = error {
            fields.push(("error", error));
        }
        log_event_with_fields(event, &fields);
    }
}

fn elapsed_ms(start_s: f64, end_s: f64) -> u64 {
    ((end_s - start_s).max(0.0) * 1000.0).round() as u64
}
