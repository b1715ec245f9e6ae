//! Metrics-based observability hooks for collaborator calls, validators, and dialog turns.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use pservices::ServiceOperationHooks;
//!
//! fn accepts_service_hooks(_hooks: &dyn ServiceOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_service_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::ConversationId;
use pdialog::{
    DialogError, DialogOperation, DialogRuntimeHooks, StackTransition, StepOutcome, TurnResult,
};
use pprompt::{PromptError, ValidationContext, ValidationOutcome, ValidatorHooks};
use pservices::{ServiceError, ServiceId, ServiceOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ServiceOperationHooks for MetricsObservabilityHooks {
    fn on_call_start(&self, service: ServiceId, operation: &str) {
        metrics::counter!(
            "parley_service_call_start_total",
            "service" => service.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_call_success(&self, service: ServiceId, operation: &str, elapsed: Duration) {
        metrics::counter!(
            "parley_service_call_success_total",
            "service" => service.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "parley_service_call_latency_seconds",
            "service" => service.to_string(),
            "operation" => operation.to_string(),
            "outcome" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_call_failure(
        &self,
        service: ServiceId,
        operation: &str,
        error: &ServiceError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_service_call_failure_total",
            "service" => service.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_service_call_latency_seconds",
            "service" => service.to_string(),
            "operation" => operation.to_string(),
            "outcome" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ValidatorHooks for MetricsObservabilityHooks {
    fn on_validation_start(&self, validator_id: &str, _context: &ValidationContext) {
        metrics::counter!(
            "parley_validation_start_total",
            "validator_id" => validator_id.to_string()
        )
        .increment(1);
    }

    fn on_validation_complete(
        &self,
        validator_id: &str,
        _context: &ValidationContext,
        outcome: &ValidationOutcome,
        elapsed: Duration,
    ) {
        let status = if outcome.accepted {
            "accepted"
        } else {
            "rejected"
        };
        metrics::counter!(
            "parley_validation_complete_total",
            "validator_id" => validator_id.to_string(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "parley_validation_duration_seconds",
            "validator_id" => validator_id.to_string(),
            "status" => status
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_validation_failure(
        &self,
        validator_id: &str,
        _context: &ValidationContext,
        error: &PromptError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_validation_failure_total",
            "validator_id" => validator_id.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_validation_duration_seconds",
            "validator_id" => validator_id.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl DialogRuntimeHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _conversation_id: &ConversationId, operation: DialogOperation) {
        metrics::counter!(
            "parley_dialog_turn_start_total",
            "operation" => operation.as_str()
        )
        .increment(1);
    }

    fn on_step_success(
        &self,
        _conversation_id: &ConversationId,
        flow_id: &str,
        _step_index: usize,
        outcome: &StepOutcome,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_dialog_step_total",
            "flow_id" => flow_id.to_string(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "parley_dialog_step_duration_seconds",
            "flow_id" => flow_id.to_string()
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_transition(
        &self,
        _conversation_id: &ConversationId,
        transition: &StackTransition,
        stack_depth: usize,
    ) {
        metrics::counter!(
            "parley_dialog_transition_total",
            "transition" => transition.as_str()
        )
        .increment(1);
        metrics::histogram!("parley_dialog_stack_depth").record(stack_depth as f64);
    }

    fn on_turn_success(
        &self,
        _conversation_id: &ConversationId,
        operation: DialogOperation,
        result: &TurnResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_dialog_turn_success_total",
            "operation" => operation.as_str(),
            "status" => format!("{:?}", result.status)
        )
        .increment(1);
        metrics::histogram!(
            "parley_dialog_turn_duration_seconds",
            "operation" => operation.as_str(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_turn_failure(
        &self,
        _conversation_id: &ConversationId,
        operation: DialogOperation,
        error: &DialogError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "parley_dialog_turn_failure_total",
            "operation" => operation.as_str(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parley_dialog_turn_duration_seconds",
            "operation" => operation.as_str(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}
