//! Tracing-based observability hooks for collaborator calls, validators, and dialog turns.
//!
//! ```rust
//! use pdialog::DialogRuntimeHooks;
//! use pobserve::TracingObservabilityHooks;
//!
//! fn accepts_dialog_hooks(_hooks: &dyn DialogRuntimeHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_dialog_hooks(&hooks);
//! ```

use std::time::Duration;

use pcommon::ConversationId;
use pdialog::{
    DialogError, DialogOperation, DialogRuntimeHooks, StackTransition, StepOutcome, TurnResult,
};
use pprompt::{PromptError, ValidationContext, ValidationOutcome, ValidatorHooks};
use pservices::{ServiceError, ServiceId, ServiceOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ServiceOperationHooks for TracingObservabilityHooks {
    fn on_call_start(&self, service: ServiceId, operation: &str) {
        tracing::debug!(
            phase = "service",
            event = "call_start",
            service = %service,
            operation
        );
    }

    fn on_call_success(&self, service: ServiceId, operation: &str, elapsed: Duration) {
        tracing::info!(
            phase = "service",
            event = "call_success",
            service = %service,
            operation,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_call_failure(
        &self,
        service: ServiceId,
        operation: &str,
        error: &ServiceError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "service",
            event = "call_failure",
            service = %service,
            operation,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ValidatorHooks for TracingObservabilityHooks {
    fn on_validation_start(&self, validator_id: &str, context: &ValidationContext) {
        tracing::debug!(
            phase = "validator",
            event = "validation_start",
            validator_id,
            conversation_id = %context.conversation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_validation_complete(
        &self,
        validator_id: &str,
        context: &ValidationContext,
        outcome: &ValidationOutcome,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "validator",
            event = "validation_complete",
            validator_id,
            conversation_id = %context.conversation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            accepted = outcome.accepted,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_validation_failure(
        &self,
        validator_id: &str,
        context: &ValidationContext,
        error: &PromptError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "validator",
            event = "validation_failure",
            validator_id,
            conversation_id = %context.conversation_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl DialogRuntimeHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, conversation_id: &ConversationId, operation: DialogOperation) {
        tracing::info!(
            phase = "dialog",
            event = "turn_start",
            conversation_id = %conversation_id,
            operation = operation.as_str()
        );
    }

    fn on_step_start(&self, conversation_id: &ConversationId, flow_id: &str, step_index: usize) {
        tracing::debug!(
            phase = "dialog",
            event = "step_start",
            conversation_id = %conversation_id,
            flow_id,
            step_index
        );
    }

    fn on_step_success(
        &self,
        conversation_id: &ConversationId,
        flow_id: &str,
        step_index: usize,
        outcome: &StepOutcome,
        elapsed: Duration,
    ) {
        tracing::debug!(
            phase = "dialog",
            event = "step_success",
            conversation_id = %conversation_id,
            flow_id,
            step_index,
            outcome = outcome.as_str(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_transition(
        &self,
        conversation_id: &ConversationId,
        transition: &StackTransition,
        stack_depth: usize,
    ) {
        tracing::debug!(
            phase = "dialog",
            event = "transition",
            conversation_id = %conversation_id,
            transition = transition.as_str(),
            detail = ?transition,
            stack_depth
        );
    }

    fn on_turn_success(
        &self,
        conversation_id: &ConversationId,
        operation: DialogOperation,
        result: &TurnResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "dialog",
            event = "turn_success",
            conversation_id = %conversation_id,
            operation = operation.as_str(),
            status = ?result.status,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failure(
        &self,
        conversation_id: &ConversationId,
        operation: DialogOperation,
        error: &DialogError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "dialog",
            event = "turn_failure",
            conversation_id = %conversation_id,
            operation = operation.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            invariant_violation = error.is_invariant_violation(),
            error = %error
        );
    }
}
