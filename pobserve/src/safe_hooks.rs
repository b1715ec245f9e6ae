use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use pcommon::ConversationId;
use pdialog::{
    DialogError, DialogOperation, DialogRuntimeHooks, StackTransition, StepOutcome, TurnResult,
};
use pprompt::{PromptError, ValidationContext, ValidationOutcome, ValidatorHooks};
use pservices::{ServiceError, ServiceId, ServiceOperationHooks};

pub struct SafeServiceHooks<H> {
    inner: H,
}

impl<H> SafeServiceHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ServiceOperationHooks for SafeServiceHooks<H>
where
    H: ServiceOperationHooks,
{
    fn on_call_start(&self, service: ServiceId, operation: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_start(service, operation)
        }));
    }

    fn on_call_success(&self, service: ServiceId, operation: &str, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_success(service, operation, elapsed)
        }));
    }

    fn on_call_failure(
        &self,
        service: ServiceId,
        operation: &str,
        error: &ServiceError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_call_failure(service, operation, error, elapsed)
        }));
    }
}

pub struct SafeValidatorHooks<H> {
    inner: H,
}

impl<H> SafeValidatorHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ValidatorHooks for SafeValidatorHooks<H>
where
    H: ValidatorHooks,
{
    fn on_validation_start(&self, validator_id: &str, context: &ValidationContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_validation_start(validator_id, context)
        }));
    }

    fn on_validation_complete(
        &self,
        validator_id: &str,
        context: &ValidationContext,
        outcome: &ValidationOutcome,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_validation_complete(validator_id, context, outcome, elapsed)
        }));
    }

    fn on_validation_failure(
        &self,
        validator_id: &str,
        context: &ValidationContext,
        error: &PromptError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_validation_failure(validator_id, context, error, elapsed)
        }));
    }
}

pub struct SafeDialogHooks<H> {
    inner: H,
}

impl<H> SafeDialogHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> DialogRuntimeHooks for SafeDialogHooks<H>
where
    H: DialogRuntimeHooks,
{
    fn on_turn_start(&self, conversation_id: &ConversationId, operation: DialogOperation) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_start(conversation_id, operation)
        }));
    }

    fn on_step_start(&self, conversation_id: &ConversationId, flow_id: &str, step_index: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_step_start(conversation_id, flow_id, step_index)
        }));
    }

    fn on_step_success(
        &self,
        conversation_id: &ConversationId,
        flow_id: &str,
        step_index: usize,
        outcome: &StepOutcome,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_step_success(conversation_id, flow_id, step_index, outcome, elapsed)
        }));
    }

    fn on_transition(
        &self,
        conversation_id: &ConversationId,
        transition: &StackTransition,
        stack_depth: usize,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_transition(conversation_id, transition, stack_depth)
        }));
    }

    fn on_turn_success(
        &self,
        conversation_id: &ConversationId,
        operation: DialogOperation,
        result: &TurnResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_turn_success(conversation_id, operation, result, elapsed)
        }));
    }

    fn on_turn_failure(
        &self,
        conversation_id: &ConversationId,
        operation: DialogOperation,
        error: &DialogError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_turn_failure(conversation_id, operation, error, elapsed)
        }));
    }
}
