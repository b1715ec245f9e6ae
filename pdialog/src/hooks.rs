//! Runtime hooks for dialog turn and step lifecycle events.
//!
//! ```rust
//! use pdialog::{DialogRuntimeHooks, NoopDialogHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn DialogRuntimeHooks) {}
//!
//! let hooks = NoopDialogHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use pcommon::ConversationId;

use crate::{DialogError, DialogOperation, StackTransition, StepOutcome, TurnResult};

pub trait DialogRuntimeHooks: Send + Sync {
    fn on_turn_start(&self, _conversation_id: &ConversationId, _operation: DialogOperation) {}

    fn on_step_start(&self, _conversation_id: &ConversationId, _flow_id: &str, _step_index: usize) {
    }

    fn on_step_success(
        &self,
        _conversation_id: &ConversationId,
        _flow_id: &str,
        _step_index: usize,
        _outcome: &StepOutcome,
        _elapsed: Duration,
    ) {
    }

    fn on_transition(
        &self,
        _conversation_id: &ConversationId,
        _transition: &StackTransition,
        _stack_depth: usize,
    ) {
    }

    fn on_turn_success(
        &self,
        _conversation_id: &ConversationId,
        _operation: DialogOperation,
        _result: &TurnResult,
        _elapsed: Duration,
    ) {
    }

    fn on_turn_failure(
        &self,
        _conversation_id: &ConversationId,
        _operation: DialogOperation,
        _error: &DialogError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDialogHooks;

impl DialogRuntimeHooks for NoopDialogHooks {}
