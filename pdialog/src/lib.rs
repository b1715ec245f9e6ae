//! Stack-based multi-turn dialog engine.
//!
//! Flows are ordered step sequences registered once in a [`FlowRegistry`].
//! A conversation's [`DialogStack`] records which flow invocations are active
//! and which prompt the top frame is waiting on, so every turn can rebuild
//! "where we were" from the state store alone.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pdialog::{DialogEngine, DialogPolicy, Flow, FlowRegistry, PromptRequest};
//! use pstate::{ConversationStateStore, InMemoryStateBackend};
//!
//! let mut flows = FlowRegistry::<serde_json::Value>::new();
//! flows.register(Flow::new("hello").step("ask", |ctx| async move {
//!     Ok(ctx.prompt(PromptRequest::text("Hello! What's your name?")))
//! }));
//!
//! let store = ConversationStateStore::new(Arc::new(InMemoryStateBackend::new()));
//! let engine = DialogEngine::new(store, Arc::new(flows))
//!     .with_policy(DialogPolicy::default().with_max_chain_depth(8))
//!     .expect("policy should be valid");
//!
//! assert_eq!(engine.policy().max_chain_depth, 8);
//! assert!(engine.flows().contains("hello"));
//! ```

mod engine;
mod error;
mod flow;
mod hooks;
mod types;

pub mod prelude {
    pub use crate::{
        DialogContext, DialogEngine, DialogError, DialogErrorKind, DialogFrame, DialogPolicy,
        DialogRuntimeHooks, DialogStack, DialogState, Flow, FlowRegistry, PromptRequest, Step,
        StepContext, StepOutcome, StepResult, TurnResult, TurnStatus,
    };
}

pub use engine::{CONVERSATION_STATE_KEY, DIALOG_STACK_KEY, DialogContext, DialogEngine};
pub use error::{DialogError, DialogErrorKind};
pub use flow::{
    Flow, FlowRegistry, FunctionStep, Step, StepContext, StepFuture, StepOutcome, StepResult,
};
pub use hooks::{DialogRuntimeHooks, NoopDialogHooks};
pub use types::{
    DialogFrame, DialogOperation, DialogPolicy, DialogStack, DialogState, PendingPrompt,
    PromptRequest, StackTransition, TurnResult, TurnStatus,
};
