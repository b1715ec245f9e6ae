//! Steps, flows, and the flow registry.
//!
//! A step receives an owned [`StepContext`] and hands it back inside a
//! [`StepResult`] together with the action it wants the engine to take.
//!
//! ```rust
//! use pdialog::{Flow, FlowRegistry, PromptRequest};
//!
//! #[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
//! struct Profile {
//!     name: Option<String>,
//! }
//!
//! let flow = Flow::<Profile>::new("greet")
//!     .step("ask_name", |ctx| async move {
//!         Ok(ctx.prompt(PromptRequest::text("What is your name?")))
//!     })
//!     .step("thank", |mut ctx| async move {
//!         let name = ctx.result_text().unwrap_or_default().to_string();
//!         ctx.state_or_default().name = Some(name.clone());
//!         ctx.send_text(format!("Thanks, {name}!"));
//!         Ok(ctx.end(None))
//!     });
//!
//! let mut flows = FlowRegistry::new();
//! flows.register(flow);
//! assert!(flows.contains("greet"));
//! assert_eq!(flows.get("greet").map(|flow| flow.len()), Some(2));
//! ```

use std::future::Future;
use std::sync::Arc;

use pcommon::{BoxFuture, ConversationId, OutboundMessage, Registry};
use pprompt::PromptValue;
use serde::de::DeserializeOwned;

use crate::{DialogError, DialogState, PromptRequest};

pub type StepFuture<'a, T> = BoxFuture<'a, T>;

/// Action requested by a step once it has finished its work.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Send the prompt and wait for the next turn.
    Prompt(PromptRequest),
    /// Run the next step of this flow inline with the given result.
    Next(Option<PromptValue>),
    /// Pop this flow and hand the result to the parent.
    End(Option<PromptValue>),
    Replace {
        flow_id: String,
        options: serde_json::Value,
    },
    Begin {
        flow_id: String,
        options: serde_json::Value,
    },
    CancelAll,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt(_) => "prompt",
            Self::Next(_) => "next",
            Self::End(_) => "end",
            Self::Replace { .. } => "replace",
            Self::Begin { .. } => "begin",
            Self::CancelAll => "cancel_all",
        }
    }
}

/// Working copy handed to a single step execution.
#[derive(Debug, Clone)]
pub struct StepContext<S> {
    conversation_id: ConversationId,
    flow_id: String,
    step_index: usize,
    options: serde_json::Value,
    state: Option<S>,
    result: Option<PromptValue>,
    outbox: Vec<OutboundMessage>,
}

impl<S> StepContext<S>
where
    S: DialogState,
{
    pub(crate) fn new(
        conversation_id: ConversationId,
        flow_id: String,
        step_index: usize,
        options: serde_json::Value,
        state: Option<S>,
        result: Option<PromptValue>,
    ) -> Self {
        Self {
            conversation_id,
            flow_id,
            step_index,
            options,
            state,
            result,
            outbox: Vec::new(),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn options(&self) -> &serde_json::Value {
        &self.options
    }

    /// Decodes the flow's start options, or `None` when they don't fit `T`.
    pub fn options_as<T>(&self) -> Option<T>
    where
        T: DeserializeOwned,
    {
        if self.options.is_null() {
            return None;
        }
        serde_json::from_value(self.options.clone()).ok()
    }

    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut S> {
        self.state.as_mut()
    }

    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }

    pub fn set_state(&mut self, state: S) {
        self.state = Some(state);
    }

    pub fn state_or_default(&mut self) -> &mut S
    where
        S: Default,
    {
        self.state.get_or_insert_with(S::default)
    }

    /// Result of the previous step, a validated answer, or a finished child flow.
    pub fn result(&self) -> Option<&PromptValue> {
        self.result.as_ref()
    }

    pub fn result_text(&self) -> Option<&str> {
        self.result.as_ref().and_then(PromptValue::as_text)
    }

    pub fn take_result(&mut self) -> Option<PromptValue> {
        self.result.take()
    }

    pub fn send(&mut self, message: OutboundMessage) {
        self.outbox.push(message);
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.send(OutboundMessage::text(text));
    }

    pub fn sent(&self) -> &[OutboundMessage] {
        &self.outbox
    }

    pub fn prompt(self, request: PromptRequest) -> StepResult<S> {
        StepResult::new(self, StepOutcome::Prompt(request))
    }

    pub fn next(self, result: Option<PromptValue>) -> StepResult<S> {
        StepResult::new(self, StepOutcome::Next(result))
    }

    /// Advances to the next step, forwarding the current result unchanged.
    pub fn skip(mut self) -> StepResult<S> {
        let result = self.result.take();
        self.next(result)
    }

    pub fn end(self, result: Option<PromptValue>) -> StepResult<S> {
        StepResult::new(self, StepOutcome::End(result))
    }

    pub fn replace(self, flow_id: impl Into<String>, options: serde_json::Value) -> StepResult<S> {
        StepResult::new(
            self,
            StepOutcome::Replace {
                flow_id: flow_id.into(),
                options,
            },
        )
    }

    pub fn begin(self, flow_id: impl Into<String>, options: serde_json::Value) -> StepResult<S> {
        StepResult::new(
            self,
            StepOutcome::Begin {
                flow_id: flow_id.into(),
                options,
            },
        )
    }

    pub fn cancel_all(self) -> StepResult<S> {
        StepResult::new(self, StepOutcome::CancelAll)
    }

    pub(crate) fn into_parts(self) -> (Option<S>, Vec<OutboundMessage>) {
        (self.state, self.outbox)
    }
}

/// The step's working copy plus its requested transition.
#[derive(Debug, Clone)]
pub struct StepResult<S> {
    pub context: StepContext<S>,
    pub outcome: StepOutcome,
}

impl<S> StepResult<S> {
    pub fn new(context: StepContext<S>, outcome: StepOutcome) -> Self {
        Self { context, outcome }
    }
}

pub trait Step<S>: Send + Sync {
    fn name(&self) -> &str;

    fn run<'a>(
        &'a self,
        context: StepContext<S>,
    ) -> StepFuture<'a, Result<StepResult<S>, DialogError>>;
}

type StepHandler<S> = dyn Fn(StepContext<S>) -> StepFuture<'static, Result<StepResult<S>, DialogError>>
    + Send
    + Sync;

pub struct FunctionStep<S> {
    name: String,
    handler: Arc<StepHandler<S>>,
}

impl<S> FunctionStep<S>
where
    S: DialogState,
{
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(StepContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StepResult<S>, DialogError>> + Send + 'static,
    {
        let handler: Arc<StepHandler<S>> = Arc::new(move |context| Box::pin(handler(context)));

        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<S> Step<S> for FunctionStep<S>
where
    S: DialogState,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(
        &'a self,
        context: StepContext<S>,
    ) -> StepFuture<'a, Result<StepResult<S>, DialogError>> {
        (self.handler)(context)
    }
}

/// A named, ordered sequence of steps.
pub struct Flow<S> {
    id: String,
    steps: Vec<Arc<dyn Step<S>>>,
}

impl<S> Flow<S>
where
    S: DialogState,
{
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_step<T>(mut self, step: T) -> Self
    where
        T: Step<S> + 'static,
    {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn step<F, Fut>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(StepContext<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StepResult<S>, DialogError>> + Send + 'static,
    {
        self.with_step(FunctionStep::new(name, handler))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, index: usize) -> Option<Arc<dyn Step<S>>> {
        self.steps.get(index).cloned()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub struct FlowRegistry<S> {
    flows: Registry<String, Arc<Flow<S>>>,
}

impl<S> Default for FlowRegistry<S> {
    fn default() -> Self {
        Self {
            flows: Registry::default(),
        }
    }
}

impl<S> FlowRegistry<S>
where
    S: DialogState,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, flow: Flow<S>) {
        self.flows.insert(flow.id().to_string(), Arc::new(flow));
    }

    pub fn get(&self, flow_id: &str) -> Option<Arc<Flow<S>>> {
        self.flows.get(flow_id).cloned()
    }

    pub fn contains(&self, flow_id: &str) -> bool {
        self.flows.contains_key(flow_id)
    }

    pub fn remove(&mut self, flow_id: &str) -> Option<Arc<Flow<S>>> {
        self.flows.remove(flow_id)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
