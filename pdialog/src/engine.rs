//! Dialog stack engine: resumes, chains, and persists flows across turns.

use std::sync::Arc;
use std::time::Instant;

use pcommon::{ConversationId, OutboundMessage, TraceId, TurnInput};
use pprompt::{DefaultValidationRuntime, PromptValue, ValidationContext, ValidationRuntime};
use pstate::{ConversationStateStore, TurnState};

use crate::{
    DialogError, DialogFrame, DialogOperation, DialogPolicy, DialogRuntimeHooks, DialogStack,
    DialogState, FlowRegistry, NoopDialogHooks, PendingPrompt, StackTransition, StepContext,
    StepOutcome, StepResult, TurnResult,
};

pub const DIALOG_STACK_KEY: &str = "dialog_stack";
pub const CONVERSATION_STATE_KEY: &str = "conversation_state";

/// One conversation's stack, state, and pending outbound messages for a turn.
pub struct DialogContext<S> {
    turn: TurnState,
    trace_id: Option<TraceId>,
    stack: DialogStack,
    state: Option<S>,
    outbox: Vec<OutboundMessage>,
    load_error: Option<DialogError>,
}

impl<S> DialogContext<S>
where
    S: DialogState,
{
    pub fn conversation_id(&self) -> &ConversationId {
        self.turn.conversation_id()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn stack(&self) -> &DialogStack {
        &self.stack
    }

    pub fn is_active(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut S> {
        self.state.as_mut()
    }

    pub fn state_or_default(&mut self) -> &mut S
    where
        S: Default,
    {
        self.state.get_or_insert_with(S::default)
    }

    pub fn set_state(&mut self, state: S) {
        self.state = Some(state);
    }

    pub fn send(&mut self, message: OutboundMessage) {
        self.outbox.push(message);
    }

    pub fn outbox(&self) -> &[OutboundMessage] {
        &self.outbox
    }

    pub fn has_sent(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn take_outbox(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// The decode failure that forced an empty stack or state at load time.
    pub fn load_error(&self) -> Option<&DialogError> {
        self.load_error.as_ref()
    }

    pub fn take_load_error(&mut self) -> Option<DialogError> {
        self.load_error.take()
    }

    fn working_copy(&self) -> WorkingCopy<S> {
        WorkingCopy {
            conversation_id: self.conversation_id().clone(),
            trace_id: self.trace_id.clone(),
            stack: self.stack.clone(),
            state: self.state.clone(),
            outbox: Vec::new(),
        }
    }

    fn commit(&mut self, work: WorkingCopy<S>) {
        self.stack = work.stack;
        self.state = work.state;
        self.outbox.extend(work.outbox);
    }
}

struct WorkingCopy<S> {
    conversation_id: ConversationId,
    trace_id: Option<TraceId>,
    stack: DialogStack,
    state: Option<S>,
    outbox: Vec<OutboundMessage>,
}

impl<S> WorkingCopy<S> {
    fn top_mut(&mut self) -> Result<&mut DialogFrame, DialogError> {
        self.stack
            .top_mut()
            .ok_or_else(|| DialogError::invalid_stack("dialog stack emptied during a step"))
    }
}

#[derive(Clone)]
pub struct DialogEngine<S> {
    store: ConversationStateStore,
    flows: Arc<FlowRegistry<S>>,
    validation: Arc<dyn ValidationRuntime>,
    hooks: Arc<dyn DialogRuntimeHooks>,
    policy: DialogPolicy,
}

impl<S> DialogEngine<S>
where
    S: DialogState,
{
    pub fn new(store: ConversationStateStore, flows: Arc<FlowRegistry<S>>) -> Self {
        Self {
            store,
            flows,
            validation: Arc::new(DefaultValidationRuntime::default()),
            hooks: Arc::new(NoopDialogHooks),
            policy: DialogPolicy::default(),
        }
    }

    pub fn with_validation_runtime(mut self, validation: Arc<dyn ValidationRuntime>) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DialogRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_policy(mut self, policy: DialogPolicy) -> Result<Self, DialogError> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn policy(&self) -> &DialogPolicy {
        &self.policy
    }

    pub fn flows(&self) -> Arc<FlowRegistry<S>> {
        Arc::clone(&self.flows)
    }

    pub fn store(&self) -> &ConversationStateStore {
        &self.store
    }

    /// Loads the conversation's stack and state; a new conversation starts empty.
    pub async fn create_context(
        &self,
        conversation_id: impl Into<ConversationId>,
    ) -> Result<DialogContext<S>, DialogError> {
        let turn = self.store.load(conversation_id).await?;
        let mut load_error = None;

        // Undecodable properties load as empty so the caller can reset and overwrite them.
        let stack = match turn.get::<DialogStack>(DIALOG_STACK_KEY) {
            Ok(stack) => stack.unwrap_or_default(),
            Err(error) => {
                load_error = Some(DialogError::invalid_stack(format!(
                    "stored dialog stack is unreadable: {}",
                    error.message
                )));
                DialogStack::default()
            }
        };
        let state = match turn.get::<S>(CONVERSATION_STATE_KEY) {
            Ok(state) => state,
            Err(error) => {
                load_error.get_or_insert_with(|| {
                    DialogError::invalid_stack(format!(
                        "stored conversation state is unreadable: {}",
                        error.message
                    ))
                });
                None
            }
        };

        Ok(DialogContext {
            turn,
            trace_id: None,
            stack,
            state,
            outbox: Vec::new(),
            load_error,
        })
    }

    /// Feeds one user turn to the active frame's pending prompt.
    pub async fn continue_dialog(
        &self,
        ctx: &mut DialogContext<S>,
        input: &TurnInput,
    ) -> Result<TurnResult, DialogError> {
        let started_at = Instant::now();
        self.hooks
            .on_turn_start(ctx.conversation_id(), DialogOperation::Continue);

        let mut work = ctx.working_copy();
        let result = self.continue_working(&mut work, input).await;
        self.finish(ctx, work, DialogOperation::Continue, result, started_at)
    }

    /// Pushes a new frame for `flow_id` and drives it until it prompts or ends.
    pub async fn begin(
        &self,
        ctx: &mut DialogContext<S>,
        flow_id: &str,
        options: serde_json::Value,
    ) -> Result<TurnResult, DialogError> {
        let started_at = Instant::now();
        self.hooks
            .on_turn_start(ctx.conversation_id(), DialogOperation::Begin);

        let mut work = ctx.working_copy();
        let result = self.begin_working(&mut work, flow_id, options).await;
        self.finish(ctx, work, DialogOperation::Begin, result, started_at)
    }

    /// Ends the active frame, if any, and begins `flow_id` in its place.
    pub async fn replace(
        &self,
        ctx: &mut DialogContext<S>,
        flow_id: &str,
        options: serde_json::Value,
    ) -> Result<TurnResult, DialogError> {
        let started_at = Instant::now();
        self.hooks
            .on_turn_start(ctx.conversation_id(), DialogOperation::Replace);

        let mut work = ctx.working_copy();
        let result = self.replace_working(&mut work, flow_id, options).await;
        self.finish(ctx, work, DialogOperation::Replace, result, started_at)
    }

    pub fn cancel_all(&self, ctx: &mut DialogContext<S>) -> TurnResult {
        let started_at = Instant::now();
        self.hooks
            .on_turn_start(ctx.conversation_id(), DialogOperation::CancelAll);

        let frames = ctx.stack.len();
        ctx.stack.clear();
        self.hooks.on_transition(
            ctx.turn.conversation_id(),
            &StackTransition::Cleared { frames },
            0,
        );

        let result = TurnResult::cancelled();
        self.hooks.on_turn_success(
            ctx.turn.conversation_id(),
            DialogOperation::CancelAll,
            &result,
            started_at.elapsed(),
        );
        result
    }

    /// Writes the stack and state back in a single store flush.
    pub async fn save(&self, ctx: &mut DialogContext<S>) -> Result<(), DialogError> {
        ctx.stack.validate()?;
        ctx.turn.set(DIALOG_STACK_KEY, &ctx.stack)?;
        match &ctx.state {
            Some(state) => ctx.turn.set(CONVERSATION_STATE_KEY, state)?,
            None => {
                ctx.turn.remove(CONVERSATION_STATE_KEY);
            }
        }
        ctx.turn.save_changes().await?;
        Ok(())
    }

    fn finish(
        &self,
        ctx: &mut DialogContext<S>,
        work: WorkingCopy<S>,
        operation: DialogOperation,
        result: Result<TurnResult, DialogError>,
        started_at: Instant,
    ) -> Result<TurnResult, DialogError> {
        match &result {
            Ok(turn_result) => {
                ctx.commit(work);
                self.hooks.on_turn_success(
                    ctx.conversation_id(),
                    operation,
                    turn_result,
                    started_at.elapsed(),
                );
            }
            Err(error) => self.hooks.on_turn_failure(
                ctx.conversation_id(),
                operation,
                error,
                started_at.elapsed(),
            ),
        }

        result
    }

    async fn continue_working(
        &self,
        work: &mut WorkingCopy<S>,
        input: &TurnInput,
    ) -> Result<TurnResult, DialogError> {
        let Some(frame) = work.stack.top() else {
            return Ok(TurnResult::empty());
        };
        let Some(pending) = frame.pending_prompt.clone() else {
            return Err(DialogError::invalid_stack(format!(
                "top frame '{}' is not waiting on a prompt",
                frame.flow_id
            )));
        };
        let flow_id = frame.flow_id.clone();

        let value = match pending.request.validator_id.as_deref() {
            None => raw_value(input),
            Some(validator_id) => {
                let context = validation_context(work, &pending);
                let outcome = self
                    .validation
                    .validate(validator_id, input, &context)
                    .await?;

                if !outcome.accepted {
                    let message = match outcome.retry_prompt {
                        Some(text) => OutboundMessage::text(text),
                        None => pending.retry_message(),
                    };
                    let frame = work.top_mut()?;
                    let rejections = match frame.pending_prompt.as_mut() {
                        Some(pending) => {
                            pending.rejections += 1;
                            pending.rejections
                        }
                        None => 0,
                    };
                    work.outbox.push(message);
                    self.transition(
                        work,
                        StackTransition::Rejected {
                            flow_id,
                            rejections,
                        },
                    );
                    return Ok(TurnResult::waiting());
                }

                outcome.value.unwrap_or_else(|| raw_value(input))
            }
        };

        work.top_mut()?.pending_prompt = None;
        self.drive(work, Some(value)).await
    }

    async fn begin_working(
        &self,
        work: &mut WorkingCopy<S>,
        flow_id: &str,
        options: serde_json::Value,
    ) -> Result<TurnResult, DialogError> {
        self.ensure_flow(flow_id)?;
        if let Some(parent) = work.stack.top_mut() {
            parent.pending_prompt = None;
        }

        work.stack.push(DialogFrame::new(flow_id, options));
        self.transition(
            work,
            StackTransition::Pushed {
                flow_id: flow_id.to_string(),
            },
        );
        self.drive(work, None).await
    }

    async fn replace_working(
        &self,
        work: &mut WorkingCopy<S>,
        flow_id: &str,
        options: serde_json::Value,
    ) -> Result<TurnResult, DialogError> {
        self.ensure_flow(flow_id)?;

        let transition = match work.stack.pop() {
            Some(previous) => StackTransition::Replaced {
                from: previous.flow_id,
                to: flow_id.to_string(),
            },
            None => StackTransition::Pushed {
                flow_id: flow_id.to_string(),
            },
        };
        work.stack.push(DialogFrame::new(flow_id, options));
        self.transition(work, transition);
        self.drive(work, None).await
    }

    /// Runs steps until one prompts, the stack empties, or the chain limit trips.
    async fn drive(
        &self,
        work: &mut WorkingCopy<S>,
        mut result: Option<PromptValue>,
    ) -> Result<TurnResult, DialogError> {
        let mut driven = 0_usize;

        loop {
            let Some(frame) = work.stack.top() else {
                return Ok(TurnResult::complete(result));
            };

            driven += 1;
            if driven > self.policy.max_chain_depth {
                return Err(DialogError::chain_depth_exceeded(format!(
                    "more than {} steps driven in one turn (last flow '{}')",
                    self.policy.max_chain_depth, frame.flow_id
                )));
            }

            let flow_id = frame.flow_id.clone();
            let step_index = frame.step_index;
            let options = frame.options.clone();

            let flow = self
                .flows
                .get(&flow_id)
                .ok_or_else(|| DialogError::unknown_flow(&flow_id))?;
            let step = flow.get(step_index).ok_or_else(|| {
                DialogError::invalid_stack(format!(
                    "flow '{flow_id}' has no step {step_index} and did not end"
                ))
            })?;

            let context = StepContext::new(
                work.conversation_id.clone(),
                flow_id.clone(),
                step_index,
                options,
                work.state.clone(),
                result.take(),
            );

            self.hooks
                .on_step_start(&work.conversation_id, &flow_id, step_index);
            let started_at = Instant::now();
            let StepResult { context, outcome } = step.run(context).await?;
            self.hooks.on_step_success(
                &work.conversation_id,
                &flow_id,
                step_index,
                &outcome,
                started_at.elapsed(),
            );

            let (state, outbox) = context.into_parts();
            work.state = state;
            work.outbox.extend(outbox);

            match outcome {
                StepOutcome::Prompt(request) => {
                    let frame = work.top_mut()?;
                    frame.step_index += 1;
                    let next_index = frame.step_index;
                    let message = request.message.clone();
                    frame.pending_prompt = Some(PendingPrompt::new(request));
                    work.outbox.push(message);
                    self.transition(
                        work,
                        StackTransition::Prompted {
                            flow_id,
                            step_index: next_index,
                        },
                    );
                    return Ok(TurnResult::waiting());
                }
                StepOutcome::Next(next) => {
                    let frame = work.top_mut()?;
                    frame.step_index += 1;
                    let next_index = frame.step_index;
                    result = next;
                    self.transition(
                        work,
                        StackTransition::Advanced {
                            flow_id,
                            step_index: next_index,
                        },
                    );
                }
                StepOutcome::End(value) => {
                    work.stack.pop();
                    result = value;
                    self.transition(work, StackTransition::Popped { flow_id });
                }
                StepOutcome::Replace {
                    flow_id: next_flow,
                    options,
                } => {
                    self.ensure_flow(&next_flow)?;
                    work.stack.pop();
                    work.stack.push(DialogFrame::new(next_flow.clone(), options));
                    self.transition(
                        work,
                        StackTransition::Replaced {
                            from: flow_id,
                            to: next_flow,
                        },
                    );
                }
                StepOutcome::Begin {
                    flow_id: child_flow,
                    options,
                } => {
                    self.ensure_flow(&child_flow)?;
                    work.top_mut()?.step_index += 1;
                    work.stack
                        .push(DialogFrame::new(child_flow.clone(), options));
                    self.transition(
                        work,
                        StackTransition::Pushed {
                            flow_id: child_flow,
                        },
                    );
                }
                StepOutcome::CancelAll => {
                    let frames = work.stack.len();
                    work.stack.clear();
                    self.transition(work, StackTransition::Cleared { frames });
                    return Ok(TurnResult::cancelled());
                }
            }
        }
    }

    fn ensure_flow(&self, flow_id: &str) -> Result<(), DialogError> {
        if self.flows.contains(flow_id) {
            Ok(())
        } else {
            Err(DialogError::unknown_flow(flow_id))
        }
    }

    fn transition(&self, work: &WorkingCopy<S>, transition: StackTransition) {
        self.hooks
            .on_transition(&work.conversation_id, &transition, work.stack.len());
    }
}

fn raw_value(input: &TurnInput) -> PromptValue {
    match input {
        TurnInput::Text(text) | TurnInput::Choice(text) => PromptValue::Text(text.clone()),
        TurnInput::Attachments(attachments) => PromptValue::Attachments(attachments.clone()),
    }
}

fn validation_context<S>(work: &WorkingCopy<S>, pending: &PendingPrompt) -> ValidationContext {
    let mut context = ValidationContext::new(work.conversation_id.clone())
        .with_choices(pending.request.message.choices.clone());
    context.metadata.extend(pending.request.metadata.clone());
    if let Some(trace_id) = &work.trace_id {
        context = context.with_trace_id(trace_id.clone());
    }
    context
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use pprompt::{ValidationOutcome, ValidatorRegistry};
    use pservices::ServiceError;
    use pstate::InMemoryStateBackend;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::{DialogErrorKind, Flow, PromptRequest, TurnStatus};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Pet {
        name: Option<String>,
        age: Option<i64>,
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl DialogRuntimeHooks for RecordingHooks {
        fn on_transition(
            &self,
            _conversation_id: &ConversationId,
            transition: &StackTransition,
            stack_depth: usize,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("{}:{stack_depth}", transition.as_str()));
        }

        fn on_turn_failure(
            &self,
            _conversation_id: &ConversationId,
            operation: DialogOperation,
            error: &DialogError,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("failure:{}:{:?}", operation.as_str(), error.kind));
        }
    }

    fn validators() -> Arc<ValidatorRegistry> {
        let mut registry = ValidatorRegistry::new();
        registry.register_sync_fn("age", |input, _context| {
            Ok(match input.as_text().and_then(|text| text.trim().parse::<i64>().ok()) {
                Some(age) if age >= 0 => ValidationOutcome::accept(PromptValue::Number(age)),
                _ => ValidationOutcome::reject("Please enter an age in years."),
            })
        });
        Arc::new(registry)
    }

    fn flows() -> Arc<FlowRegistry<Pet>> {
        let mut flows = FlowRegistry::new();
        flows.register(
            Flow::<Pet>::new("pet")
                .step("ask_name", |ctx| async move {
                    Ok(ctx.prompt(PromptRequest::text("What's your pet called?")))
                })
                .step("ask_age", |mut ctx| async move {
                    let name = ctx.result_text().map(str::to_string);
                    ctx.state_or_default().name = name;
                    Ok(ctx.prompt(PromptRequest::text("How old?").with_validator("age")))
                })
                .step("finish", |mut ctx| async move {
                    let age = ctx.result().and_then(PromptValue::as_number);
                    ctx.state_or_default().age = age;
                    ctx.send_text("Saved.");
                    Ok(ctx.end(Some(PromptValue::text("done"))))
                }),
        );
        Arc::new(flows)
    }

    fn engine(hooks: Arc<RecordingHooks>) -> DialogEngine<Pet> {
        DialogEngine::new(
            ConversationStateStore::new(Arc::new(InMemoryStateBackend::new())),
            flows(),
        )
        .with_validation_runtime(Arc::new(DefaultValidationRuntime::new(validators())))
        .with_hooks(hooks)
    }

    #[tokio::test]
    async fn begin_prompts_then_continue_resumes_and_completes() {
        let hooks = Arc::new(RecordingHooks::default());
        let engine = engine(hooks.clone());

        let mut ctx = engine.create_context("conv-1").await.expect("context");
        let result = engine
            .begin(&mut ctx, "pet", serde_json::Value::Null)
            .await
            .expect("begin");
        assert_eq!(result.status, TurnStatus::Waiting);
        assert_eq!(ctx.stack().top().map(|frame| frame.step_index), Some(1));
        assert_eq!(ctx.take_outbox()[0].text, "What's your pet called?");

        let result = engine
            .continue_dialog(&mut ctx, &TurnInput::text("Rex"))
            .await
            .expect("name");
        assert_eq!(result.status, TurnStatus::Waiting);

        let result = engine
            .continue_dialog(&mut ctx, &TurnInput::text("old"))
            .await
            .expect("rejected age");
        assert_eq!(result.status, TurnStatus::Waiting);
        assert_eq!(ctx.stack().top().map(|frame| frame.step_index), Some(2));

        let result = engine
            .continue_dialog(&mut ctx, &TurnInput::text("4"))
            .await
            .expect("age");
        assert_eq!(result.status, TurnStatus::Complete);
        assert_eq!(result.result, Some(PromptValue::text("done")));
        assert!(!ctx.is_active());
        assert_eq!(
            ctx.state(),
            Some(&Pet {
                name: Some("Rex".to_string()),
                age: Some(4),
            })
        );

        let texts: Vec<String> = ctx.take_outbox().into_iter().map(|m| m.text).collect();
        assert_eq!(
            texts,
            vec!["How old?", "Please enter an age in years.", "Saved."]
        );

        let events = hooks.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec!["pushed:1", "prompted:1", "prompted:1", "rejected:1", "popped:0"]
        );
    }

    #[tokio::test]
    async fn continue_on_empty_stack_reports_empty() {
        let engine = engine(Arc::new(RecordingHooks::default()));
        let mut ctx = engine.create_context("conv-2").await.expect("context");

        let result = engine
            .continue_dialog(&mut ctx, &TurnInput::text("hello"))
            .await
            .expect("continue");
        assert_eq!(result, TurnResult::empty());
        assert!(!ctx.has_sent());
    }

    #[tokio::test]
    async fn failed_step_discards_its_working_copy() {
        let mut flows = FlowRegistry::<Pet>::new();
        flows.register(
            Flow::<Pet>::new("flaky")
                .step("ask", |ctx| async move {
                    Ok(ctx.prompt(PromptRequest::text("Say something")))
                })
                .step("explode", |mut ctx| async move {
                    ctx.state_or_default().name = Some("changed".to_string());
                    ctx.send_text("never delivered");
                    Err(DialogError::from(ServiceError::unavailable(
                        "scorer offline",
                    )))
                }),
        );
        let hooks = Arc::new(RecordingHooks::default());
        let engine = DialogEngine::new(
            ConversationStateStore::new(Arc::new(InMemoryStateBackend::new())),
            Arc::new(flows),
        )
        .with_hooks(hooks.clone());

        let mut ctx = engine.create_context("conv-3").await.expect("context");
        engine
            .begin(&mut ctx, "flaky", serde_json::Value::Null)
            .await
            .expect("begin");
        ctx.take_outbox();
        let before = ctx.stack().clone();

        let error = engine
            .continue_dialog(&mut ctx, &TurnInput::text("hi"))
            .await
            .expect_err("step should fail");

        assert_eq!(error.kind, DialogErrorKind::Service);
        assert_eq!(ctx.stack(), &before);
        assert!(ctx.state().is_none());
        assert!(!ctx.has_sent());
        assert!(
            hooks
                .events
                .lock()
                .expect("events lock")
                .contains(&"failure:continue:Service".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_flow_is_rejected_before_touching_the_stack() {
        let engine = engine(Arc::new(RecordingHooks::default()));
        let mut ctx = engine.create_context("conv-4").await.expect("context");

        let error = engine
            .begin(&mut ctx, "missing", serde_json::Value::Null)
            .await
            .expect_err("unknown flow");
        assert_eq!(error.kind, DialogErrorKind::UnknownFlow);
        assert!(error.is_invariant_violation());
        assert!(ctx.stack().is_empty());
    }

    #[tokio::test]
    async fn cancel_all_and_save_persist_an_empty_stack() {
        let engine = engine(Arc::new(RecordingHooks::default()));
        let mut ctx = engine.create_context("conv-5").await.expect("context");
        engine
            .begin(&mut ctx, "pet", serde_json::Value::Null)
            .await
            .expect("begin");
        engine.save(&mut ctx).await.expect("save");

        let mut ctx = engine.create_context("conv-5").await.expect("reload");
        assert_eq!(ctx.stack().len(), 1);

        let result = engine.cancel_all(&mut ctx);
        assert_eq!(result.status, TurnStatus::Cancelled);
        engine.save(&mut ctx).await.expect("save");

        let ctx = engine.create_context("conv-5").await.expect("reload");
        assert!(!ctx.is_active());
    }

    #[tokio::test]
    async fn undecodable_stack_loads_empty_and_is_overwritten_on_save() {
        let store = ConversationStateStore::new(Arc::new(InMemoryStateBackend::new()));
        let mut turn = store.load("conv-6").await.expect("load");
        turn.set(DIALOG_STACK_KEY, &serde_json::json!({"not": "a stack"}))
            .expect("set");
        turn.save_changes().await.expect("seed");

        let engine = DialogEngine::new(store.clone(), flows());
        let mut ctx = engine.create_context("conv-6").await.expect("context");
        assert!(!ctx.is_active());
        assert_eq!(
            ctx.load_error().map(|error| error.kind),
            Some(DialogErrorKind::InvalidStack)
        );
        assert!(ctx.take_load_error().is_some());
        assert!(ctx.load_error().is_none());

        engine.save(&mut ctx).await.expect("save");
        let ctx = engine.create_context("conv-6").await.expect("reload");
        assert!(ctx.load_error().is_none());
        assert!(ctx.stack().is_empty());
    }

    #[test]
    fn raw_values_keep_text_and_attachments() {
        assert_eq!(raw_value(&TurnInput::choice("SUV")), PromptValue::text("SUV"));
        assert!(matches!(
            raw_value(&TurnInput::attachments(Vec::new())),
            PromptValue::Attachments(_)
        ));
    }
}
