//! Turn router: resumes the active flow or classifies a fresh utterance.

use std::sync::Arc;

use pcommon::{ConversationId, OutboundMessage, TurnInput};
use pdialog::{
    DialogContext, DialogEngine, DialogError, DialogErrorKind, DialogPolicy, DialogRuntimeHooks,
    NoopDialogHooks, TurnStatus,
};
use pprompt::{DefaultValidationRuntime, NoopValidatorHooks, ValidatorHooks};
use pservices::{ServiceId, observe_once};
use pstate::{ConversationStateStore, StateBackend};

use crate::insurance::messages::{DIALOG_RESET, GREETING, NOT_UNDERSTOOD, SERVICE_FAILURE};
use crate::insurance::{
    ConversationState, GATHER_INSURANCE_TYPE, INSURANCE_TYPE_ENTITY, NEED_INSURANCE_INTENT,
    insurance_flows, insurance_validators,
};
use crate::{
    Activity, BotError, BotServices, Channel, ConversationUpdate, MessageActivity, in_memory_backend,
};

#[derive(Clone)]
pub struct InsuranceBot {
    engine: DialogEngine<ConversationState>,
    services: BotServices,
    channel: Arc<dyn Channel>,
}

impl InsuranceBot {
    pub fn builder(services: BotServices, channel: Arc<dyn Channel>) -> InsuranceBotBuilder {
        InsuranceBotBuilder::new(services, channel)
    }

    pub fn engine(&self) -> &DialogEngine<ConversationState> {
        &self.engine
    }

    /// Handles one inbound activity end to end, including state save and delivery.
    pub async fn on_turn(&self, activity: Activity) -> Result<(), BotError> {
        match activity {
            Activity::Message(message) => self.on_message(message).await,
            Activity::ConversationUpdate(update) => self.on_conversation_update(update).await,
            Activity::Other {
                conversation_id,
                kind,
            } => {
                tracing::debug!(
                    phase = "router",
                    event = "activity_ignored",
                    conversation_id = %conversation_id,
                    kind = kind.as_str()
                );
                Ok(())
            }
        }
    }

    async fn on_message(&self, message: MessageActivity) -> Result<(), BotError> {
        let mut ctx = self
            .engine
            .create_context(message.conversation_id.clone())
            .await?;
        if let Some(trace_id) = message.trace_id.clone() {
            ctx = ctx.with_trace_id(trace_id);
        }

        // A stack that failed to load is reset; the next save overwrites it.
        let routed = match ctx.take_load_error() {
            Some(error) => Err(error),
            None => self.route(&mut ctx, &message.input).await,
        };
        if let Err(error) = routed {
            self.recover(&mut ctx, error)?;
        }

        self.engine.save(&mut ctx).await?;
        self.deliver(&message.conversation_id, ctx.take_outbox())
            .await
    }

    async fn route(
        &self,
        ctx: &mut DialogContext<ConversationState>,
        input: &TurnInput,
    ) -> Result<(), DialogError> {
        let result = self.engine.continue_dialog(ctx, input).await?;
        if ctx.has_sent() {
            return Ok(());
        }

        match result.status {
            TurnStatus::Empty => self.handle_utterance(ctx, input).await,
            TurnStatus::Waiting | TurnStatus::Complete | TurnStatus::Cancelled => Ok(()),
        }
    }

    async fn handle_utterance(
        &self,
        ctx: &mut DialogContext<ConversationState>,
        input: &TurnInput,
    ) -> Result<(), DialogError> {
        let Some(utterance) = input.as_text().map(str::trim).filter(|text| !text.is_empty())
        else {
            ctx.send(OutboundMessage::text(NOT_UNDERSTOOD));
            return Ok(());
        };

        let intent = observe_once(
            ServiceId::IntentClassifier,
            "classify",
            self.services.hooks.as_ref(),
            self.services.intent.classify(utterance),
        )
        .await?;

        if intent.top_intent == NEED_INSURANCE_INTENT {
            if let Some(kind) = intent
                .entity(INSURANCE_TYPE_ENTITY)
                .map(str::trim)
                .filter(|kind| !kind.is_empty())
            {
                ctx.state_or_default().insurance_type = Some(kind.to_string());
            }

            let options = ctx
                .state()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|err| DialogError::invalid_request(err.to_string()))?
                .unwrap_or_default();
            self.engine
                .begin(ctx, GATHER_INSURANCE_TYPE, options)
                .await?;
            return Ok(());
        }

        let answers = observe_once(
            ServiceId::KnowledgeBase,
            "query",
            self.services.hooks.as_ref(),
            self.services.knowledge.query(utterance),
        )
        .await?;

        // The knowledge base ranks its answers; the first one is sent as-is.
        match answers.into_iter().next() {
            Some(answer) => ctx.send(OutboundMessage::text(answer.answer)),
            None => ctx.send(OutboundMessage::text(NOT_UNDERSTOOD)),
        }
        Ok(())
    }

    /// Storage failures abort the turn; everything else is answered in-channel.
    fn recover(
        &self,
        ctx: &mut DialogContext<ConversationState>,
        error: DialogError,
    ) -> Result<(), BotError> {
        if error.kind == DialogErrorKind::Storage {
            return Err(error.into());
        }

        if error.is_service() {
            tracing::warn!(
                phase = "router",
                event = "service_failure",
                conversation_id = %ctx.conversation_id(),
                retryable = error.retryable,
                error = %error
            );
            ctx.send(OutboundMessage::text(SERVICE_FAILURE));
            return Ok(());
        }

        tracing::error!(
            phase = "router",
            event = "dialog_reset",
            conversation_id = %ctx.conversation_id(),
            error_kind = ?error.kind,
            error = %error
        );
        self.engine.cancel_all(ctx);
        ctx.send(OutboundMessage::text(DIALOG_RESET));
        Ok(())
    }

    async fn on_conversation_update(&self, update: ConversationUpdate) -> Result<(), BotError> {
        let bot_id = update.recipient_id.to_lowercase();
        let newcomers = update
            .members_added
            .iter()
            .filter(|member| member.to_lowercase() != bot_id)
            .map(|member| OutboundMessage::text(GREETING).with_recipient(member.clone()))
            .collect::<Vec<_>>();

        self.deliver(&update.conversation_id, newcomers).await
    }

    async fn deliver(
        &self,
        conversation_id: &ConversationId,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), BotError> {
        for message in messages {
            self.channel.send(conversation_id, message).await?;
        }
        Ok(())
    }
}

/// Wires services, state backend, hooks and policy into an [`InsuranceBot`].
pub struct InsuranceBotBuilder {
    services: BotServices,
    channel: Arc<dyn Channel>,
    backend: Arc<dyn StateBackend>,
    dialog_hooks: Arc<dyn DialogRuntimeHooks>,
    validator_hooks: Arc<dyn ValidatorHooks>,
    policy: DialogPolicy,
    current_year: Option<i32>,
}

impl InsuranceBotBuilder {
    pub fn new(services: BotServices, channel: Arc<dyn Channel>) -> Self {
        Self {
            services,
            channel,
            backend: in_memory_backend(),
            dialog_hooks: Arc::new(NoopDialogHooks),
            validator_hooks: Arc::new(NoopValidatorHooks),
            policy: DialogPolicy::default(),
            current_year: None,
        }
    }

    pub(crate) fn map_services<F>(mut self, update: F) -> Self
    where
        F: FnOnce(BotServices) -> BotServices,
    {
        self.services = update(self.services);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn StateBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn dialog_hooks(mut self, dialog_hooks: Arc<dyn DialogRuntimeHooks>) -> Self {
        self.dialog_hooks = dialog_hooks;
        self
    }

    pub fn validator_hooks(mut self, validator_hooks: Arc<dyn ValidatorHooks>) -> Self {
        self.validator_hooks = validator_hooks;
        self
    }

    pub fn policy(mut self, policy: DialogPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pins the reference year for car-year validation.
    pub fn current_year(mut self, current_year: i32) -> Self {
        self.current_year = Some(current_year);
        self
    }

    pub fn build(self) -> Result<InsuranceBot, BotError> {
        let validators = Arc::new(insurance_validators(&self.services, self.current_year));
        let validation =
            DefaultValidationRuntime::new(validators).with_hooks(self.validator_hooks);
        let flows = Arc::new(insurance_flows(&self.services));

        let engine = DialogEngine::new(ConversationStateStore::new(self.backend), flows)
            .with_validation_runtime(Arc::new(validation))
            .with_hooks(self.dialog_hooks)
            .with_policy(self.policy)?;

        Ok(InsuranceBot {
            engine,
            services: self.services,
            channel: self.channel,
        })
    }
}
