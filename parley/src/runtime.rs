//! Runtime wiring helpers for the insurance bot.

use std::sync::Arc;

use pdialog::{DialogPolicy, DialogRuntimeHooks};
use pobserve::{
    MetricsObservabilityHooks, SafeDialogHooks, SafeServiceHooks, SafeValidatorHooks,
    TracingObservabilityHooks,
};
use pprompt::ValidatorHooks;
use pservices::ServiceOperationHooks;
use pstate::{InMemoryStateBackend, StateBackend};

use crate::{BotError, BotServices, Channel, InsuranceBot, InsuranceBotBuilder};

/// One hook implementation per instrumented layer.
#[derive(Clone)]
pub struct ObservabilityHooks {
    pub dialog: Arc<dyn DialogRuntimeHooks>,
    pub validator: Arc<dyn ValidatorHooks>,
    pub service: Arc<dyn ServiceOperationHooks>,
}

impl ObservabilityHooks {
    pub fn tracing() -> Self {
        Self {
            dialog: Arc::new(SafeDialogHooks::new(TracingObservabilityHooks)),
            validator: Arc::new(SafeValidatorHooks::new(TracingObservabilityHooks)),
            service: Arc::new(SafeServiceHooks::new(TracingObservabilityHooks)),
        }
    }

    pub fn metrics() -> Self {
        Self {
            dialog: Arc::new(SafeDialogHooks::new(MetricsObservabilityHooks)),
            validator: Arc::new(SafeValidatorHooks::new(MetricsObservabilityHooks)),
            service: Arc::new(SafeServiceHooks::new(MetricsObservabilityHooks)),
        }
    }
}

impl InsuranceBotBuilder {
    pub fn observability(self, hooks: ObservabilityHooks) -> Self {
        let ObservabilityHooks {
            dialog,
            validator,
            service,
        } = hooks;
        self.map_services(|services| services.with_hooks(service))
            .dialog_hooks(dialog)
            .validator_hooks(validator)
    }
}

pub fn in_memory_backend() -> Arc<dyn StateBackend> {
    Arc::new(InMemoryStateBackend::new())
}

/// In-memory state with tracing hooks on every layer.
pub fn build_bot(services: BotServices, channel: Arc<dyn Channel>) -> Result<InsuranceBot, BotError> {
    build_bot_with(services, in_memory_backend(), channel, DialogPolicy::default())
}

pub fn build_bot_with_backend(
    services: BotServices,
    backend: Arc<dyn StateBackend>,
    channel: Arc<dyn Channel>,
) -> Result<InsuranceBot, BotError> {
    build_bot_with(services, backend, channel, DialogPolicy::default())
}

pub fn build_bot_with(
    services: BotServices,
    backend: Arc<dyn StateBackend>,
    channel: Arc<dyn Channel>,
    policy: DialogPolicy,
) -> Result<InsuranceBot, BotError> {
    InsuranceBot::builder(services, channel)
        .backend(backend)
        .policy(policy)
        .observability(ObservabilityHooks::tracing())
        .build()
}

#[cfg(feature = "http")]
pub use http::{build_bot_from_config, build_http_services};

#[cfg(feature = "http")]
mod http {
    use std::sync::Arc;

    use pservices::adapters::{
        ComputerVisionImageTagger, CustomVisionCarTypeClassifier, HttpAttachmentLoader,
        HttpEndpoint, HttpServiceClient, LuisIntentClassifier, QnaKnowledgeBase,
        TextAnalyticsSentimentScorer,
    };
    use pservices::ServiceOperationHooks;
    use pstate::create_state_backend;

    use super::ObservabilityHooks;
    use crate::{BotConfig, BotError, BotServices, Channel, InsuranceBot, ServiceEndpointConfig};

    fn http_endpoint(config: &ServiceEndpointConfig) -> HttpEndpoint {
        HttpEndpoint::new(config.endpoint.clone(), config.api_key.expose())
    }

    /// Builds reqwest-backed collaborators sharing one client; `hooks` observe every call.
    pub fn build_http_services(
        config: &BotConfig,
        hooks: Arc<dyn ServiceOperationHooks>,
    ) -> Result<BotServices, BotError> {
        config.validate()?;
        let http = HttpServiceClient::with_timeout(config.http_timeout)?;

        let intent = LuisIntentClassifier::new(
            http.clone(),
            http_endpoint(&config.intent),
            config.intent_app_id.clone(),
        )?;
        let knowledge = QnaKnowledgeBase::new(
            http.clone(),
            http_endpoint(&config.knowledge),
            config.knowledge_base_id.clone(),
        )?
        .with_score_threshold(config.knowledge_score_threshold)
        .with_top(config.knowledge_top);
        let vision = ComputerVisionImageTagger::new(http.clone(), http_endpoint(&config.vision))?;
        let sentiment =
            TextAnalyticsSentimentScorer::new(http.clone(), http_endpoint(&config.sentiment))?
                .with_language(config.sentiment_language.clone());

        let mut services = BotServices::new(
            Arc::new(intent),
            Arc::new(knowledge),
            Arc::new(vision),
            Arc::new(sentiment),
        )
        .with_hooks(hooks);

        if let Some(car_type) = &config.car_type {
            services = services.with_car_type_classifier(Arc::new(
                CustomVisionCarTypeClassifier::new(
                    http.clone(),
                    http_endpoint(&car_type.service),
                    car_type.project_id.clone(),
                    car_type.published_name.clone(),
                )?,
            ));
        }

        Ok(services.with_attachment_loader(Arc::new(HttpAttachmentLoader::new(http))))
    }

    /// Hosted collaborators, the configured state backend, and tracing hooks.
    pub fn build_bot_from_config(
        config: &BotConfig,
        channel: Arc<dyn Channel>,
    ) -> Result<InsuranceBot, BotError> {
        let hooks = ObservabilityHooks::tracing();
        let services = build_http_services(config, Arc::clone(&hooks.service))?;
        let backend = create_state_backend(config.state_backend.clone())?;

        InsuranceBot::builder(services, channel)
            .backend(backend)
            .policy(config.dialog_policy())
            .observability(hooks)
            .build()
    }
}
