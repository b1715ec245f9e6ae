//! Insurance-quote chatbot built on the parley dialog engine.
//!
//! This crate is the single dependency most hosts need. It re-exports the
//! workspace crates and adds the turn router, the insurance flows, service
//! wiring, and configuration loading.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use parley::{
//!     BotServices, IntentResult, RecordingChannel, StaticImageTagger, StaticIntentClassifier,
//!     StaticKnowledgeBase, StaticSentimentScorer, build_bot,
//! };
//!
//! let services = BotServices::new(
//!     Arc::new(
//!         StaticIntentClassifier::new()
//!             .with_rule("insurance", IntentResult::new("", "INeedInsurance", 0.9)),
//!     ),
//!     Arc::new(StaticKnowledgeBase::new()),
//!     Arc::new(StaticImageTagger::car("a red car")),
//!     Arc::new(StaticSentimentScorer::new(0.8)),
//! );
//!
//! let bot = build_bot(services, Arc::new(RecordingChannel::new()));
//! assert!(bot.is_ok());
//! ```

mod macros;

pub mod activity;
pub mod bot;
pub mod channel;
pub mod config;
pub mod error;
pub mod insurance;
pub mod prelude;
pub mod runtime;
pub mod services;
pub mod util;

pub use pcommon;
pub use pdialog;
pub use pobserve;
pub use pprompt;
pub use pservices;
pub use pstate;

pub use pcommon::{
    Attachment, BoxFuture, CardChoice, ConversationId, MetadataMap, OutboundMessage, TraceId,
    TurnInput,
};
pub use pdialog::{
    DialogContext, DialogEngine, DialogError, DialogErrorKind, DialogPolicy, DialogRuntimeHooks,
    NoopDialogHooks, TurnResult, TurnStatus,
};
pub use pobserve::{
    MetricsObservabilityHooks, SafeDialogHooks, SafeServiceHooks, SafeValidatorHooks,
    TracingObservabilityHooks,
};
pub use pprompt::{NoopValidatorHooks, ValidatorHooks, ValidatorRegistry};
pub use pservices::{
    AttachmentLoader, CarTypeClassifier, CarTypePrediction, ImageTagger, InMemoryAttachmentLoader,
    IntentClassifier, IntentResult, KbAnswer, KnowledgeBase, NoopOperationHooks, SecretString,
    SentimentScorer, ServiceError, ServiceErrorKind, ServiceOperationHooks,
    StaticCarTypeClassifier, StaticImageTagger, StaticIntentClassifier, StaticKnowledgeBase,
    StaticSentimentScorer,
};
pub use pstate::{
    FilesystemStateBackend, InMemoryStateBackend, SqliteStateBackend, StateBackend,
    StateBackendConfig, StateError, StateErrorKind,
};

pub use activity::{Activity, ConversationUpdate, MessageActivity};
pub use bot::{InsuranceBot, InsuranceBotBuilder};
pub use channel::{Channel, RecordingChannel};
pub use config::{BotConfig, CarTypeClassifierConfig, ServiceEndpointConfig};
pub use error::{BotError, BotErrorKind};
pub use insurance::ConversationState;
pub use runtime::{
    ObservabilityHooks, build_bot, build_bot_with, build_bot_with_backend, in_memory_backend,
};
#[cfg(feature = "http")]
pub use runtime::{build_bot_from_config, build_http_services};
pub use services::BotServices;
pub use util::{image_activity, image_attachment, members_added, text_activity};
