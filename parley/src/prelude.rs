//! Common imports for hosting the insurance bot.

pub use crate::{
    build_bot, build_bot_with, build_bot_with_backend, image_activity, image_attachment,
    in_memory_backend, members_added, text_activity,
};
#[cfg(feature = "http")]
pub use crate::{build_bot_from_config, build_http_services};
pub use crate::{pl_choices, pl_message};
pub use crate::{
    Activity, Attachment, BotConfig, BotError, BotErrorKind, BotServices, CardChoice, Channel,
    ConversationId, ConversationState, DialogPolicy, InsuranceBot, InsuranceBotBuilder,
    ObservabilityHooks, OutboundMessage, RecordingChannel, StateBackend, StateBackendConfig,
    TraceId, TurnInput,
};
