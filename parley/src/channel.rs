//! Outbound delivery seam between the bot and its transport.
//!
//! ```rust
//! use parley::{Channel, RecordingChannel};
//!
//! fn accepts_channel(_channel: &dyn Channel) {}
//!
//! let channel = RecordingChannel::new();
//! accepts_channel(&channel);
//! assert!(channel.sent().unwrap_or_default().is_empty());
//! ```

use std::sync::Mutex;

use pcommon::{BoxFuture, ConversationId, OutboundMessage};

use crate::BotError;

pub trait Channel: Send + Sync {
    fn send<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        message: OutboundMessage,
    ) -> BoxFuture<'a, Result<(), BotError>>;
}

/// Collects every delivered message in memory.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<(ConversationId, OutboundMessage)>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Result<Vec<(ConversationId, OutboundMessage)>, BotError> {
        Ok(self
            .sent
            .lock()
            .map_err(|_| BotError::channel("recording channel lock poisoned"))?
            .clone())
    }

    /// Message texts delivered to one conversation, in order.
    pub fn texts(&self, conversation_id: &str) -> Result<Vec<String>, BotError> {
        Ok(self
            .sent()?
            .into_iter()
            .filter(|(id, _)| id.as_str() == conversation_id)
            .map(|(_, message)| message.text)
            .collect())
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Result<Vec<(ConversationId, OutboundMessage)>, BotError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| BotError::channel("recording channel lock poisoned"))?;
        Ok(std::mem::take(&mut *sent))
    }
}

impl Channel for RecordingChannel {
    fn send<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        message: OutboundMessage,
    ) -> BoxFuture<'a, Result<(), BotError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .map_err(|_| BotError::channel("recording channel lock poisoned"))?
                .push((conversation_id.clone(), message));
            Ok(())
        })
    }
}
