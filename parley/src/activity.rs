//! Inbound activities delivered by a channel adapter.

use pcommon::{ConversationId, TraceId, TurnInput};
use serde::{Deserialize, Serialize};

/// A user message within one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageActivity {
    pub conversation_id: ConversationId,
    pub from: String,
    pub input: TurnInput,
    pub trace_id: Option<TraceId>,
}

impl MessageActivity {
    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// Participants joined the conversation; `recipient_id` is the bot's own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationUpdate {
    pub conversation_id: ConversationId,
    pub recipient_id: String,
    pub members_added: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Activity {
    Message(MessageActivity),
    ConversationUpdate(ConversationUpdate),
    Other {
        conversation_id: ConversationId,
        kind: String,
    },
}

impl Activity {
    pub fn message(
        conversation_id: impl Into<ConversationId>,
        from: impl Into<String>,
        input: TurnInput,
    ) -> Self {
        Self::Message(MessageActivity {
            conversation_id: conversation_id.into(),
            from: from.into(),
            input,
            trace_id: None,
        })
    }

    pub fn conversation_update(
        conversation_id: impl Into<ConversationId>,
        recipient_id: impl Into<String>,
        members_added: Vec<String>,
    ) -> Self {
        Self::ConversationUpdate(ConversationUpdate {
            conversation_id: conversation_id.into(),
            recipient_id: recipient_id.into(),
            members_added,
        })
    }

    pub fn other(conversation_id: impl Into<ConversationId>, kind: impl Into<String>) -> Self {
        Self::Other {
            conversation_id: conversation_id.into(),
            kind: kind.into(),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            Self::Message(message) => &message.conversation_id,
            Self::ConversationUpdate(update) => &update.conversation_id,
            Self::Other {
                conversation_id, ..
            } => conversation_id,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::ConversationUpdate(_) => "conversation_update",
            Self::Other { kind, .. } => kind.as_str(),
        }
    }
}
