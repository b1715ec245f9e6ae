//! Validation context, outcome, and typed prompt values.

use pcommon::{Attachment, CardChoice, ConversationId, MetadataMap, TraceId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub conversation_id: ConversationId,
    pub trace_id: Option<TraceId>,
    #[serde(default)]
    pub metadata: MetadataMap,
    #[serde(default)]
    pub choices: Vec<CardChoice>,
}

impl ValidationContext {
    pub fn new(conversation_id: impl Into<ConversationId>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            trace_id: None,
            metadata: MetadataMap::new(),
            choices: Vec::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_choices(mut self, choices: Vec<CardChoice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// A validated, coerced answer or a completed flow's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PromptValue {
    Text(String),
    Number(i64),
    Attachments(Vec<Attachment>),
    Json(serde_json::Value),
}

impl PromptValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Json(serde_json::Value::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Json(value) => value.as_i64(),
            _ => None,
        }
    }

    pub fn as_attachments(&self) -> &[Attachment] {
        match self {
            Self::Attachments(attachments) => attachments.as_slice(),
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub value: Option<PromptValue>,
    pub retry_prompt: Option<String>,
}

impl ValidationOutcome {
    pub fn accept(value: PromptValue) -> Self {
        Self {
            accepted: true,
            value: Some(value),
            retry_prompt: None,
        }
    }

    pub fn reject(retry_prompt: impl Into<String>) -> Self {
        Self {
            accepted: false,
            value: None,
            retry_prompt: Some(retry_prompt.into()),
        }
    }

    /// Rejection that leaves the re-prompt text to the caller.
    pub fn reject_silently() -> Self {
        Self {
            accepted: false,
            value: None,
            retry_prompt: None,
        }
    }
}
