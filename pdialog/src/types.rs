//! Stack frames, prompt requests, turn results, and engine policy.

use pcommon::{CardChoice, MetadataMap, OutboundMessage};
use pprompt::PromptValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::DialogError;

/// Conversation records the engine can carry between turns.
pub trait DialogState: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> DialogState for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// A prompt a step asks the engine to issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub message: OutboundMessage,
    pub validator_id: Option<String>,
    pub retry_message: Option<String>,
    #[serde(default)]
    pub metadata: MetadataMap,
}

impl PromptRequest {
    pub fn new(message: OutboundMessage) -> Self {
        Self {
            message,
            validator_id: None,
            retry_message: None,
            metadata: MetadataMap::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(OutboundMessage::text(text))
    }

    pub fn card(text: impl Into<String>, choices: Vec<CardChoice>) -> Self {
        Self::new(OutboundMessage::card(text, choices))
    }

    pub fn with_validator(mut self, validator_id: impl Into<String>) -> Self {
        self.validator_id = Some(validator_id.into());
        self
    }

    pub fn with_retry_message(mut self, retry_message: impl Into<String>) -> Self {
        self.retry_message = Some(retry_message.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn choices(&self) -> &[CardChoice] {
        &self.message.choices
    }
}

/// A prompt that has been sent and is awaiting validated input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPrompt {
    pub request: PromptRequest,
    #[serde(default)]
    pub rejections: u32,
}

impl PendingPrompt {
    pub fn new(request: PromptRequest) -> Self {
        Self {
            request,
            rejections: 0,
        }
    }

    /// Message re-sent after a rejection that carried no text of its own.
    pub fn retry_message(&self) -> OutboundMessage {
        match &self.request.retry_message {
            Some(text) => OutboundMessage::text(text.clone()),
            None => self.request.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub flow_id: String,
    /// Index of the step that runs when the next result arrives.
    pub step_index: usize,
    #[serde(default)]
    pub options: serde_json::Value,
    pub pending_prompt: Option<PendingPrompt>,
}

impl DialogFrame {
    pub fn new(flow_id: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            flow_id: flow_id.into(),
            step_index: 0,
            options,
            pending_prompt: None,
        }
    }
}

/// Active flow invocations; the last frame is the one receiving input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogStack {
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[DialogFrame] {
        &self.frames
    }

    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Checks that the stack is empty or its top frame is waiting on a prompt.
    pub fn validate(&self) -> Result<(), DialogError> {
        match self.top() {
            Some(frame) if frame.pending_prompt.is_none() => Err(DialogError::invalid_stack(
                format!("top frame '{}' has no pending prompt", frame.flow_id),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Empty,
    Waiting,
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub status: TurnStatus,
    pub result: Option<PromptValue>,
}

impl TurnResult {
    pub fn empty() -> Self {
        Self {
            status: TurnStatus::Empty,
            result: None,
        }
    }

    pub fn waiting() -> Self {
        Self {
            status: TurnStatus::Waiting,
            result: None,
        }
    }

    pub fn complete(result: Option<PromptValue>) -> Self {
        Self {
            status: TurnStatus::Complete,
            result,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: TurnStatus::Cancelled,
            result: None,
        }
    }
}

/// Engine entry point that started a turn, reported to hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOperation {
    Continue,
    Begin,
    Replace,
    CancelAll,
}

impl DialogOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Begin => "begin",
            Self::Replace => "replace",
            Self::CancelAll => "cancel_all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackTransition {
    Pushed { flow_id: String },
    Popped { flow_id: String },
    Replaced { from: String, to: String },
    Advanced { flow_id: String, step_index: usize },
    Prompted { flow_id: String, step_index: usize },
    Rejected { flow_id: String, rejections: u32 },
    Cleared { frames: usize },
}

impl StackTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pushed { .. } => "pushed",
            Self::Popped { .. } => "popped",
            Self::Replaced { .. } => "replaced",
            Self::Advanced { .. } => "advanced",
            Self::Prompted { .. } => "prompted",
            Self::Rejected { .. } => "rejected",
            Self::Cleared { .. } => "cleared",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogPolicy {
    /// Maximum number of steps driven by a single engine operation.
    pub max_chain_depth: usize,
}

impl Default for DialogPolicy {
    fn default() -> Self {
        Self {
            max_chain_depth: 32,
        }
    }
}

impl DialogPolicy {
    pub fn with_max_chain_depth(mut self, max_chain_depth: usize) -> Self {
        self.max_chain_depth = max_chain_depth;
        self
    }

    pub fn validate(&self) -> Result<(), DialogError> {
        if self.max_chain_depth == 0 {
            return Err(DialogError::invalid_request(
                "dialog policy requires max_chain_depth >= 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DialogErrorKind;

    #[test]
    fn stack_serializes_as_a_plain_frame_list() {
        let mut stack = DialogStack::new();
        let mut frame = DialogFrame::new("gather_info", serde_json::Value::Null);
        frame.step_index = 2;
        frame.pending_prompt = Some(PendingPrompt::new(
            PromptRequest::text("And the model?").with_validator("car_model"),
        ));
        stack.push(frame);

        let encoded = serde_json::to_value(&stack).expect("encode");
        assert_eq!(encoded[0]["flow_id"], "gather_info");
        assert_eq!(encoded[0]["step_index"], 2);
        assert_eq!(
            encoded[0]["pending_prompt"]["request"]["validator_id"],
            "car_model"
        );

        let decoded: DialogStack = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded, stack);
    }

    #[test]
    fn stack_validation_requires_a_pending_prompt_on_top() {
        let mut stack = DialogStack::new();
        assert!(stack.validate().is_ok());

        stack.push(DialogFrame::new("gather_info", serde_json::Value::Null));
        let error = stack.validate().expect_err("bare frame is invalid");
        assert_eq!(error.kind, DialogErrorKind::InvalidStack);
    }

    #[test]
    fn retry_message_falls_back_to_original_prompt() {
        let card = PromptRequest::card("Pick one", vec![CardChoice::new("Car")]);
        assert_eq!(PendingPrompt::new(card.clone()).retry_message(), card.message);

        let with_retry = PendingPrompt::new(card.with_retry_message("Use the buttons."));
        assert_eq!(with_retry.retry_message().text, "Use the buttons.");
        assert!(!with_retry.retry_message().is_card());
    }

    #[test]
    fn policy_rejects_zero_chain_depth() {
        assert!(DialogPolicy::default().validate().is_ok());
        assert_eq!(DialogPolicy::default().max_chain_depth, 32);
        assert!(
            DialogPolicy::default()
                .with_max_chain_depth(0)
                .validate()
                .is_err()
        );
    }
}
