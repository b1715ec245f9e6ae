//! Validator execution errors and classifications.
//!
//! A rejected answer is not an error; it is a [`crate::ValidationOutcome`].
//! These errors cover missing validators and collaborator failures.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pservices::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptErrorKind {
    NotFound,
    InvalidContext,
    Service,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptError {
    pub kind: PromptErrorKind,
    pub message: String,
    pub retryable: bool,
    pub validator_id: Option<String>,
}

impl PromptError {
    pub fn new(kind: PromptErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            validator_id: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::NotFound, message, false)
    }

    pub fn invalid_context(message: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::InvalidContext, message, false)
    }

    pub fn service(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(PromptErrorKind::Service, message, retryable)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(PromptErrorKind::Other, message, false)
    }

    pub fn with_validator_id(mut self, validator_id: impl Into<String>) -> Self {
        self.validator_id = Some(validator_id.into());
        self
    }

    pub fn is_service(&self) -> bool {
        self.kind == PromptErrorKind::Service
    }
}

impl From<ServiceError> for PromptError {
    fn from(error: ServiceError) -> Self {
        Self::service(error.to_string(), error.retryable)
    }
}

impl Display for PromptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.validator_id {
            Some(validator_id) => write!(
                f,
                "{:?} [validator={}]: {}",
                self.kind, validator_id, self.message
            ),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for PromptError {}
