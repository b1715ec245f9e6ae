//! Dialog engine error types and conversion helpers.
//!
//! ```rust
//! use pdialog::{DialogError, DialogErrorKind};
//!
//! let err = DialogError::chain_depth_exceeded("33 steps driven in one turn");
//! assert_eq!(err.kind, DialogErrorKind::ChainDepthExceeded);
//! assert!(err.is_invariant_violation());
//! assert!(err.to_string().contains("33 steps"));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprompt::{PromptError, PromptErrorKind};
use pservices::ServiceError;
use pstate::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogErrorKind {
    ChainDepthExceeded,
    InvalidStack,
    UnknownFlow,
    Service,
    Storage,
    Validation,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogError {
    pub kind: DialogErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl DialogError {
    pub fn new(kind: DialogErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn chain_depth_exceeded(message: impl Into<String>) -> Self {
        Self::new(DialogErrorKind::ChainDepthExceeded, message)
    }

    pub fn invalid_stack(message: impl Into<String>) -> Self {
        Self::new(DialogErrorKind::InvalidStack, message)
    }

    pub fn unknown_flow(flow_id: &str) -> Self {
        Self::new(
            DialogErrorKind::UnknownFlow,
            format!("flow '{flow_id}' is not registered"),
        )
    }

    pub fn service(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            retryable,
            ..Self::new(DialogErrorKind::Service, message)
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(DialogErrorKind::Storage, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DialogErrorKind::Validation, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(DialogErrorKind::InvalidRequest, message)
    }

    /// Stack corruption or runaway chaining; the turn cannot be recovered in place.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self.kind,
            DialogErrorKind::ChainDepthExceeded
                | DialogErrorKind::InvalidStack
                | DialogErrorKind::UnknownFlow
        )
    }

    pub fn is_service(&self) -> bool {
        self.kind == DialogErrorKind::Service
    }
}

impl Display for DialogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for DialogError {}

impl From<ServiceError> for DialogError {
    fn from(value: ServiceError) -> Self {
        Self::service(value.to_string(), value.retryable)
    }
}

impl From<PromptError> for DialogError {
    fn from(value: PromptError) -> Self {
        match value.kind {
            PromptErrorKind::Service => Self::service(value.to_string(), value.retryable),
            _ => Self::validation(value.to_string()),
        }
    }
}

impl From<StateError> for DialogError {
    fn from(value: StateError) -> Self {
        Self::storage(value.to_string())
    }
}
