//! Bot-level errors surfaced from `InsuranceBot::on_turn` and runtime wiring.
//!
//! ```rust
//! use parley::{BotError, BotErrorKind, StateError};
//!
//! let err = BotError::from(StateError::storage("disk full"));
//! assert_eq!(err.kind, BotErrorKind::Storage);
//! assert!(err.to_string().starts_with("Storage"));
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use pdialog::{DialogError, DialogErrorKind};
use pservices::ServiceError;
use pstate::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotErrorKind {
    Configuration,
    Storage,
    Dialog,
    Service,
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotError {
    pub kind: BotErrorKind,
    pub message: String,
}

impl BotError {
    pub fn new(kind: BotErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(BotErrorKind::Configuration, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(BotErrorKind::Storage, message)
    }

    pub fn dialog(message: impl Into<String>) -> Self {
        Self::new(BotErrorKind::Dialog, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(BotErrorKind::Service, message)
    }

    pub fn channel(message: impl Into<String>) -> Self {
        Self::new(BotErrorKind::Channel, message)
    }
}

impl Display for BotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for BotError {}

impl From<DialogError> for BotError {
    fn from(value: DialogError) -> Self {
        let kind = match value.kind {
            DialogErrorKind::Storage => BotErrorKind::Storage,
            DialogErrorKind::Service => BotErrorKind::Service,
            _ => BotErrorKind::Dialog,
        };

        Self::new(kind, value.message)
    }
}

impl From<StateError> for BotError {
    fn from(value: StateError) -> Self {
        Self::storage(value.to_string())
    }
}

impl From<ServiceError> for BotError {
    fn from(value: ServiceError) -> Self {
        Self::service(value.to_string())
    }
}
