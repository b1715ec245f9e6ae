//! Runtime hooks for validator lifecycle events.
//!
//! ```rust
//! use pprompt::{NoopValidatorHooks, ValidatorHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ValidatorHooks) {}
//!
//! let hooks = NoopValidatorHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use crate::{PromptError, ValidationContext, ValidationOutcome};

pub trait ValidatorHooks: Send + Sync {
    fn on_validation_start(&self, _validator_id: &str, _context: &ValidationContext) {}

    fn on_validation_complete(
        &self,
        _validator_id: &str,
        _context: &ValidationContext,
        _outcome: &ValidationOutcome,
        _elapsed: Duration,
    ) {
    }

    fn on_validation_failure(
        &self,
        _validator_id: &str,
        _context: &ValidationContext,
        _error: &PromptError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidatorHooks;

impl ValidatorHooks for NoopValidatorHooks {}
