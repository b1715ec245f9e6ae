//! Validation runtime trait and default registry-backed executor.

use std::sync::Arc;
use std::time::Instant;

use pcommon::TurnInput;

use crate::{
    NoopValidatorHooks, PromptError, ValidationContext, ValidationOutcome, ValidatorFuture,
    ValidatorHooks, ValidatorRegistry,
};

pub trait ValidationRuntime: Send + Sync {
    fn validate<'a>(
        &'a self,
        validator_id: &'a str,
        input: &'a TurnInput,
        context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>>;
}

#[derive(Clone)]
pub struct DefaultValidationRuntime {
    registry: Arc<ValidatorRegistry>,
    hooks: Arc<dyn ValidatorHooks>,
}

impl Default for DefaultValidationRuntime {
    fn default() -> Self {
        Self::new(Arc::new(ValidatorRegistry::new()))
    }
}

impl DefaultValidationRuntime {
    pub fn new(registry: Arc<ValidatorRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopValidatorHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ValidatorHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ValidatorRegistry> {
        Arc::clone(&self.registry)
    }
}

impl ValidationRuntime for DefaultValidationRuntime {
    fn validate<'a>(
        &'a self,
        validator_id: &'a str,
        input: &'a TurnInput,
        context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>> {
        Box::pin(async move {
            let started_at = Instant::now();
            self.hooks.on_validation_start(validator_id, context);

            let result = match self.registry.get(validator_id) {
                Some(validator) => validator
                    .validate(input, context)
                    .await
                    .map_err(|error| error.with_validator_id(validator_id)),
                None => Err(PromptError::not_found(format!(
                    "validator '{validator_id}' is not registered"
                ))
                .with_validator_id(validator_id)),
            };

            match &result {
                Ok(outcome) => self.hooks.on_validation_complete(
                    validator_id,
                    context,
                    outcome,
                    started_at.elapsed(),
                ),
                Err(error) => self.hooks.on_validation_failure(
                    validator_id,
                    context,
                    error,
                    started_at.elapsed(),
                ),
            }

            result
        })
    }
}
