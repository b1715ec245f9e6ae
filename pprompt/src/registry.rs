//! Validator registry keyed by validator id.

use std::future::Future;
use std::sync::Arc;

use pcommon::{Registry, TurnInput};

use crate::{FunctionValidator, PromptError, ValidationContext, ValidationOutcome, Validator};

#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Registry<String, Arc<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<V>(&mut self, validator: V)
    where
        V: Validator + 'static,
    {
        let id = validator.id().to_string();
        self.validators.insert(id, Arc::new(validator));
    }

    pub fn register_fn<F, Fut>(&mut self, id: impl Into<String>, handler: F)
    where
        F: Fn(TurnInput, ValidationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ValidationOutcome, PromptError>> + Send + 'static,
    {
        self.register(FunctionValidator::new(id, handler));
    }

    pub fn register_sync_fn<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: Fn(TurnInput, ValidationContext) -> Result<ValidationOutcome, PromptError>
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(id, move |input, context| {
            let outcome = handler(input, context);
            async move { outcome }
        });
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Validator>> {
        self.validators.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.validators.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn Validator>> {
        self.validators.remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids = self.validators.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
