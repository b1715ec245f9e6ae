//! Validator trait contract for registry-managed prompt checks.
//!
//! ```rust
//! use pprompt::{FunctionValidator, PromptValue, ValidationOutcome, Validator};
//!
//! let shout = FunctionValidator::new("shout", |input, _ctx| async move {
//!     Ok(match input.as_text() {
//!         Some(text) => ValidationOutcome::accept(PromptValue::text(text.to_uppercase())),
//!         None => ValidationOutcome::reject("Please type something."),
//!     })
//! });
//!
//! assert_eq!(shout.id(), "shout");
//! ```

use std::future::Future;
use std::sync::Arc;

use pcommon::{BoxFuture, TurnInput};

use crate::{PromptError, ValidationContext, ValidationOutcome};

pub type ValidatorFuture<'a, T> = BoxFuture<'a, T>;

pub trait Validator: Send + Sync {
    fn id(&self) -> &str;

    fn validate<'a>(
        &'a self,
        input: &'a TurnInput,
        context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>>;
}

type ValidatorHandler = dyn Fn(
        TurnInput,
        ValidationContext,
    ) -> ValidatorFuture<'static, Result<ValidationOutcome, PromptError>>
    + Send
    + Sync;

pub struct FunctionValidator {
    id: String,
    handler: Arc<ValidatorHandler>,
}

impl FunctionValidator {
    pub fn new<F, Fut>(id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(TurnInput, ValidationContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ValidationOutcome, PromptError>> + Send + 'static,
    {
        let handler: Arc<ValidatorHandler> =
            Arc::new(move |input, context| Box::pin(handler(input, context)));

        Self {
            id: id.into(),
            handler,
        }
    }
}

impl Validator for FunctionValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate<'a>(
        &'a self,
        input: &'a TurnInput,
        context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>> {
        (self.handler)(input.clone(), context.clone())
    }
}
