//! Prompt validation layer: checks raw turn input and coerces it into typed values.

pub mod builtin;
mod error;
mod hooks;
mod registry;
mod runtime;
mod types;
mod validator;

pub mod prelude {
    pub use crate::{
        DefaultValidationRuntime, PromptError, PromptErrorKind, PromptValue, ValidationContext,
        ValidationOutcome, ValidationRuntime, Validator, ValidatorFuture, ValidatorHooks,
        ValidatorRegistry,
    };
}

pub use builtin::{
    CAR_TYPE_METADATA_KEY, CarPictureValidator, ChoiceValidator, NonEmptyTextValidator,
    YearValidator,
};
pub use error::{PromptError, PromptErrorKind};
pub use hooks::{NoopValidatorHooks, ValidatorHooks};
pub use registry::ValidatorRegistry;
pub use runtime::{DefaultValidationRuntime, ValidationRuntime};
pub use types::{PromptValue, ValidationContext, ValidationOutcome};
pub use validator::{FunctionValidator, Validator, ValidatorFuture};
