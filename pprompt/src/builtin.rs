//! Stock validators: non-empty text, bounded year, car picture, and card choice.
//!
//! ```rust
//! use pprompt::builtin::YearValidator;
//! use pprompt::Validator;
//!
//! let year = YearValidator::new("car_year").with_current_year(2024);
//! assert_eq!(year.id(), "car_year");
//! assert_eq!(year.max_year(), 2025);
//! ```

use std::sync::Arc;

use chrono::Datelike;
use pcommon::{Attachment, TurnInput};
use pservices::{
    AttachmentLoader, CarTypeClassifier, ImageTagger, NoopOperationHooks, ServiceId,
    ServiceOperationHooks, observe_once, top_car_type,
};

use crate::{PromptError, PromptValue, ValidationContext, ValidationOutcome, Validator, ValidatorFuture};

/// Metadata key carrying the previously captured car type.
pub const CAR_TYPE_METADATA_KEY: &str = "car_type";

pub const EARLIEST_CAR_YEAR: i32 = 1900;

/// Accepts any reply whose trimmed text is non-empty; the value is the trimmed text.
#[derive(Debug, Clone)]
pub struct NonEmptyTextValidator {
    id: String,
    retry_prompt: String,
}

impl NonEmptyTextValidator {
    pub fn new(id: impl Into<String>, retry_prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            retry_prompt: retry_prompt.into(),
        }
    }

    pub fn check(&self, input: &TurnInput) -> ValidationOutcome {
        match input.as_text().map(str::trim) {
            Some(text) if !text.is_empty() => ValidationOutcome::accept(PromptValue::text(text)),
            _ => ValidationOutcome::reject(self.retry_prompt.clone()),
        }
    }
}

impl Validator for NonEmptyTextValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate<'a>(
        &'a self,
        input: &'a TurnInput,
        _context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>> {
        Box::pin(async move { Ok(self.check(input)) })
    }
}

/// Accepts integers in `[1900, current_year + 1]`.
#[derive(Debug, Clone)]
pub struct YearValidator {
    id: String,
    current_year: Option<i32>,
}

impl YearValidator {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current_year: None,
        }
    }

    /// Pins the reference year; otherwise the UTC wall-clock year is used.
    pub fn with_current_year(mut self, current_year: i32) -> Self {
        self.current_year = Some(current_year);
        self
    }

    pub fn max_year(&self) -> i32 {
        let current_year = self
            .current_year
            .unwrap_or_else(|| chrono::Utc::now().year());
        current_year + 1
    }

    pub fn retry_prompt(&self) -> String {
        format!(
            "Please enter a valid year between {EARLIEST_CAR_YEAR} and {}.",
            self.max_year()
        )
    }

    pub fn check(&self, input: &TurnInput) -> ValidationOutcome {
        let parsed = input
            .as_text()
            .map(str::trim)
            .and_then(|text| text.parse::<i32>().ok());

        match parsed {
            Some(year) if (EARLIEST_CAR_YEAR..=self.max_year()).contains(&year) => {
                ValidationOutcome::accept(PromptValue::Number(i64::from(year)))
            }
            _ => ValidationOutcome::reject(self.retry_prompt()),
        }
    }
}

impl Validator for YearValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate<'a>(
        &'a self,
        input: &'a TurnInput,
        _context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>> {
        Box::pin(async move { Ok(self.check(input)) })
    }
}

/// Requires exactly one image attachment that the tagger recognizes as a car.
///
/// With a car-type classifier attached, the top predicted body style must also
/// match the `car_type` metadata captured earlier in the conversation.
#[derive(Clone)]
pub struct CarPictureValidator {
    id: String,
    tagger: Arc<dyn ImageTagger>,
    loader: Arc<dyn AttachmentLoader>,
    car_type: Option<Arc<dyn CarTypeClassifier>>,
    hooks: Arc<dyn ServiceOperationHooks>,
}

impl CarPictureValidator {
    pub const SINGLE_IMAGE_PROMPT: &'static str = "Please upload exactly one image of your car.";
    pub const NOT_AN_IMAGE_PROMPT: &'static str =
        "That file doesn't look like an image. Please upload a picture of your car.";
    pub const UNREADABLE_PROMPT: &'static str =
        "I couldn't read that image. Please try uploading it again.";

    pub fn new(
        id: impl Into<String>,
        tagger: Arc<dyn ImageTagger>,
        loader: Arc<dyn AttachmentLoader>,
    ) -> Self {
        Self {
            id: id.into(),
            tagger,
            loader,
            car_type: None,
            hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn with_car_type_classifier(mut self, classifier: Arc<dyn CarTypeClassifier>) -> Self {
        self.car_type = Some(classifier);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ServiceOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    async fn load_bytes(&self, attachment: &Attachment) -> Result<Option<Vec<u8>>, PromptError> {
        if let Some(content) = &attachment.content {
            return Ok(Some(content.clone()));
        }

        match &attachment.content_url {
            Some(url) => Ok(Some(
                observe_once(
                    ServiceId::AttachmentLoader,
                    "load",
                    self.hooks.as_ref(),
                    self.loader.load(url),
                )
                .await?,
            )),
            None => Ok(None),
        }
    }

    /// The predicted body style when it disagrees with the captured one.
    async fn car_type_mismatch(
        &self,
        bytes: &[u8],
        context: &ValidationContext,
    ) -> Result<Option<(String, String)>, PromptError> {
        let Some(classifier) = &self.car_type else {
            return Ok(None);
        };
        let Some(expected) = context
            .metadata_value(CAR_TYPE_METADATA_KEY)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        let predictions = observe_once(
            ServiceId::CarTypeClassifier,
            "predict",
            self.hooks.as_ref(),
            classifier.predict(bytes),
        )
        .await?;

        Ok(top_car_type(&predictions)
            .filter(|top| !top.tag.trim().eq_ignore_ascii_case(expected))
            .map(|top| (top.tag.trim().to_string(), expected.to_string())))
    }

    fn car_type_prompt(predicted: &str, expected: &str) -> String {
        format!(
            "That looks like a {}, not a {}. Please upload a picture of your {}.",
            predicted.to_lowercase(),
            expected.to_lowercase(),
            expected.to_lowercase()
        )
    }

    fn mismatch_prompt(context: &ValidationContext, caption: &str) -> String {
        let car_type = context
            .metadata_value(CAR_TYPE_METADATA_KEY)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "car".to_string());
        let caption = caption.trim();

        if caption.is_empty() {
            format!("That doesn't look like a {car_type}. Please upload a picture of your car.")
        } else {
            format!(
                "That doesn't look like a {car_type}, it looks like {caption}. Please upload a picture of your car."
            )
        }
    }
}

impl Validator for CarPictureValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate<'a>(
        &'a self,
        input: &'a TurnInput,
        context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>> {
        Box::pin(async move {
            let attachments = input.as_attachments();
            let [attachment] = attachments else {
                return Ok(ValidationOutcome::reject(Self::SINGLE_IMAGE_PROMPT));
            };

            if !attachment.is_image() {
                return Ok(ValidationOutcome::reject(Self::NOT_AN_IMAGE_PROMPT));
            }

            let Some(bytes) = self.load_bytes(attachment).await? else {
                return Ok(ValidationOutcome::reject(Self::UNREADABLE_PROMPT));
            };
            if bytes.is_empty() {
                return Ok(ValidationOutcome::reject(Self::UNREADABLE_PROMPT));
            }

            let analysis = observe_once(
                ServiceId::ImageTagger,
                "analyze",
                self.hooks.as_ref(),
                self.tagger.analyze(&bytes),
            )
            .await?;
            if !analysis.is_car {
                return Ok(ValidationOutcome::reject(Self::mismatch_prompt(
                    context,
                    &analysis.caption,
                )));
            }

            if let Some((predicted, expected)) = self.car_type_mismatch(&bytes, context).await? {
                return Ok(ValidationOutcome::reject(Self::car_type_prompt(
                    &predicted, &expected,
                )));
            }

            Ok(ValidationOutcome::accept(PromptValue::Attachments(
                attachments.to_vec(),
            )))
        })
    }
}

/// Case-insensitive match against the prompt's card choices; yields the canonical value.
#[derive(Debug, Clone)]
pub struct ChoiceValidator {
    id: String,
}

impl ChoiceValidator {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn check(
        &self,
        input: &TurnInput,
        context: &ValidationContext,
    ) -> Result<ValidationOutcome, PromptError> {
        if context.choices.is_empty() {
            return Err(PromptError::invalid_context(
                "choice validation requires at least one choice",
            ));
        }

        let reply = input.as_text().map(str::trim).unwrap_or_default();
        let matched = context.choices.iter().find(|choice| {
            choice.value.eq_ignore_ascii_case(reply) || choice.title.eq_ignore_ascii_case(reply)
        });

        Ok(match matched {
            Some(choice) if !reply.is_empty() => {
                ValidationOutcome::accept(PromptValue::text(choice.value.clone()))
            }
            _ => {
                let titles = context
                    .choices
                    .iter()
                    .map(|choice| choice.title.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                ValidationOutcome::reject(format!("Please choose one of: {titles}."))
            }
        })
    }
}

impl Validator for ChoiceValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate<'a>(
        &'a self,
        input: &'a TurnInput,
        context: &'a ValidationContext,
    ) -> ValidatorFuture<'a, Result<ValidationOutcome, PromptError>> {
        Box::pin(async move { self.check(input, context) })
    }
}
