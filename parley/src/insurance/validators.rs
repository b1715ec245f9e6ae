//! Validator ids and the registry backing the insurance prompts.

use pprompt::{
    CarPictureValidator, ChoiceValidator, NonEmptyTextValidator, ValidatorRegistry, YearValidator,
};

use super::messages::{CAR_MAKE_RETRY, CAR_MODEL_RETRY, FEEDBACK_RETRY};
use crate::BotServices;

pub const INSURANCE_TYPE: &str = "insurance_type";
pub const CAR_TYPE: &str = "car_type";
pub const CAR_MAKE: &str = "car_make";
pub const CAR_MODEL: &str = "car_model";
pub const CAR_YEAR: &str = "car_year";
pub const CAR_PICTURE: &str = "car_picture";
pub const FEEDBACK: &str = "feedback";

/// `current_year` pins the car-year upper bound; `None` uses the wall clock.
pub fn insurance_validators(services: &BotServices, current_year: Option<i32>) -> ValidatorRegistry {
    let year = match current_year {
        Some(current_year) => YearValidator::new(CAR_YEAR).with_current_year(current_year),
        None => YearValidator::new(CAR_YEAR),
    };

    let mut registry = ValidatorRegistry::new();
    registry.register(ChoiceValidator::new(INSURANCE_TYPE));
    registry.register(ChoiceValidator::new(CAR_TYPE));
    registry.register(NonEmptyTextValidator::new(CAR_MAKE, CAR_MAKE_RETRY));
    registry.register(NonEmptyTextValidator::new(CAR_MODEL, CAR_MODEL_RETRY));
    registry.register(year);

    let picture = CarPictureValidator::new(
        CAR_PICTURE,
        services.image_tagger.clone(),
        services.attachments.clone(),
    )
    .with_hooks(services.hooks.clone());
    registry.register(match &services.car_type {
        Some(classifier) => picture.with_car_type_classifier(classifier.clone()),
        None => picture,
    });
    registry.register(NonEmptyTextValidator::new(FEEDBACK, FEEDBACK_RETRY));
    registry
}
