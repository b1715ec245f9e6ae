//! Fixed texts and card choices the insurance bot sends.

use pcommon::CardChoice;

pub const GREETING: &str = "Hi! How can I help you today?";
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";
pub const SERVICE_FAILURE: &str =
    "Sorry, something went wrong while handling your message. Please try again.";
pub const DIALOG_RESET: &str = "Sorry, it looks like something went wrong.";

pub const INSURANCE_TYPE_PROMPT: &str = "What kind of insurance do you need?";
pub const CAR_TYPE_PROMPT: &str = "Please select a car type.";
pub const CAR_MAKE_PROMPT: &str = "What make of car do you want to insure?";
pub const CAR_MODEL_PROMPT: &str = "And the model?";
pub const CAR_YEAR_PROMPT: &str = "And the year?";
pub const CAR_PICTURE_PROMPT: &str = "Please upload an image of your car to continue.";
pub const QUOTE: &str = "We can insure your new car for just $116.25 per month. This includes coverage for your whole family and a 10% discount given your existing policy with us.";
pub const FEEDBACK_PROMPT: &str =
    "What do you think? If this sounds good, we can start your coverage right now!";
pub const ESCALATION: &str = "I understand. We really want to make it work. Let me see if a customer service agent is available to review this in more detail.";
pub const CONFIRMATION: &str = "Great! We are going to prepare everything for you.";

pub const CAR_MAKE_RETRY: &str = "Please tell me the make of your car, for example Toyota.";
pub const CAR_MODEL_RETRY: &str = "Please tell me the model of your car, for example Corolla.";
pub const FEEDBACK_RETRY: &str = "Please let me know what you think of the quote.";

/// Feedback scoring below this is escalated to an agent.
pub const SENTIMENT_ESCALATION_THRESHOLD: f64 = 0.5;

const IMAGE_SITE: &str = "https://insurance.litwaredemos.com/images";

pub fn only_car_insurance(insurance_type: &str) -> String {
    format!("Right now I can only help with car insurance: {insurance_type}")
}

pub fn insurance_type_choices() -> Vec<CardChoice> {
    vec![
        CardChoice::new("Car").with_image_url(format!("{IMAGE_SITE}/auto_600x400.png")),
        CardChoice::new("Property").with_image_url(format!("{IMAGE_SITE}/property_600x400.jpg")),
        CardChoice::new("Life").with_image_url(format!("{IMAGE_SITE}/life_600x400.jpg")),
    ]
}

pub fn car_type_choices() -> Vec<CardChoice> {
    crate::pl_choices!["Sedan", "SUV", "Sports car"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insurance_type_choices_carry_images() {
        let choices = insurance_type_choices();
        assert_eq!(
            choices.iter().map(|c| c.value.as_str()).collect::<Vec<_>>(),
            vec!["Car", "Property", "Life"]
        );
        assert!(choices.iter().all(|choice| {
            choice
                .image_url
                .as_deref()
                .is_some_and(|url| url.starts_with(IMAGE_SITE))
        }));
    }

    #[test]
    fn non_car_message_names_the_requested_type() {
        assert_eq!(
            only_car_insurance("Life"),
            "Right now I can only help with car insurance: Life"
        );
    }
}
