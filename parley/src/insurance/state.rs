use serde::{Deserialize, Serialize};

/// Everything the bot has learned about one conversation's insurance request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    pub insurance_type: Option<String>,
    pub car_type: Option<String>,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub language: Option<String>,
}

impl ConversationState {
    pub fn with_insurance_type(mut self, insurance_type: impl Into<String>) -> Self {
        self.insurance_type = Some(insurance_type.into());
        self
    }

    pub fn wants_car_insurance(&self) -> bool {
        self.insurance_type
            .as_deref()
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("car"))
    }

    pub fn has_insurance_type(&self) -> bool {
        self.insurance_type
            .as_deref()
            .is_some_and(|kind| !kind.trim().is_empty())
    }
}
