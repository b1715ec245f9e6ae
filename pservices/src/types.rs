//! Collaborator request/response value types.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceId {
    IntentClassifier,
    KnowledgeBase,
    ImageTagger,
    SentimentScorer,
    AttachmentLoader,
    CarTypeClassifier,
}

impl Display for ServiceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::IntentClassifier => "intent",
            Self::KnowledgeBase => "knowledge",
            Self::ImageTagger => "vision",
            Self::SentimentScorer => "sentiment",
            Self::AttachmentLoader => "attachment",
            Self::CarTypeClassifier => "car_type",
        };

        f.write_str(id)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntentResult {
    pub text: String,
    pub top_intent: String,
    pub score: f64,
    pub entities: BTreeMap<String, Vec<String>>,
}

impl IntentResult {
    pub fn new(text: impl Into<String>, top_intent: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            top_intent: top_intent.into(),
            score,
            entities: BTreeMap::new(),
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First recognized value for `name`, if any.
    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KbAnswer {
    pub answer: String,
    pub score: f64,
}

impl KbAnswer {
    pub fn new(answer: impl Into<String>, score: f64) -> Self {
        Self {
            answer: answer.into(),
            score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnalysis {
    pub is_car: bool,
    pub caption: String,
}

impl ImageAnalysis {
    pub fn new(is_car: bool, caption: impl Into<String>) -> Self {
        Self {
            is_car,
            caption: caption.into(),
        }
    }
}

/// One tag from a custom image classifier trained on car body styles.
#[derive(Debug, Clone, PartialEq)]
pub struct CarTypePrediction {
    pub tag: String,
    pub probability: f64,
}

impl CarTypePrediction {
    pub fn new(tag: impl Into<String>, probability: f64) -> Self {
        Self {
            tag: tag.into(),
            probability,
        }
    }
}

/// The most probable prediction; ties keep the earlier entry.
pub fn top_car_type(predictions: &[CarTypePrediction]) -> Option<&CarTypePrediction> {
    predictions.iter().reduce(|best, next| {
        if next.probability > best.probability {
            next
        } else {
            best
        }
    })
}
