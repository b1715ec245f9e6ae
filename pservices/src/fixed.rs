//! Deterministic in-process collaborators.
//!
//! These answer from fixed tables and record every request, which makes them
//! suitable for tests and offline demos.
//!
//! ```rust
//! use pservices::{IntentResult, StaticIntentClassifier};
//!
//! let classifier = StaticIntentClassifier::new()
//!     .with_rule("insurance", IntentResult::new("", "INeedInsurance", 0.9));
//! assert_eq!(classifier.calls().unwrap_or_default().len(), 0);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    AttachmentLoader, CarTypeClassifier, CarTypePrediction, ImageAnalysis, ImageTagger,
    IntentClassifier, IntentResult, KbAnswer, KnowledgeBase, SentimentScorer, ServiceError,
    ServiceFuture,
};

fn record(calls: &Mutex<Vec<String>>, value: impl Into<String>) -> Result<(), ServiceError> {
    calls
        .lock()
        .map_err(|_| ServiceError::other("call log lock poisoned"))?
        .push(value.into());
    Ok(())
}

fn snapshot(calls: &Mutex<Vec<String>>) -> Result<Vec<String>, ServiceError> {
    Ok(calls
        .lock()
        .map_err(|_| ServiceError::other("call log lock poisoned"))?
        .clone())
}

/// Matches the first rule whose keyword appears in the lowercased utterance.
#[derive(Debug, Default)]
pub struct StaticIntentClassifier {
    rules: Vec<(String, IntentResult)>,
    failure: Option<ServiceError>,
    calls: Mutex<Vec<String>>,
}

impl StaticIntentClassifier {
    pub const NONE_INTENT: &'static str = "None";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, keyword: impl Into<String>, result: IntentResult) -> Self {
        self.rules.push((keyword.into().to_lowercase(), result));
        self
    }

    pub fn failing(mut self, error: ServiceError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn calls(&self) -> Result<Vec<String>, ServiceError> {
        snapshot(&self.calls)
    }
}

impl IntentClassifier for StaticIntentClassifier {
    fn classify<'a>(
        &'a self,
        utterance: &'a str,
    ) -> ServiceFuture<'a, Result<IntentResult, ServiceError>> {
        Box::pin(async move {
            record(&self.calls, utterance)?;
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }

            let lowered = utterance.to_lowercase();
            let matched = self
                .rules
                .iter()
                .find(|(keyword, _)| lowered.contains(keyword.as_str()))
                .map(|(_, result)| IntentResult {
                    text: utterance.to_string(),
                    ..result.clone()
                });

            Ok(matched.unwrap_or_else(|| IntentResult::new(utterance, Self::NONE_INTENT, 0.0)))
        })
    }
}

#[derive(Debug, Default)]
pub struct StaticKnowledgeBase {
    entries: Vec<(String, KbAnswer)>,
    failure: Option<ServiceError>,
    calls: Mutex<Vec<String>>,
}

impl StaticKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(
        mut self,
        keyword: impl Into<String>,
        answer: impl Into<String>,
        score: f64,
    ) -> Self {
        self.entries
            .push((keyword.into().to_lowercase(), KbAnswer::new(answer, score)));
        self
    }

    pub fn failing(mut self, error: ServiceError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn calls(&self) -> Result<Vec<String>, ServiceError> {
        snapshot(&self.calls)
    }
}

impl KnowledgeBase for StaticKnowledgeBase {
    fn query<'a>(
        &'a self,
        utterance: &'a str,
    ) -> ServiceFuture<'a, Result<Vec<KbAnswer>, ServiceError>> {
        Box::pin(async move {
            record(&self.calls, utterance)?;
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }

            let lowered = utterance.to_lowercase();
            let mut answers = self
                .entries
                .iter()
                .filter(|(keyword, _)| lowered.contains(keyword.as_str()))
                .map(|(_, answer)| answer.clone())
                .collect::<Vec<_>>();
            answers.sort_by(|left, right| right.score.total_cmp(&left.score));

            Ok(answers)
        })
    }
}

#[derive(Debug)]
pub struct StaticImageTagger {
    analysis: Result<ImageAnalysis, ServiceError>,
    calls: Mutex<Vec<String>>,
}

impl StaticImageTagger {
    pub fn new(analysis: ImageAnalysis) -> Self {
        Self {
            analysis: Ok(analysis),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn car(caption: impl Into<String>) -> Self {
        Self::new(ImageAnalysis::new(true, caption))
    }

    pub fn not_car(caption: impl Into<String>) -> Self {
        Self::new(ImageAnalysis::new(false, caption))
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            analysis: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Byte lengths of every analyzed image, in call order.
    pub fn calls(&self) -> Result<Vec<String>, ServiceError> {
        snapshot(&self.calls)
    }
}

impl ImageTagger for StaticImageTagger {
    fn analyze<'a>(
        &'a self,
        image: &'a [u8],
    ) -> ServiceFuture<'a, Result<ImageAnalysis, ServiceError>> {
        Box::pin(async move {
            record(&self.calls, image.len().to_string())?;
            self.analysis.clone()
        })
    }
}

/// Returns the same predictions for every image.
#[derive(Debug)]
pub struct StaticCarTypeClassifier {
    predictions: Result<Vec<CarTypePrediction>, ServiceError>,
    calls: Mutex<Vec<String>>,
}

impl StaticCarTypeClassifier {
    pub fn new() -> Self {
        Self {
            predictions: Ok(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A classifier that is certain the image shows `tag`.
    pub fn recognizing(tag: impl Into<String>) -> Self {
        Self::new().with_prediction(tag, 0.98)
    }

    pub fn with_prediction(mut self, tag: impl Into<String>, probability: f64) -> Self {
        if let Ok(predictions) = &mut self.predictions {
            predictions.push(CarTypePrediction::new(tag, probability));
        }
        self
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            predictions: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Byte lengths of every classified image, in call order.
    pub fn calls(&self) -> Result<Vec<String>, ServiceError> {
        snapshot(&self.calls)
    }
}

impl Default for StaticCarTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CarTypeClassifier for StaticCarTypeClassifier {
    fn predict<'a>(
        &'a self,
        image: &'a [u8],
    ) -> ServiceFuture<'a, Result<Vec<CarTypePrediction>, ServiceError>> {
        Box::pin(async move {
            record(&self.calls, image.len().to_string())?;
            self.predictions.clone()
        })
    }
}

#[derive(Debug)]
pub struct StaticSentimentScorer {
    score: Result<f64, ServiceError>,
    calls: Mutex<Vec<String>>,
}

impl StaticSentimentScorer {
    pub fn new(score: f64) -> Self {
        Self {
            score: Ok(score.clamp(0.0, 1.0)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            score: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Result<Vec<String>, ServiceError> {
        snapshot(&self.calls)
    }
}

impl SentimentScorer for StaticSentimentScorer {
    fn score<'a>(&'a self, text: &'a str) -> ServiceFuture<'a, Result<f64, ServiceError>> {
        Box::pin(async move {
            record(&self.calls, text)?;
            self.score.clone()
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAttachmentLoader {
    blobs: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryAttachmentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.blobs.insert(url.into(), bytes.into());
        self
    }

    pub fn calls(&self) -> Result<Vec<String>, ServiceError> {
        snapshot(&self.calls)
    }
}

impl AttachmentLoader for InMemoryAttachmentLoader {
    fn load<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Result<Vec<u8>, ServiceError>> {
        Box::pin(async move {
            record(&self.calls, url)?;
            self.blobs
                .get(url)
                .cloned()
                .ok_or_else(|| ServiceError::invalid_request(format!("no attachment at '{url}'")))
        })
    }
}
