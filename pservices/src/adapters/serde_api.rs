//! Wire payloads for the hosted services and conversions into crate types.

use serde::{Deserialize, Serialize};

use crate::{CarTypePrediction, ImageAnalysis, IntentResult, KbAnswer, ServiceError};

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    match parsed {
        ApiErrorEnvelope::Nested { error } => Some(error.message),
        ApiErrorEnvelope::Flat { message } => Some(message),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiErrorEnvelope {
    Nested { error: ApiError },
    Flat { message: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LuisResponse {
    #[serde(default)]
    pub query: String,
    pub top_scoring_intent: Option<LuisIntent>,
    #[serde(default)]
    pub entities: Vec<LuisEntity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LuisIntent {
    pub intent: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LuisEntity {
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub resolution: Option<LuisResolution>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LuisResolution {
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

impl From<LuisResponse> for IntentResult {
    fn from(response: LuisResponse) -> Self {
        let (top_intent, score) = response
            .top_scoring_intent
            .map(|intent| (intent.intent, intent.score))
            .unwrap_or_else(|| ("None".to_string(), 0.0));

        let mut result = IntentResult::new(response.query, top_intent, score);
        for entity in response.entities {
            // List entities carry the canonical value in their resolution.
            let canonical = entity
                .resolution
                .as_ref()
                .and_then(|resolution| resolution.values.first())
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .unwrap_or(entity.entity);
            result = result.with_entity(entity.entity_type, canonical);
        }

        result
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QnaRequest<'a> {
    pub question: &'a str,
    pub top: u32,
    pub score_threshold: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QnaResponse {
    #[serde(default)]
    pub answers: Vec<QnaAnswer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QnaAnswer {
    pub answer: String,
    /// Reported on a 0-100 scale.
    #[serde(default)]
    pub score: f64,
}

pub(crate) fn qna_answers(response: QnaResponse, threshold: f64, top: usize) -> Vec<KbAnswer> {
    let mut answers = response
        .answers
        .into_iter()
        .map(|answer| KbAnswer::new(answer.answer, answer.score / 100.0))
        .filter(|answer| answer.score > 0.0 && answer.score >= threshold)
        .collect::<Vec<_>>();
    answers.sort_by(|left, right| right.score.total_cmp(&left.score));
    answers.truncate(top);
    answers
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VisionResponse {
    #[serde(default)]
    pub tags: Vec<VisionTag>,
    #[serde(default)]
    pub categories: Vec<VisionCategory>,
    pub description: Option<VisionDescription>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VisionTag {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VisionCategory {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VisionDescription {
    #[serde(default)]
    pub captions: Vec<VisionCaption>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VisionCaption {
    pub text: String,
}

impl From<VisionResponse> for ImageAnalysis {
    fn from(response: VisionResponse) -> Self {
        let is_car = response.tags.iter().any(|tag| tag.name == "car")
            || response
                .categories
                .iter()
                .any(|category| category.name.contains("trans_car"));
        let caption = response
            .description
            .and_then(|description| description.captions.into_iter().next())
            .map(|caption| caption.text)
            .unwrap_or_default();

        ImageAnalysis::new(is_car, caption)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CustomVisionResponse {
    #[serde(default)]
    pub predictions: Vec<CustomVisionPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CustomVisionPrediction {
    pub tag_name: String,
    #[serde(default)]
    pub probability: f64,
}

impl From<CustomVisionResponse> for Vec<CarTypePrediction> {
    fn from(response: CustomVisionResponse) -> Self {
        response
            .predictions
            .into_iter()
            .map(|prediction| CarTypePrediction::new(prediction.tag_name, prediction.probability))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SentimentRequest<'a> {
    pub documents: Vec<SentimentDocument<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SentimentDocument<'a> {
    pub language: &'a str,
    pub id: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentResponse {
    #[serde(default)]
    pub documents: Vec<SentimentScore>,
    #[serde(default)]
    pub errors: Vec<SentimentDocumentError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentScore {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentimentDocumentError {
    pub id: String,
    pub message: String,
}

pub(crate) fn sentiment_score(
    response: SentimentResponse,
    document_id: &str,
) -> Result<f64, ServiceError> {
    if let Some(error) = response.errors.iter().find(|error| error.id == document_id) {
        return Err(ServiceError::invalid_request(error.message.clone()));
    }

    response
        .documents
        .iter()
        .find(|document| document.id == document_id)
        .map(|document| document.score.clamp(0.0, 1.0))
        .ok_or_else(|| ServiceError::invalid_response("sentiment response had no score"))
}
