//! QnA Maker `generateAnswer` client.

use crate::{KbAnswer, KnowledgeBase, ServiceError, ServiceFuture, ServiceId};

use super::client::{HttpEndpoint, HttpServiceClient, map_decode_error};
use super::serde_api::{QnaRequest, QnaResponse, qna_answers};

pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_TOP: u32 = 1;

#[derive(Debug, Clone)]
pub struct QnaKnowledgeBase {
    http: HttpServiceClient,
    endpoint: HttpEndpoint,
    knowledge_base_id: String,
    score_threshold: f64,
    top: u32,
}

impl QnaKnowledgeBase {
    pub fn new(
        http: HttpServiceClient,
        endpoint: HttpEndpoint,
        knowledge_base_id: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        endpoint.validate(ServiceId::KnowledgeBase)?;
        let knowledge_base_id = knowledge_base_id.into();
        if knowledge_base_id.trim().is_empty() {
            return Err(ServiceError::invalid_request(
                "knowledge base id must not be empty",
            ));
        }

        Ok(Self {
            http,
            endpoint,
            knowledge_base_id,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            top: DEFAULT_TOP,
        })
    }

    /// Minimum score in `[0, 1]` an answer needs to be returned.
    pub fn with_score_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = score_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top.max(1);
        self
    }

    async fn generate_answer(&self, question: &str) -> Result<Vec<KbAnswer>, ServiceError> {
        let url = self.endpoint.url(&format!(
            "knowledgebases/{}/generateAnswer",
            self.knowledge_base_id
        ));
        let request = QnaRequest {
            question,
            top: self.top,
            score_threshold: self.score_threshold * 100.0,
        };
        let builder = self
            .http
            .inner()
            .post(url)
            .header(
                "Authorization",
                format!("EndpointKey {}", self.endpoint.api_key.expose()),
            )
            .json(&request);

        let response = self.http.send(ServiceId::KnowledgeBase, builder).await?;
        let parsed: QnaResponse = response.json().await.map_err(map_decode_error)?;

        Ok(qna_answers(parsed, self.score_threshold, self.top as usize))
    }
}

impl KnowledgeBase for QnaKnowledgeBase {
    fn query<'a>(
        &'a self,
        utterance: &'a str,
    ) -> ServiceFuture<'a, Result<Vec<KbAnswer>, ServiceError>> {
        Box::pin(self.generate_answer(utterance))
    }
}
