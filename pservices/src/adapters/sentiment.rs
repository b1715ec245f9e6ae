//! Text Analytics v2 sentiment client.

use crate::{SentimentScorer, ServiceError, ServiceFuture, ServiceId};

use super::client::{HttpEndpoint, HttpServiceClient, map_decode_error};
use super::serde_api::{SentimentDocument, SentimentRequest, SentimentResponse, sentiment_score};

const DOCUMENT_ID: &str = "1";

#[derive(Debug, Clone)]
pub struct TextAnalyticsSentimentScorer {
    http: HttpServiceClient,
    endpoint: HttpEndpoint,
    language: String,
}

impl TextAnalyticsSentimentScorer {
    pub fn new(http: HttpServiceClient, endpoint: HttpEndpoint) -> Result<Self, ServiceError> {
        endpoint.validate(ServiceId::SentimentScorer)?;
        Ok(Self {
            http,
            endpoint,
            language: "en".to_string(),
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    async fn score_text(&self, text: &str) -> Result<f64, ServiceError> {
        let url = self.endpoint.url("text/analytics/v2.0/sentiment");
        let request = SentimentRequest {
            documents: vec![SentimentDocument {
                language: &self.language,
                id: DOCUMENT_ID,
                text,
            }],
        };
        let builder = self
            .http
            .inner()
            .post(url)
            .header(
                "Ocp-Apim-Subscription-Key",
                self.endpoint.api_key.expose(),
            )
            .json(&request);

        let response = self.http.send(ServiceId::SentimentScorer, builder).await?;
        let parsed: SentimentResponse = response.json().await.map_err(map_decode_error)?;

        sentiment_score(parsed, DOCUMENT_ID)
    }
}

impl SentimentScorer for TextAnalyticsSentimentScorer {
    fn score<'a>(&'a self, text: &'a str) -> ServiceFuture<'a, Result<f64, ServiceError>> {
        Box::pin(self.score_text(text))
    }
}
