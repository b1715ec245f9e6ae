//! LUIS v2 prediction endpoint client.

use crate::{IntentClassifier, IntentResult, ServiceError, ServiceFuture, ServiceId};

use super::client::{HttpEndpoint, HttpServiceClient, map_decode_error};
use super::serde_api::LuisResponse;

#[derive(Debug, Clone)]
pub struct LuisIntentClassifier {
    http: HttpServiceClient,
    endpoint: HttpEndpoint,
    app_id: String,
}

impl LuisIntentClassifier {
    pub fn new(
        http: HttpServiceClient,
        endpoint: HttpEndpoint,
        app_id: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        endpoint.validate(ServiceId::IntentClassifier)?;
        let app_id = app_id.into();
        if app_id.trim().is_empty() {
            return Err(ServiceError::invalid_request("luis app id must not be empty"));
        }

        Ok(Self {
            http,
            endpoint,
            app_id,
        })
    }

    async fn predict(&self, utterance: &str) -> Result<IntentResult, ServiceError> {
        let url = self
            .endpoint
            .url(&format!("luis/v2.0/apps/{}", self.app_id));
        let builder = self.http.inner().get(url).query(&[
            ("subscription-key", self.endpoint.api_key.expose()),
            ("q", utterance),
            ("verbose", "false"),
        ]);

        let response = self
            .http
            .send(ServiceId::IntentClassifier, builder)
            .await?;
        let parsed: LuisResponse = response.json().await.map_err(map_decode_error)?;

        Ok(parsed.into())
    }
}

impl IntentClassifier for LuisIntentClassifier {
    fn classify<'a>(
        &'a self,
        utterance: &'a str,
    ) -> ServiceFuture<'a, Result<IntentResult, ServiceError>> {
        Box::pin(self.predict(utterance))
    }
}
