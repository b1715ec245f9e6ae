//! Custom Vision published-iteration image classifier.

use crate::{CarTypeClassifier, CarTypePrediction, ServiceError, ServiceFuture, ServiceId};

use super::client::{HttpEndpoint, HttpServiceClient, map_decode_error};
use super::serde_api::CustomVisionResponse;

#[derive(Debug, Clone)]
pub struct CustomVisionCarTypeClassifier {
    http: HttpServiceClient,
    endpoint: HttpEndpoint,
    project_id: String,
    published_name: String,
}

impl CustomVisionCarTypeClassifier {
    pub fn new(
        http: HttpServiceClient,
        endpoint: HttpEndpoint,
        project_id: impl Into<String>,
        published_name: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        endpoint.validate(ServiceId::CarTypeClassifier)?;
        let project_id = project_id.into();
        let published_name = published_name.into();
        if project_id.trim().is_empty() || published_name.trim().is_empty() {
            return Err(ServiceError::invalid_request(
                "custom vision project id and published name must not be empty",
            ));
        }

        Ok(Self {
            http,
            endpoint,
            project_id,
            published_name,
        })
    }

    fn classify_path(&self) -> String {
        format!(
            "customvision/v3.0/Prediction/{}/classify/iterations/{}/image",
            self.project_id, self.published_name
        )
    }

    async fn classify_image(&self, image: &[u8]) -> Result<Vec<CarTypePrediction>, ServiceError> {
        if image.is_empty() {
            return Err(ServiceError::invalid_request("image must not be empty"));
        }

        let builder = self
            .http
            .inner()
            .post(self.endpoint.url(&self.classify_path()))
            .header("Prediction-Key", self.endpoint.api_key.expose())
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());

        let response = self.http.send(ServiceId::CarTypeClassifier, builder).await?;
        let parsed: CustomVisionResponse = response.json().await.map_err(map_decode_error)?;

        Ok(parsed.into())
    }
}

impl CarTypeClassifier for CustomVisionCarTypeClassifier {
    fn predict<'a>(
        &'a self,
        image: &'a [u8],
    ) -> ServiceFuture<'a, Result<Vec<CarTypePrediction>, ServiceError>> {
        Box::pin(self.classify_image(image))
    }
}
