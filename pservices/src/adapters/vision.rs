//! Computer Vision `analyze` client.

use crate::{ImageAnalysis, ImageTagger, ServiceError, ServiceFuture, ServiceId};

use super::client::{HttpEndpoint, HttpServiceClient, map_decode_error};
use super::serde_api::VisionResponse;

#[derive(Debug, Clone)]
pub struct ComputerVisionImageTagger {
    http: HttpServiceClient,
    endpoint: HttpEndpoint,
}

impl ComputerVisionImageTagger {
    pub fn new(http: HttpServiceClient, endpoint: HttpEndpoint) -> Result<Self, ServiceError> {
        endpoint.validate(ServiceId::ImageTagger)?;
        Ok(Self { http, endpoint })
    }

    async fn analyze_image(&self, image: &[u8]) -> Result<ImageAnalysis, ServiceError> {
        if image.is_empty() {
            return Err(ServiceError::invalid_request("image must not be empty"));
        }

        let url = self.endpoint.url("vision/v2.0/analyze");
        let builder = self
            .http
            .inner()
            .post(url)
            .query(&[("visualFeatures", "Tags,Description,Categories")])
            .header(
                "Ocp-Apim-Subscription-Key",
                self.endpoint.api_key.expose(),
            )
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec());

        let response = self.http.send(ServiceId::ImageTagger, builder).await?;
        let parsed: VisionResponse = response.json().await.map_err(map_decode_error)?;

        Ok(parsed.into())
    }
}

impl ImageTagger for ComputerVisionImageTagger {
    fn analyze<'a>(
        &'a self,
        image: &'a [u8],
    ) -> ServiceFuture<'a, Result<ImageAnalysis, ServiceError>> {
        Box::pin(self.analyze_image(image))
    }
}
