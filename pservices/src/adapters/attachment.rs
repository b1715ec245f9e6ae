//! Plain GET download of attachment content URLs.

use crate::{AttachmentLoader, ServiceError, ServiceFuture, ServiceId};

use super::client::{HttpServiceClient, map_decode_error};

#[derive(Debug, Clone)]
pub struct HttpAttachmentLoader {
    http: HttpServiceClient,
}

impl HttpAttachmentLoader {
    pub fn new(http: HttpServiceClient) -> Self {
        Self { http }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ServiceError::invalid_request(format!(
                "unsupported attachment url '{url}'"
            )));
        }

        let builder = self.http.inner().get(url);
        let response = self.http.send(ServiceId::AttachmentLoader, builder).await?;
        let bytes = response.bytes().await.map_err(map_decode_error)?;

        Ok(bytes.to_vec())
    }
}

impl AttachmentLoader for HttpAttachmentLoader {
    fn load<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Result<Vec<u8>, ServiceError>> {
        Box::pin(self.download(url))
    }
}
