use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::{SecretString, ServiceError, ServiceId};

use super::serde_api::extract_error_message;

/// Base URL plus subscription key for one hosted service.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    pub base_url: String,
    pub api_key: SecretString,
}

impl HttpEndpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: SecretString::new(api_key),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn validate(&self, service: ServiceId) -> Result<(), ServiceError> {
        if self.base_url.trim().is_empty() {
            return Err(ServiceError::invalid_request(format!(
                "{service} endpoint must not be empty"
            )));
        }

        if self.api_key.is_empty() {
            return Err(ServiceError::authentication(format!(
                "{service} api key must not be empty"
            )));
        }

        Ok(())
    }
}

/// Shared reqwest client; every adapter issues exactly one request per call.
#[derive(Debug, Clone)]
pub struct HttpServiceClient {
    client: Client,
}

impl HttpServiceClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ServiceError::transport(err.to_string()))?;

        Ok(Self::new(client))
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Sends the request and returns the response only for 2xx statuses.
    pub(crate) async fn send(
        &self,
        service: ServiceId,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response, ServiceError> {
        let response = builder.send().await.map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(parse_error(service, response).await);
        }

        Ok(response)
    }
}

pub(crate) fn map_send_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::timeout(err.to_string())
    } else {
        ServiceError::transport(err.to_string())
    }
}

pub(crate) fn map_decode_error(err: reqwest::Error) -> ServiceError {
    ServiceError::invalid_response(err.to_string())
}

async fn parse_error(service: ServiceId, response: Response) -> ServiceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("{service} request failed with status {status}"));

    error_for_status(status, message)
}

pub(crate) fn error_for_status(status: StatusCode, message: String) -> ServiceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        StatusCode::BAD_REQUEST
        | StatusCode::NOT_FOUND
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::invalid_request(message),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            ServiceError::unavailable(message)
        }
        _ => ServiceError::transport(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceErrorKind;

    #[test]
    fn status_codes_map_to_error_kinds() {
        let cases = [
            (StatusCode::UNAUTHORIZED, ServiceErrorKind::Authentication),
            (StatusCode::TOO_MANY_REQUESTS, ServiceErrorKind::RateLimited),
            (StatusCode::GATEWAY_TIMEOUT, ServiceErrorKind::Timeout),
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, ServiceErrorKind::InvalidRequest),
            (StatusCode::BAD_GATEWAY, ServiceErrorKind::Unavailable),
            (StatusCode::INTERNAL_SERVER_ERROR, ServiceErrorKind::Transport),
        ];

        for (status, kind) in cases {
            assert_eq!(error_for_status(status, "boom".to_string()).kind, kind);
        }
    }

    #[test]
    fn endpoint_joins_paths_and_validates_keys() {
        let endpoint = HttpEndpoint::new("https://westus.api.example.com/", "key");
        assert_eq!(
            endpoint.url("/text/analytics/v2.0/sentiment"),
            "https://westus.api.example.com/text/analytics/v2.0/sentiment"
        );
        assert!(endpoint.validate(ServiceId::SentimentScorer).is_ok());

        let missing_key = HttpEndpoint::new("https://westus.api.example.com", " ");
        let error = missing_key
            .validate(ServiceId::SentimentScorer)
            .expect_err("blank key must fail");
        assert_eq!(error.kind, ServiceErrorKind::Authentication);
    }
}
