use crate::{
    error::{Result, StudioError},
    models::{GenerateContentRequest, GenerateContentResponse},
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// One round trip to `models/{model}:generateContent`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StudioError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn map_send_error(&self, e: reqwest::Error) -> StudioError {
        if e.is_timeout() {
            StudioError::Timeout(self.timeout)
        } else {
            StudioError::Request(format!("Gemini request failed: {}", e))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Gemini returned HTTP {} for model {}", status, model);
            log::debug!("Gemini error body: {}", error_text);
            return Err(StudioError::Api {
                status: status.as_u16(),
                message: api_error_message(&error_text),
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        log::debug!("Gemini response body: {} bytes", body.len());

        serde_json::from_str(&body).map_err(|e| StudioError::Response(e.to_string()))
    }
}

/// Pulls `error.message` out of a Google API error body, falling back to
/// the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, TestServer};

    async fn call(server: &TestServer, timeout: Duration) -> Result<GenerateContentResponse> {
        let transport = HttpTransport::new(server.url("/v1beta"), timeout).unwrap();
        transport
            .generate_content("gemini-2.5-flash", "key", &GenerateContentRequest::text("hi"))
            .await
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let transport = HttpTransport::new("https://example.test/v1beta/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            transport.endpoint("gemini-2.5-flash-image"),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message(" upstream exploded \n"), "upstream exploded");
    }

    #[tokio::test]
    async fn test_success_body_is_parsed() {
        let server = TestServer::start(|path| {
            assert_eq!(path, "/v1beta/models/gemini-2.5-flash:generateContent");
            Reply::status(
                200,
                "application/json",
                br#"{"candidates":[{"content":{"parts":[{"text":"ok"}]},"finishReason":"STOP"}]}"#,
            )
        })
        .await;

        let response = call(&server, Duration::from_secs(5)).await.unwrap();
        assert_eq!(response.text().as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_client_error_maps_to_api() {
        let server = TestServer::start(|_| {
            Reply::status(
                400,
                "application/json",
                br#"{"error":{"code":400,"message":"API key not valid"}}"#,
            )
        })
        .await;

        let err = call(&server, Duration::from_secs(5)).await.unwrap_err();
        match err {
            StudioError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let server =
            TestServer::start(|_| Reply::status(503, "text/plain", b"overloaded")).await;

        let err = call(&server, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, StudioError::Api { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_response() {
        let server = TestServer::start(|_| Reply::status(200, "application/json", b"{not json")).await;

        let err = call(&server, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, StudioError::Response(_)));
    }

    #[tokio::test]
    async fn test_elapsed_timeout_maps_to_timeout() {
        let server = TestServer::start(|_| Reply::Stall(Duration::from_secs(5))).await;

        let err = call(&server, Duration::from_millis(200)).await.unwrap_err();
        assert!(matches!(err, StudioError::Timeout(t) if t == Duration::from_millis(200)));
    }
}
