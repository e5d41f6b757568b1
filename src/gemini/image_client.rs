use crate::{
    config::Credential,
    error::{IncompleteReason, Result, StudioError},
    gemini::{transport::Transport, RetryPolicy},
    models::{
        GenerateContentRequest, GenerateContentResponse, GeneratedImage, InlineData, SourceImage,
        FINISH_REASON_STOP,
    },
};
use std::sync::Arc;

/// Turns a prompt plus the product photo into one generated image.
#[derive(Clone)]
pub struct ImageClient {
    transport: Arc<dyn Transport>,
    credential: Credential,
    model: String,
    pub(crate) retry: RetryPolicy,
}

impl ImageClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credential: Credential,
        model: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            credential,
            model: model.into(),
            retry,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str, source: &SourceImage) -> Result<GeneratedImage> {
        let api_key = self.credential.resolve()?;

        let request = GenerateContentRequest::image_edit(
            prompt,
            InlineData {
                mime_type: source.mime_type.clone(),
                data: source.data.clone(),
            },
        );

        log::info!("Generating image with model: {}", self.model);
        log::debug!(
            "Image request: prompt {} chars, source {} ({} base64 bytes)",
            prompt.len(),
            source.mime_type,
            source.data.len()
        );

        let response = self
            .retry
            .run(|| {
                self.transport
                    .generate_content(&self.model, &api_key, &request)
            })
            .await?;

        extract_image(response).map_err(|e| {
            log::warn!("Image generation rejected: {}", e);
            e
        })
    }
}

/// Validates a `generateContent` response and pulls out the first inline
/// image. The checks run in a fixed order and the first failing one wins.
pub fn extract_image(response: GenerateContentResponse) -> Result<GeneratedImage> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        return Err(StudioError::Blocked {
            reason: reason.clone(),
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(StudioError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != FINISH_REASON_STOP {
            return Err(StudioError::Incomplete(IncompleteReason::from_code(reason)));
        }
    }

    let parts = candidate
        .content
        .and_then(|content| content.parts)
        .ok_or(StudioError::EmptyResponse)?;

    parts
        .into_iter()
        .find_map(|part| part.inline_data)
        .map(|inline| GeneratedImage::new(inline.data, inline.mime_type))
        .ok_or(StudioError::NoImageFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gemini::transport::mock::{image_response, MockTransport, Scripted};
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    fn client(transport: Arc<MockTransport>, credential: Credential) -> ImageClient {
        ImageClient::new(transport, credential, "test-image-model", RetryPolicy::none())
    }

    fn source() -> SourceImage {
        SourceImage::new("c291cmNl", "image/jpeg")
    }

    #[tokio::test]
    async fn test_generate_happy_path() {
        let transport = Arc::new(MockTransport::new(vec![Scripted::ok(image_response(
            "AAAA",
            "image/png",
        ))]));
        let image = client(transport.clone(), Credential::Static(Some("key".into())))
            .generate("shiny", &source())
            .await
            .unwrap();

        assert_eq!(image.to_data_url(), "data:image/png;base64,AAAA");
        assert_eq!(transport.calls(), 1);

        let seen = transport.seen.lock().unwrap();
        let (model, body) = &seen[0];
        assert_eq!(model, "test-image-model");
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "c291cmNl");
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "shiny");
        assert_eq!(body["generationConfig"]["responseModalities"], json!(["IMAGE"]));
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let transport = Arc::new(MockTransport::new(vec![]));
        let err = client(transport.clone(), Credential::Static(None))
            .generate("shiny", &source())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced() {
        let transport = Arc::new(MockTransport::new(vec![Scripted::err(StudioError::Api {
            status: 400,
            message: "bad image".into(),
        })]));
        let err = client(transport.clone(), Credential::Static(Some("key".into())))
            .generate("shiny", &source())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Api { status: 400, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_block_reason_wins() {
        let err = extract_image(response(json!({
            "promptFeedback": {"blockReason": "PROHIBITED_CONTENT"},
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "AAAA"}}]}}]
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Blocked);
        assert!(err.to_string().contains("PROHIBITED_CONTENT"));
    }

    #[test]
    fn test_no_candidates() {
        let err = extract_image(response(json!({"candidates": []}))).unwrap_err();
        assert!(matches!(err, StudioError::EmptyResponse));

        let err = extract_image(response(json!({}))).unwrap_err();
        assert!(matches!(err, StudioError::EmptyResponse));
    }

    #[test]
    fn test_finish_reasons() {
        let cases = [
            ("SAFETY", IncompleteReason::Safety),
            ("RECITATION", IncompleteReason::Recitation),
            ("NO_IMAGE", IncompleteReason::NoImage),
            (
                "OTHER_UNLISTED",
                IncompleteReason::Unexpected("OTHER_UNLISTED".into()),
            ),
        ];

        for (code, expected) in cases {
            let err = extract_image(response(json!({
                "candidates": [{
                    "finishReason": code,
                    "content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "AAAA"}}]}
                }]
            })))
            .unwrap_err();

            match err {
                StudioError::Incomplete(reason) => assert_eq!(reason, expected),
                other => panic!("expected incomplete generation for {}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_missing_finish_reason_is_accepted() {
        let image = extract_image(response(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/webp", "data": "BBBB"}}]}}]
        })))
        .unwrap();
        assert_eq!(image, GeneratedImage::new("BBBB", "image/webp"));
    }

    #[test]
    fn test_candidate_without_content() {
        let err = extract_image(response(json!({
            "candidates": [{"finishReason": "STOP"}]
        })))
        .unwrap_err();
        assert!(matches!(err, StudioError::EmptyResponse));

        let err = extract_image(response(json!({
            "candidates": [{"finishReason": "STOP", "content": {}}]
        })))
        .unwrap_err();
        assert!(matches!(err, StudioError::EmptyResponse));
    }

    #[test]
    fn test_no_image_segment() {
        let err = extract_image(response(json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": {"parts": [{"text": "I cannot draw that"}]}
            }]
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoImageFound);

        let err = extract_image(response(json!({
            "candidates": [{"finishReason": "STOP", "content": {"parts": []}}]
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoImageFound);
    }

    #[test]
    fn test_first_image_segment_is_used() {
        let image = extract_image(response(json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": {"parts": [
                    {"text": "Here is your image"},
                    {"inlineData": {"mimeType": "image/png", "data": "FIRST"}},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "SECOND"}}
                ]}
            }]
        })))
        .unwrap();
        assert_eq!(image.data, "FIRST");
        assert_eq!(image.mime_type, "image/png");
    }
}
