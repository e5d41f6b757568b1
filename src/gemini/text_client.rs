use crate::{
    config::Credential,
    error::Result,
    gemini::{transport::Transport, RetryPolicy},
    models::GenerateContentRequest,
    prompt::refinement_directive,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct TextClient {
    transport: Arc<dyn Transport>,
    credential: Credential,
    model: String,
    retry: RetryPolicy,
}

impl TextClient {
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

    /// Rewrites `current_instruction` into a richer one using `context`
    /// (the composed prompt without the instruction itself).
    ///
    /// The returned text is only trimmed; an empty reply is passed through.
    pub async fn refine(&self, current_instruction: &str, context: &str) -> Result<String> {
        let api_key = self.credential.resolve()?;
        let request = GenerateContentRequest::text(&refinement_directive(current_instruction, context));

        log::info!("Refining instruction with model: {}", self.model);
        log::debug!(
            "Refinement input: {} chars, context {} chars",
            current_instruction.len(),
            context.len()
        );

        let response = self
            .retry
            .run(|| {
                self.transport
                    .generate_content(&self.model, &api_key, &request)
            })
            .await?;

        let text = response.text().unwrap_or_default();
        if text.trim().is_empty() {
            log::warn!("Refinement returned no text");
        }

        Ok(text.trim().to_string())
    }
}
