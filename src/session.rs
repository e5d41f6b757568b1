//! Session state for one product-photo workflow.
//!
//! All mutable state lives in [`Session`]. Actions take `&mut self`, so two
//! actions can never overlap on the same session; the [`Activity`] field
//! additionally records which action is in flight so a session that is
//! shared behind a lock can be inspected and rejected while busy.

use crate::{
    batch::generate_batch,
    error::{Result, StudioError},
    gemini::GeminiClient,
    logger::Timer,
    models::{GeneratedImage, GenerationOptions, Platform, SourceImage},
    prompt::compose,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    Idle,
    Generating,
    GeneratingMore,
    Refining,
}

impl Activity {
    fn label(&self) -> &'static str {
        match self {
            Activity::Idle => "idle",
            Activity::Generating => "generate",
            Activity::GeneratingMore => "generate more",
            Activity::Refining => "refine",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    options: GenerationOptions,
    source: Option<SourceImage>,
    results: Vec<GeneratedImage>,
    activity: Activity,
    error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            options: GenerationOptions::default(),
            source: None,
            results: Vec::new(),
            activity: Activity::Idle,
            error: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn results(&self) -> &[GeneratedImage] {
        &self.results
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    /// The prompt the next generation would send.
    pub fn prompt(&self) -> String {
        compose(&self.options, true)
    }

    pub fn with_options(&mut self, options: GenerationOptions) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.options = options;
        Ok(self)
    }

    pub fn with_platform(&mut self, platform: Platform) -> Result<&mut Self> {
        let options = self.options.clone().with_platform(platform);
        self.with_options(options)
    }

    pub fn with_source(&mut self, source: SourceImage) -> Result<&mut Self> {
        self.ensure_idle()?;
        self.source = Some(source);
        Ok(self)
    }

    /// Back to a blank session.
    pub fn restart(&mut self) -> Result<()> {
        self.ensure_idle()?;
        *self = Self::default();
        Ok(())
    }

    /// Fresh batch: previous results are dropped before the batch starts.
    pub async fn generate(&mut self, client: &GeminiClient) -> Result<&[GeneratedImage]> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| self.fail_early(StudioError::MissingSourceImage))?;
        self.begin(Activity::Generating)?;
        self.results.clear();

        let outcome = self
            .run_batch(client, &source)
            .await
            .map(|images| self.results = images);
        self.settle(outcome)?;
        Ok(&self.results)
    }

    /// Additive batch: new images are appended only if the whole batch
    /// succeeded; earlier results are kept either way.
    pub async fn generate_more(&mut self, client: &GeminiClient) -> Result<&[GeneratedImage]> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| self.fail_early(StudioError::MissingSourceImage))?;
        self.begin(Activity::GeneratingMore)?;

        let outcome = self
            .run_batch(client, &source)
            .await
            .map(|images| self.results.extend(images));
        self.settle(outcome)?;
        Ok(&self.results)
    }

    /// Replaces the custom instruction with a model-refined version.
    pub async fn refine(&mut self, client: &GeminiClient) -> Result<&str> {
        self.begin(Activity::Refining)?;
        let _timer = Timer::new("instruction refinement");

        let context = compose(&self.options, false);
        let outcome = client
            .text()
            .refine(&self.options.custom_instruction, &context)
            .await
            .map(|refined| {
                self.options = self.options.clone().with_custom_instruction(refined);
            });
        self.settle(outcome)?;
        Ok(&self.options.custom_instruction)
    }

    async fn run_batch(
        &self,
        client: &GeminiClient,
        source: &SourceImage,
    ) -> Result<Vec<GeneratedImage>> {
        let prompt = compose(&self.options, true);
        generate_batch(client.image(), &prompt, source, self.options.batch_size()).await
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(StudioError::Busy(self.activity.label().to_string()));
        }
        Ok(())
    }

    fn begin(&mut self, activity: Activity) -> Result<()> {
        self.ensure_idle()?;
        log::info!("Session action started: {}", activity.label());
        self.activity = activity;
        self.error = None;
        Ok(())
    }

    /// Missing-input failures are reported without entering an action.
    fn fail_early(&mut self, error: StudioError) -> StudioError {
        if !self.is_busy() {
            self.error = Some(error.to_string());
        }
        error
    }

    fn settle(&mut self, outcome: Result<()>) -> Result<()> {
        let finished = self.activity;
        self.activity = Activity::Idle;
        match outcome {
            Ok(()) => {
                log::info!("Session action finished: {}", finished.label());
                Ok(())
            }
            Err(e) => {
                log::error!("Session action failed: {}: {}", finished.label(), e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
