pub mod image_client;
pub mod text_client;
pub mod transport;

use crate::{config::GeminiConfig, error::Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use image_client::ImageClient;
pub use text_client::TextClient;
pub use transport::{HttpTransport, Transport};

/// Extra attempts for transient transport failures. Zero means one
/// attempt per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Duration::from_millis(500),
        }
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff * attempt;
                    log::warn!(
                        "Retrying after transient error (attempt {}/{}, waiting {}ms): {}",
                        attempt,
                        self.max_retries,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
    text_client: TextClient,
}

impl GeminiClient {
    /// Builds both clients over a shared HTTP transport. The API key is not
    /// looked at here; every call resolves it on its own.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.base_url, config.timeout)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: GeminiConfig, transport: Arc<dyn Transport>) -> Self {
        let retry = if config.max_retries > 0 {
            RetryPolicy::new(config.max_retries)
        } else {
            RetryPolicy::none()
        };

        Self {
            image_client: ImageClient::new(
                transport.clone(),
                config.credential.clone(),
                config.image_model,
                retry,
            ),
            text_client: TextClient::new(transport, config.credential, config.text_model, retry),
        }
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }
}
