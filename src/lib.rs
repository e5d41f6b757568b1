pub mod batch;
pub mod config;
pub mod download;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod session;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::generate_batch;
pub use config::{Config, Credential, FetchPolicy, GeminiConfig};
pub use error::{ErrorKind, IncompleteReason, Result, StudioError};
pub use gemini::{GeminiClient, HttpTransport, ImageClient, RetryPolicy, TextClient, Transport};
pub use models::{
    AspectRatio, GeneratedImage, GenerationOptions, ImageFormat, Platform, SourceImage,
    SubjectType,
};
pub use prompt::compose;
pub use session::{Activity, Session};
