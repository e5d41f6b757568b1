use std::fmt;
use std::time::Duration;

/// Why a candidate stopped before producing a usable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompleteReason {
    Safety,
    Recitation,
    NoImage,
    Unexpected(String),
}

impl IncompleteReason {
    /// Maps a raw completion reason code. Callers must filter out `STOP` first.
    pub fn from_code(code: &str) -> Self {
        match code {
            "SAFETY" => IncompleteReason::Safety,
            "RECITATION" => IncompleteReason::Recitation,
            "NO_IMAGE" => IncompleteReason::NoImage,
            other => IncompleteReason::Unexpected(other.to_string()),
        }
    }
}

impl fmt::Display for IncompleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncompleteReason::Safety => write!(
                f,
                "The image could not be generated because the result would violate the safety policy. Try adjusting your prompt or source image."
            ),
            IncompleteReason::Recitation => write!(
                f,
                "Generation was stopped to avoid repeating protected content. Please modify your prompt."
            ),
            IncompleteReason::NoImage => write!(
                f,
                "The model could not produce an image for this request. This can happen with very specific or complex prompts or images. Try a more general prompt or a different source image."
            ),
            IncompleteReason::Unexpected(code) => write!(
                f,
                "Image generation failed for an unexpected reason ({}). Please try again.",
                code
            ),
        }
    }
}

/// Flat classification of [`StudioError`], used by callers that only need
/// to branch on the failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Blocked,
    EmptyResponse,
    IncompleteGeneration,
    NoImageFound,
    Transport,
    Source,
    Session,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("The image service is not configured: {0}")]
    Config(String),

    #[error("Your request was blocked. Reason: {reason}. Please adjust the image or the text.")]
    Blocked { reason: String },

    #[error("No image was generated. The model response was empty, possibly due to content safety filters.")]
    EmptyResponse,

    #[error("{0}")]
    Incomplete(IncompleteReason),

    #[error("No image was found in the API response. The response may have been blocked by safety policies.")]
    NoImageFound,

    #[error("Request error: {0}")]
    Request(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response error: {0}")]
    Response(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not read the image file: {0}")]
    Read(String),

    #[error("Could not load the image from the URL: {0}")]
    Fetch(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to decode image data: {0}")]
    Decode(String),

    #[error("Please provide a source image.")]
    MissingSourceImage,

    #[error("Another action is still running: {0}")]
    Busy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StudioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StudioError::Config(_) => ErrorKind::Configuration,
            StudioError::Blocked { .. } => ErrorKind::Blocked,
            StudioError::EmptyResponse => ErrorKind::EmptyResponse,
            StudioError::Incomplete(_) => ErrorKind::IncompleteGeneration,
            StudioError::NoImageFound => ErrorKind::NoImageFound,
            StudioError::Request(_)
            | StudioError::Api { .. }
            | StudioError::Response(_)
            | StudioError::Timeout(_) => ErrorKind::Transport,
            StudioError::Read(_)
            | StudioError::Fetch(_)
            | StudioError::InvalidUrl(_)
            | StudioError::Decode(_) => ErrorKind::Source,
            StudioError::MissingSourceImage | StudioError::Busy(_) => ErrorKind::Session,
            StudioError::Io(_) | StudioError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Transient transport failures only. A classified model response is a
    /// final answer and is never worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            StudioError::Request(_) | StudioError::Timeout(_) => true,
            StudioError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
