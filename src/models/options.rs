use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_REQUESTED_COUNT: u8 = 1;
pub const MAX_REQUESTED_COUNT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Platform {
    #[default]
    MercadoLivre,
    Facebook,
    Instagram,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::MercadoLivre,
        Platform::Facebook,
        Platform::Instagram,
        Platform::TikTok,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::MercadoLivre => "Mercado Livre",
            Platform::Facebook => "Facebook Marketplace",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
        }
    }

    /// Aspect ratio a platform switches to when it is selected.
    pub fn default_aspect_ratio(&self) -> AspectRatio {
        match self {
            Platform::TikTok => AspectRatio::Tall,
            Platform::MercadoLivre | Platform::Facebook | Platform::Instagram => {
                AspectRatio::Square
            }
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectType {
    #[default]
    Object,
    PersonWithProduct,
}

impl SubjectType {
    pub const ALL: [SubjectType; 2] = [SubjectType::Object, SubjectType::PersonWithProduct];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "4:3")]
    Standard4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Wide,
        AspectRatio::Tall,
        AspectRatio::Standard4x3,
        AspectRatio::Portrait3x4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
            AspectRatio::Standard4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .iter()
            .copied()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio: {}", s))
    }
}

/// Everything the user picked for one generation request.
///
/// Treated as an immutable value: every change produces a new
/// `GenerationOptions` through one of the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub platform: Platform,
    pub subject_type: SubjectType,
    pub aspect_ratio: AspectRatio,
    pub custom_instruction: String,
    pub requested_count: u8,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            platform: Platform::default(),
            subject_type: SubjectType::default(),
            aspect_ratio: Platform::default().default_aspect_ratio(),
            custom_instruction: String::new(),
            requested_count: MIN_REQUESTED_COUNT,
        }
    }
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting a platform also resets the aspect ratio to that
    /// platform's default.
    pub fn with_platform(self, platform: Platform) -> Self {
        Self {
            platform,
            aspect_ratio: platform.default_aspect_ratio(),
            ..self
        }
    }

    pub fn with_subject_type(self, subject_type: SubjectType) -> Self {
        Self {
            subject_type,
            ..self
        }
    }

    pub fn with_aspect_ratio(self, aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio,
            ..self
        }
    }

    pub fn with_custom_instruction(self, custom_instruction: impl Into<String>) -> Self {
        Self {
            custom_instruction: custom_instruction.into(),
            ..self
        }
    }

    pub fn with_requested_count(self, requested_count: u8) -> Self {
        Self {
            requested_count: requested_count.clamp(MIN_REQUESTED_COUNT, MAX_REQUESTED_COUNT),
            ..self
        }
    }

    /// Clamped view of `requested_count`, for values that arrived through
    /// deserialization rather than the builder.
    pub fn batch_size(&self) -> usize {
        self.requested_count
            .clamp(MIN_REQUESTED_COUNT, MAX_REQUESTED_COUNT) as usize
    }
}
