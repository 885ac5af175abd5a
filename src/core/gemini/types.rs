//! Campaign domain types.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::error::{GeminiError, Result};

// ============================================================================
// Request Types
// ============================================================================

/// Voice of the generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Professional,
    Exciting,
    Friendly,
    Urgent,
    Witty,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Professional,
        Tone::Exciting,
        Tone::Friendly,
        Tone::Urgent,
        Tone::Witty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Exciting => "Exciting",
            Tone::Friendly => "Friendly",
            Tone::Urgent => "Urgent",
            Tone::Witty => "Witty",
        }
    }

    pub fn next(self) -> Tone {
        let idx = Tone::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Tone::ALL[(idx + 1) % Tone::ALL.len()]
    }

    pub fn prev(self) -> Tone {
        let idx = Tone::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Tone::ALL[(idx + Tone::ALL.len() - 1) % Tone::ALL.len()]
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolution tier for generated visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::OneK, ImageSize::TwoK, ImageSize::FourK];

    /// Wire label as the API expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }

    pub fn next(self) -> ImageSize {
        let idx = ImageSize::ALL.iter().position(|&s| s == self).unwrap_or(0);
        ImageSize::ALL[(idx + 1) % ImageSize::ALL.len()]
    }

    pub fn prev(self) -> ImageSize {
        let idx = ImageSize::ALL.iter().position(|&s| s == self).unwrap_or(0);
        ImageSize::ALL[(idx + ImageSize::ALL.len() - 1) % ImageSize::ALL.len()]
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One campaign generation attempt, immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignRequest {
    pub topic: String,
    pub audience: String,
    pub tone: Tone,
    pub image_size: ImageSize,
}

impl CampaignRequest {
    pub fn new(topic: impl Into<String>, audience: impl Into<String>, tone: Tone) -> Self {
        Self {
            topic: topic.into(),
            audience: audience.into(),
            tone,
            image_size: ImageSize::OneK,
        }
    }

    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    /// A request is submittable only with a non-empty topic.
    pub fn has_topic(&self) -> bool {
        !self.topic.trim().is_empty()
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Structured campaign copy returned by the text model.
///
/// All three fields are required; a payload missing any of them is rejected
/// as malformed at the client boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignCopy {
    /// Catchy subject lines, three expected.
    pub subject_lines: Vec<String>,
    /// Email body in Markdown.
    pub body_copy: String,
    /// Visual description for the image model.
    pub image_prompt: String,
}

impl CampaignCopy {
    pub fn has_image_prompt(&self) -> bool {
        !self.image_prompt.trim().is_empty()
    }
}

/// A generated marketing visual, keyed to the copy's image prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes as delivered inline by the API.
    pub data: String,
    pub size: ImageSize,
}

impl GeneratedImage {
    /// Decode the inline payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| GeminiError::malformed(format!("invalid base64 image payload: {e}")))
    }
}
