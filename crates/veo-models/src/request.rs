//! Video generation request parameters and intake validation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::error::ValidationError;

/// Maximum prompt length in characters.
pub const MAX_PROMPT_LENGTH: usize = 2000;

/// Maximum style description length in characters.
pub const MAX_STYLE_LENGTH: usize = 200;

pub const DEFAULT_DURATION_SECS: u32 = 5;
pub const DEFAULT_FPS: u32 = 30;
pub const MIN_FPS: u32 = 24;
pub const MAX_FPS: u32 = 60;

#[derive(Debug, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "4k")]
    Uhd,
    /// Mobile/vertical content
    #[serde(rename = "540p")]
    MobileHd,
}

impl Resolution {
    pub const ALL: &'static [Resolution] = &[
        Resolution::Hd,
        Resolution::FullHd,
        Resolution::Uhd,
        Resolution::MobileHd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Hd => "720p",
            Resolution::FullHd => "1080p",
            Resolution::Uhd => "4k",
            Resolution::MobileHd => "540p",
        }
    }
}

/// Rendering quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl Quality {
    pub const ALL: &'static [Quality] =
        &[Quality::Low, Quality::Medium, Quality::High, Quality::Ultra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
            Quality::Ultra => "ultra",
        }
    }
}

/// Frame aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    /// Standard landscape
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// Vertical/mobile
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    /// Cinematic widescreen
    #[serde(rename = "21:9")]
    Widescreen,
    /// Classic TV
    #[serde(rename = "4:3")]
    Classic,
    #[serde(rename = "32:9")]
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: &'static [AspectRatio] = &[
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Widescreen,
        AspectRatio::Classic,
        AspectRatio::Ultrawide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Widescreen => "21:9",
            AspectRatio::Classic => "4:3",
            AspectRatio::Ultrawide => "32:9",
        }
    }

    /// Orientation wording used in the enhanced prompt.
    pub fn orientation_hint(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape orientation, horizontal format, wide-screen",
            AspectRatio::Portrait => "portrait orientation, vertical format, mobile-friendly",
            AspectRatio::Square => "square format, social media optimized",
            AspectRatio::Widescreen => "cinematic widescreen, ultra-wide format",
            AspectRatio::Classic => "classic format, traditional aspect ratio",
            AspectRatio::Ultrawide => "ultra-wide panoramic format",
        }
    }
}

/// Container format of the delivered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Webm,
    Mov,
    Avi,
}

impl VideoFormat {
    pub const ALL: &'static [VideoFormat] = &[
        VideoFormat::Mp4,
        VideoFormat::Webm,
        VideoFormat::Mov,
        VideoFormat::Avi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Webm => "webm",
            VideoFormat::Mov => "mov",
            VideoFormat::Avi => "avi",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Webm => "video/webm",
            VideoFormat::Mov => "video/quicktime",
            VideoFormat::Avi => "video/x-msvideo",
        }
    }
}

macro_rules! impl_wire_enum {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

impl_wire_enum!(Resolution, "resolution");
impl_wire_enum!(Quality, "quality");
impl_wire_enum!(AspectRatio, "aspect_ratio");
impl_wire_enum!(VideoFormat, "format");

/// Limits that depend on service configuration.
#[derive(Debug, Clone, Copy)]
pub struct GenerationLimits {
    /// Longest accepted video, in seconds.
    pub max_duration: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self { max_duration: 60 }
    }
}

/// Video generation request as received over HTTP.
///
/// Enumerated fields are kept as strings so a bad value is reported against
/// its field name instead of as an opaque deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
pub struct VideoGenerationRequest {
    /// Text prompt to generate the video from
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Prompt must be between 1 and 2000 characters"
    ))]
    pub prompt: String,
    /// Duration in seconds (default 5)
    #[serde(default)]
    pub duration: Option<i64>,
    /// 720p, 1080p, 4k or 540p (default 720p)
    #[serde(default)]
    pub resolution: Option<String>,
    /// low, medium, high or ultra (default medium)
    #[serde(default)]
    pub quality: Option<String>,
    /// 16:9, 9:16, 1:1, 21:9, 4:3 or 32:9 (default 16:9)
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    /// mp4, webm, mov or avi (default mp4)
    #[serde(default)]
    pub format: Option<String>,
    /// Frames per second, 24-60 (default 30)
    #[serde(default)]
    #[validate(range(min = 24, max = 60, message = "fps must be between 24 and 60"))]
    pub fps: Option<i64>,
    /// Optional style/aesthetic
    #[serde(default)]
    #[validate(length(max = 200, message = "Style must be at most 200 characters"))]
    pub style: Option<String>,
}

impl VideoGenerationRequest {
    /// Request with only a prompt; every other field takes its default.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Validate against declared domains and produce an immutable spec.
    pub fn validate_with(&self, limits: &GenerationLimits) -> Result<VideoSpec, ValidationError> {
        self.validate()
            .map_err(|report| ValidationError::from_report(&report))?;

        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::new("prompt", "Prompt cannot be blank"));
        }

        let duration = self.duration.unwrap_or(i64::from(DEFAULT_DURATION_SECS));
        if duration < 1 || duration > i64::from(limits.max_duration) {
            return Err(ValidationError::new(
                "duration",
                format!(
                    "Duration must be between 1 and {} seconds, got {}",
                    limits.max_duration, duration
                ),
            ));
        }

        let style = self
            .style
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(VideoSpec {
            prompt: prompt.to_string(),
            duration: duration as u32,
            resolution: parse_field("resolution", self.resolution.as_deref())?,
            quality: parse_field("quality", self.quality.as_deref())?,
            aspect_ratio: parse_field("aspect_ratio", self.aspect_ratio.as_deref())?,
            format: parse_field("format", self.format.as_deref())?,
            fps: self.fps.map(|f| f as u32).unwrap_or(DEFAULT_FPS),
            style,
        })
    }
}

fn parse_field<T>(field: &str, raw: Option<&str>) -> Result<T, ValidationError>
where
    T: FromStr<Err = ParseEnumError> + Default,
{
    match raw {
        None => Ok(T::default()),
        Some(value) => value
            .parse()
            .map_err(|e: ParseEnumError| ValidationError::new(field, e.to_string())),
    }
}

/// Validated, immutable generation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSpec {
    pub prompt: String,
    pub duration: u32,
    pub resolution: Resolution,
    pub quality: Quality,
    pub aspect_ratio: AspectRatio,
    pub format: VideoFormat,
    pub fps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}
