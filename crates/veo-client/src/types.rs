//! Veo REST wire types.

use serde::{Deserialize, Serialize};
use veo_models::{AspectRatio, Resolution};

use crate::generator::{GeneratedVideo, OperationState};

/// Message recorded when an operation finishes without a usable video.
pub const NO_VIDEO_MESSAGE: &str = "Failed to generate video - no result returned";

/// `predictLongRunning` request body.
#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct Instance {
    pub prompt: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

/// Aspect ratios Veo renders natively. Others are described in the prompt.
pub fn native_aspect_ratio(aspect: AspectRatio) -> Option<&'static str> {
    match aspect {
        AspectRatio::Landscape | AspectRatio::Portrait => Some(aspect.as_str()),
        _ => None,
    }
}

/// Resolutions Veo renders natively. Others are described in the prompt.
pub fn native_resolution(resolution: Resolution) -> Option<&'static str> {
    match resolution {
        Resolution::Hd | Resolution::FullHd => Some(resolution.as_str()),
        _ => None,
    }
}

/// Long-running operation resource.
#[derive(Debug, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    /// Reasons given when safety filters dropped the output.
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl Operation {
    /// Interpret the operation resource.
    pub fn into_state(self) -> OperationState {
        if !self.done {
            return OperationState::Pending;
        }
        if let Some(error) = self.error {
            return OperationState::Failed(error.message);
        }

        let Some(response) = self.response.and_then(|r| r.generate_video_response) else {
            return OperationState::Failed(NO_VIDEO_MESSAGE.to_string());
        };

        let video = response
            .generated_samples
            .into_iter()
            .filter_map(|s| s.video)
            .find_map(|v| {
                v.uri.map(|uri| GeneratedVideo {
                    uri,
                    mime_type: v.mime_type,
                    thumbnail_uri: None,
                })
            });

        match video {
            Some(video) => OperationState::Done(video),
            None if !response.rai_media_filtered_reasons.is_empty() => {
                OperationState::Failed(response.rai_media_filtered_reasons.join("; "))
            }
            None => OperationState::Failed(NO_VIDEO_MESSAGE.to_string()),
        }
    }
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
