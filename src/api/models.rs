use serde::{Deserialize, Serialize};

use crate::story::{deserialize_optional_style, Style};

#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    pub topic: String,
    #[serde(default, deserialize_with = "deserialize_optional_style")]
    pub style: Option<Style>,
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub topic: String,
    pub style: Option<Style>,
    pub original_story: String,
    pub funny_story: String,
}

#[derive(Debug, Serialize)]
pub struct SingleStoryResponse {
    pub story: String,
}

/// Soft failure body, sent with a 200 status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub message: &'static str,
}
