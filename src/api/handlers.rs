use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use tracing::{error, info};

use crate::completion::CompletionError;
use crate::story::{self, StoryOutcome};
use crate::AppState;

use super::error::ApiError;
use super::models::{
    ErrorResponse, LivenessResponse, SingleStoryResponse, StoryRequest, StoryResponse,
};

const STORY_FAILED: &str = "Failed to generate story.";
const FUNNY_STORY_FAILED: &str = "Failed to generate funny story.";

/// `POST /v1/write_story`, form-encoded.
pub async fn write_story_form(
    State(state): State<AppState>,
    payload: Result<Form<StoryRequest>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(payload) = payload?;
    write_story(&state, payload).await
}

/// `POST /v2/write_story`, JSON.
pub async fn write_story_json(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    write_story(&state, payload).await
}

/// `POST /write_story`: a single generation without the funny rewrite.
pub async fn write_single_story(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let topic = validated_topic(&payload)?;
    info!(topic, style = ?payload.style, "writing single story");

    let story = story::write_single_story(
        state.completion.as_ref(),
        &state.retry,
        topic,
        payload.style,
    )
    .await
    .map_err(upstream_failure)?;

    Ok(match story {
        Some(story) => Json(SingleStoryResponse { story }).into_response(),
        None => soft_failure(STORY_FAILED),
    })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "Story service is working fine.",
    })
}

pub async fn not_found() -> Response {
    ApiError::new(StatusCode::NOT_FOUND, "Not Found").into_response()
}

async fn write_story(state: &AppState, payload: StoryRequest) -> Result<Response, ApiError> {
    let topic = validated_topic(&payload)?;
    info!(topic, style = ?payload.style, "writing story");

    let outcome = story::write_story(
        state.completion.as_ref(),
        &state.retry,
        topic,
        payload.style,
    )
    .await
    .map_err(upstream_failure)?;

    Ok(match outcome {
        StoryOutcome::Written {
            original_story,
            funny_story,
        } => Json(StoryResponse {
            topic: topic.to_string(),
            style: payload.style,
            original_story,
            funny_story,
        })
        .into_response(),
        StoryOutcome::EmptyStory => soft_failure(STORY_FAILED),
        StoryOutcome::EmptyRewrite => soft_failure(FUNNY_STORY_FAILED),
    })
}

/// Rejects blank topics; the topic itself is used exactly as sent.
fn validated_topic(payload: &StoryRequest) -> Result<&str, ApiError> {
    if payload.topic.trim().is_empty() {
        return Err(ApiError::unprocessable("topic must not be empty"));
    }
    Ok(&payload.topic)
}

fn soft_failure(message: &str) -> Response {
    Json(ErrorResponse {
        error: message.to_string(),
    })
    .into_response()
}

fn upstream_failure(err: CompletionError) -> ApiError {
    error!(error = %err, "story generation failed");
    ApiError::from(err)
}
