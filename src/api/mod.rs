mod error;
mod handlers;
mod models;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

#[allow(unused_imports)]
pub use error::ApiError;
#[allow(unused_imports)]
pub use handlers::{
    liveness, not_found, write_single_story, write_story_form, write_story_json,
};
#[allow(unused_imports)]
pub use models::{
    ErrorDetail, ErrorResponse, LivenessResponse, SingleStoryResponse, StoryRequest,
    StoryResponse,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/test", get(liveness))
        .route("/write_story", post(write_single_story))
        .route("/v1/write_story", post(write_story_form))
        .route("/v2/write_story", post(write_story_json))
        .fallback(not_found)
        .with_state(state)
}
