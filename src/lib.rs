pub mod api;
pub mod completion;
pub mod config;
pub mod retry;
pub mod story;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::completion::{Completion, OpenAiCompletion};
use crate::config::AppConfig;
use crate::retry::RetryPolicy;

#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn Completion>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(completion: Arc<dyn Completion>, retry: RetryPolicy) -> Self {
        Self { completion, retry }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(OpenAiCompletion::new(config.completion.clone())),
            config.retry,
        )
    }
}

pub fn build_app(state: AppState) -> Router {
    api::router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

pub async fn run_server(app: Router, host: &str, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
