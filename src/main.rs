use dotenvy::dotenv;
use story_service::{build_app, config::AppConfig, run_server, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let config = AppConfig::from_env();
    if !config.completion.has_api_key() {
        warn!("OPENAI_API_KEY is not set; story requests will fail until it is");
    }
    info!(
        model = config.completion.model(),
        max_attempts = config.retry.max_attempts(),
        "starting story service"
    );

    let app = build_app(AppState::from_config(&config));
    run_server(app, &config.host, config.port).await?;

    Ok(())
}
