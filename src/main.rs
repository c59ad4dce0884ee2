use std::sync::Arc;

use anyhow::Context;
use image_analyzer::{
    server::{router, AppState, ServerOptions},
    Analyzer, Config, GeminiCaptioner, VisionLabelDetector,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; descriptions will fall back to the error text");
    }
    if config.vision_api_key.is_empty() {
        tracing::warn!("VISION_API_KEY is not set; label detection requests will fail");
    }

    // One HTTP client for the process, shared by both adapters.
    let client = reqwest::Client::new();
    let detector = Arc::new(VisionLabelDetector::new(
        client.clone(),
        &config.vision_api_url,
        &config.vision_api_key,
    ));
    let captioner = Arc::new(GeminiCaptioner::new(
        client,
        &config.gemini_api_url,
        &config.gemini_api_key,
    ));

    let analyzer = Analyzer::new(detector, captioner);
    let app = router(AppState::new(analyzer), ServerOptions::from(&config));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("🚀 Image analyzer listening on http://{}", config.bind_addr);
    tracing::info!("📸 POST a base64 image to /analyze or open / in a browser");

    axum::serve(listener, app).await?;

    Ok(())
}
