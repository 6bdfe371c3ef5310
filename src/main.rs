// Main entry point for the Sanskrit document translation workflow

use sanskrit_workflow::{
    server::{router, AppState},
    Config, Metrics, TranslationPipeline,
};

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::new().expect("Failed to load configuration"));

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "sanskrit_workflow={},ort=off",
        match config.log_level() {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== SANSKRIT DOCUMENT TRANSLATOR ===");
    info!(
        "Config: lang={} model_dir={} uploads={}",
        config.ocr.language, config.translation.model_dir, config.upload.upload_dir
    );

    // Upload staging directory is scratch space, created if absent
    tokio::fs::create_dir_all(&config.upload.upload_dir).await?;

    // Initialize metrics
    let metrics = Metrics::new();

    // Load the model artifacts once; the pipeline is read-only while serving
    info!("Initializing translation pipeline...");
    let pipeline = Arc::new(TranslationPipeline::from_config(&config, Some(metrics.clone()))?);

    let state = AppState {
        config: config.clone(),
        pipeline,
        metrics,
    };

    let app = router(state);

    let addr = config.server_addr();
    info!("{}", "=".repeat(70));
    info!("Server starting on http://{}", addr);
    info!("{}", "-".repeat(70));
    info!("Endpoints:");
    info!("  GET  /          - Root endpoint");
    info!("  GET  /health    - Health check");
    info!("  GET  /metrics   - Prometheus metrics");
    info!("  GET  /stats     - Detailed statistics");
    info!("  POST /upload    - Translate a document image (multipart/form-data)");
    info!("  POST /translate - Translate raw text (JSON)");
    info!("{}", "=".repeat(70));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
