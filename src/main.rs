//! Hypertension Risk Service - Main Entry Point
//!
//! Loads the model artifacts once and serves predictions over HTTP.

use anyhow::Result;
use hypertension_risk::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, PredictionMetrics},
    models::ModelLoader,
    predictor::Predictor,
    preprocessor::Preprocessor,
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;
    info!("Starting Hypertension Risk Service");
    info!(
        threshold = config.detection.threshold,
        impute_with_mode = config.preprocessing.impute_with_mode,
        cap_outliers = config.preprocessing.cap_outliers,
        apply_scaler = config.preprocessing.apply_scaler,
        "Configuration loaded"
    );

    // Artifact load failures abort startup
    let loader = ModelLoader::with_threads(config.models.onnx_threads);
    let artifacts = loader.load(&config.models)?;

    let preprocessor = Preprocessor::new(config.preprocessing.options());
    info!(
        "Preprocessor initialized ({} features)",
        preprocessor.feature_count()
    );

    let predictor = Arc::new(Predictor::from_artifacts(
        preprocessor,
        artifacts,
        config.preprocessing.apply_scaler,
        config.detection.threshold,
    ));
    info!(
        model = %predictor.model_name(),
        scaler_loaded = predictor.scaler_loaded(),
        scaling = predictor.scales_features(),
        "Predictor ready"
    );

    let metrics = Arc::new(PredictionMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = Arc::new(AppState::new(predictor, metrics.clone()));
    let app = server::router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("hypertension_risk={},tower_http=info", logging.level)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.compact().init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
