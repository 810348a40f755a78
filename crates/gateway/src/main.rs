//! DocChat entry point
//!
//! Runs in one of two modes:
//! - `docchat ask "<question>"` (or `--search "<question>"`): answer once on stdout
//! - `docchat serve` (default): HTTP chat server with a streaming endpoint

mod cli;
mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use cli::Command;
use docchat_common::{
    config::{AppConfig, ObservabilityConfig},
    metrics,
};
use docchat_context::{Generator, OllamaGenerator};
use docchat_search::Corpus;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub corpus: Arc<Corpus>,
    pub generator: Arc<dyn Generator>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let command = cli::parse_args(std::env::args().skip(1))?;

    // Load configuration
    let mut config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;
    if let Command::Serve { port: Some(port) } = command {
        config.server.port = port;
    }

    init_tracing(&config.observability);
    info!("Starting DocChat v{}", docchat_common::VERSION);

    let metrics_handle = if config.observability.metrics_enabled {
        Some(install_metrics()?)
    } else {
        None
    };

    // The corpus is loaded once; any read failure is fatal
    let corpus = Corpus::load(&config.corpus.root).map_err(|e| {
        error!(error = %e, "Failed to load documents");
        e
    })?;
    metrics::record_corpus(corpus.len());
    if corpus.is_empty() {
        warn!(root = %config.corpus.root.display(), "Corpus is empty, every question will go unanswered");
    }

    let generator: Arc<dyn Generator> = Arc::new(OllamaGenerator::new(&config.generation)?);
    info!(
        model = %generator.model_name(),
        endpoint = %config.generation.endpoint(),
        "Generation backend configured"
    );

    match command {
        Command::Ask { question } => {
            let mut stdout = std::io::stdout();
            cli::run_ask(&mut stdout, &question, &corpus, generator.as_ref()).await
        }
        Command::Serve { .. } => {
            let state = AppState {
                config: Arc::new(config),
                corpus: Arc::new(corpus),
                generator,
            };
            serve(state, metrics_handle).await
        }
    }
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // stdout is reserved for answers in ask mode
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_generation_duration_seconds", metrics::METRICS_PREFIX)),
            metrics::GENERATION_BUCKETS,
        )?
        .install_recorder()?;
    metrics::register_metrics();
    Ok(handle)
}

async fn serve(state: AppState, metrics_handle: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let addr = state.config.bind_address();
    let app = create_router(state, metrics_handle);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Chat endpoints
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/answer", post(handlers::chat::answer));

    if let Some(handle) = metrics_handle {
        router = router.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );
    }

    // Router layers wrap outward: the id is set before it is propagated
    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
