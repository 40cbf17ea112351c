//! Server setup and routing.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::DefaultMakeSpan;
use tower_http::trace::DefaultOnRequest;
use tower_http::trace::DefaultOnResponse;
use tower_http::trace::TraceLayer;
use tower_http::LatencyUnit;
use tracing::Level;

use super::api::AppState;
use super::processing::HttpProcessingService;
use super::processing::NoopProcessingService;
use super::processing::ProcessingService;
use super::repository::InMemoryRosbagRepository;
use crate::config::ServerConfig;
use crate::store::LocalBucket;

/// Create the application router.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .nest("/api", super::api::create_router(state))
        .layer(cors)
        .layer(trace)
}

/// Builds the state described by `config`.
///
/// # Errors
///
/// Returns an error if the bucket directory cannot be created.
pub async fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let bucket = LocalBucket::open(&config.bucket, &config.bucket_dir, config.list_page_size)
        .await
        .with_context(|| format!("failed to open bucket `{}`", config.bucket))?;

    let processing: Arc<dyn ProcessingService> = match &config.processing_service_url {
        Some(url) => Arc::new(HttpProcessingService::new(url.clone())),
        None => {
            tracing::warn!("PROCESSING_SERVICE_URL is not set; processing requests are only recorded");
            Arc::new(NoopProcessingService)
        }
    };

    Ok(AppState {
        repository: Arc::new(InMemoryRosbagRepository::new()),
        bucket: Arc::new(bucket),
        processing,
        accepted_extensions: config.accepted_extensions.clone(),
        max_upload_size: config.max_upload_size,
    })
}

/// Builds a CORS layer allowing every configured origin. `*` allows any.
///
/// # Errors
///
/// Returns an error if an origin is not a valid header value.
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::new());
    }
    if allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new().allow_origin(AllowOrigin::any()));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: `{}`", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new().allow_origin(AllowOrigin::list(origins)))
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the address.
pub async fn run(server_config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&server_config).await?;

    let cors = cors_layer(&server_config.allowed_origins)?;
    let app = create_router(state, cors);

    let addr = server_config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to `{}`", addr))?;

    tracing::info!(
        bucket = %server_config.bucket,
        dir = %server_config.bucket_dir.display(),
        "server listening on {}",
        addr
    );
    axum::serve(listener, app).await?;

    Ok(())
}
