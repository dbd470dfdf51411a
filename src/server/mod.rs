pub mod handlers;
pub mod types;

use crate::{Result, config::Config};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{get, post},
};
use handlers::AppState;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Permissive CORS for the browser front-end. OPTIONS requests are answered
/// here with an empty 200 and never reach a handler.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let predict = get(handlers::health).post(handlers::predict);
    let advice = post(handlers::advice);

    Router::new()
        .route("/predict", predict.clone())
        .route("/advice", advice.clone())
        // Paths the browser front-end calls
        .route("/api/predict", predict)
        .route("/api/groq", advice)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let app_state = AppState::from_config(&config)?;
    info!(
        "Forwarding predictions to {}, advice via {} ({})",
        app_state.classifier.base_url(),
        config.llm.provider,
        config.llm.model
    );

    let app = router(app_state, config.server.max_body_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
