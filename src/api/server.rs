//! HTTP server implementation

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::RagService;
use crate::Result;

/// Interval of the idle-session sweep
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Full application: `/api` routes plus tracing, compression and optional CORS
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(config: &AppConfig) -> Result<()> {
    info!("Starting Wooverzicht API server...");

    let rag = Arc::new(RagService::new(config)?);
    let sweeper = rag.sessions().spawn_cleanup(SESSION_SWEEP_INTERVAL);

    let app = build_router(AppState::new(rag), config.server.enable_cors);
    if config.server.enable_cors {
        info!("CORS enabled");
    }

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET    /api/health                - Health check");
    info!("  POST   /api/query/stream          - Streamed, cited answer (SSE)");
    info!("  POST   /api/query/documents       - Matching passages and documents");
    info!("  DELETE /api/session/:session_id   - Clear conversation history");

    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served?;

    Ok(())
}
