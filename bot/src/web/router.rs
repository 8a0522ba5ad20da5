use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Body returned for every request.
pub const ALIVE: &str = "alive";

async fn alive() -> &'static str {
    ALIVE
}

/// Build the liveness router: any method on any path answers `200 alive`.
/// Uptime monitors poll it to keep the process marked healthy.
pub fn build_router() -> Router {
    Router::new()
        .fallback(alive)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve the liveness router until the process exits.
pub async fn serve(addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "liveness responder listening");
    axum::serve(listener, build_router()).await
}
