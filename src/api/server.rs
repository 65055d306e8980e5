//! HTTP server lifecycle: bind, serve, shut down on Ctrl-C.

use std::net::SocketAddr;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Serve the API on `addr` until the process receives Ctrl-C.
pub async fn serve(addr: SocketAddr, ctx: ApiContext) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "API server started");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
            return;
        }
        tracing::info!("API server received shutdown signal");
    };

    axum::serve(listener, api_router(ctx))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
