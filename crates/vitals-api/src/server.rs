//! HTTP server lifecycle.

use crate::config::HttpConfig;
use crate::context::ApiContext;
use crate::error::ApiResult;
use crate::routes::create_router;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the API server until the token is cancelled, then stop accepting
/// and finish in-flight requests. The caller enforces the hard grace
/// deadline.
pub async fn run_server(
    ctx: ApiContext,
    config: HttpConfig,
    shutdown: CancellationToken,
) -> ApiResult<()> {
    let app = create_router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(port = config.port, "Starting API server");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("API server stopped");
    Ok(())
}
