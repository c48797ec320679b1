//! Follow-up API server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::api::router::followup_router;
use crate::followup::FollowUpEngine;

/// Address a running server is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSession {
    pub server_addr: String,
    pub port: u16,
}

/// Handle to a running follow-up API server.
pub struct FollowUpServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl FollowUpServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Follow-up API server shutdown signal sent");
        }
    }

    /// Wait for the background task to finish. Call after `shutdown`.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Follow-up API server task failed: {e}");
            }
        }
    }
}

/// Start the follow-up API server on `addr`. Port 0 picks an ephemeral port.
pub async fn start_followup_server(
    engine: Arc<FollowUpEngine>,
    addr: SocketAddr,
) -> Result<FollowUpServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind follow-up API server: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%addr, "Follow-up API server binding");

    let app = followup_router(engine);

    let session = ServerSession {
        server_addr: addr.to_string(),
        port: addr.port(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Follow-up API server received shutdown signal");
        };

        tracing::info!(%addr, "Follow-up API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Follow-up API server error: {e}");
        }

        tracing::info!("Follow-up API server stopped");
    });

    Ok(FollowUpServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
