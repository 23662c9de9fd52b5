//! HTTP server lifecycle: bind → spawn background task → return handle
//! with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: tokio::task::JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// Bind the given address and serve the API in a background task.
pub async fn start_server(core: Arc<CoreState>, bind: SocketAddr) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| format!("Failed to bind {bind}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }
        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        join,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_serve_and_stop() {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState {
            data_dir: tmp.path().to_path_buf(),
        };
        core.ensure_dirs().unwrap();

        let server = start_server(
            Arc::new(core),
            "127.0.0.1:0".parse().unwrap(),
        )
        .await
        .unwrap();
        assert!(server.addr.port() > 0);

        let url = format!("http://{}/api/health", server.addr);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "ok");

        server.shutdown().await;
    }
}
