//! HTTP server for the booking API
//!
//! Serves the router until shutdown and runs the expired-token sweeper
//! alongside it. Both stop on the same shutdown signal.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::routes::router;
use crate::state::ApiState;

/// Running server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    serve_task: JoinHandle<()>,
}

impl Server {
    /// Bind and start serving
    pub async fn start(bind: SocketAddr, state: ApiState) -> Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Server started");

        let (shutdown_tx, _) = broadcast::channel(1);

        let sweep_every = state.config.bookings.sweep_interval_secs;
        if sweep_every > 0 {
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(sweeper_task(
                state.clone(),
                Duration::from_secs(sweep_every),
                shutdown_rx,
            ));
        }

        let app = router(state);
        let mut shutdown_rx = shutdown_tx.subscribe();
        let serve_task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "Server error");
            }
            info!("Server stopped");
        });

        Ok(Server {
            addr: bound_addr,
            shutdown_tx,
            serve_task,
        })
    }

    /// Get the bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal the server and sweeper to stop
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }

    /// Wait until in-flight requests finish after shutdown
    pub async fn wait(self) {
        if let Err(e) = self.serve_task.await {
            warn!(error = %e, "Server task ended abnormally");
        }
    }
}

/// Periodically delete expired, unused response tokens
async fn sweeper_task(
    state: ApiState,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match state.run_blocking(|m| m.lifecycle().purge_expired_tokens()).await {
                    Ok(purged) => debug!(purged, "Token sweep finished"),
                    Err(e) => warn!(error = %e, "Token sweep failed"),
                }
            }
            _ = shutdown_rx.recv() => {
                debug!("Token sweeper shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handyhub_core::{Config, Database, LogNotifier};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_server_serves_and_shuts_down() {
        let state = ApiState::new(
            Database::open_in_memory().unwrap(),
            Config::default(),
            Arc::new(LogNotifier),
        );
        let server = Server::start(SocketAddr::from(([127, 0, 0, 1], 0)), state)
            .await
            .unwrap();
        assert_ne!(server.addr().port(), 0);

        let mut stream = TcpStream::connect(server.addr()).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.ends_with("ok"));

        server.shutdown();
        tokio::time::timeout(Duration::from_secs(5), server.wait())
            .await
            .unwrap();
    }
}
