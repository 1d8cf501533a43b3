//! Test server harness.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use riskline::gateway::{HandlerState, create_router_with_state};
use riskline::service::RiskService;
use riskline::store::InMemoryPredictionStore;

use super::fixtures::demo_service;

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: InMemoryPredictionStore,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Serves the demo model on an ephemeral port.
pub async fn spawn_test_server() -> std::io::Result<TestServer> {
    spawn_with_service(Arc::new(demo_service())).await
}

pub async fn spawn_with_service(service: Arc<RiskService>) -> std::io::Result<TestServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let store = InMemoryPredictionStore::new();
    let app = create_router_with_state(HandlerState::new(service, store.clone()));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    Ok(TestServer {
        addr,
        store,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
    })
}
