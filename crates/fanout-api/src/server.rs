//! Interface server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::InterfaceError;
use crate::http::routes::create_router;
use crate::state::AppState;

/// Interface server configuration.
#[derive(Debug, Clone)]
pub struct InterfaceConfig {
    pub host: String,
    pub port: u16,
}

impl InterfaceConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

/// The interface server.
pub struct InterfaceServer {
    config: InterfaceConfig,
    state: Arc<AppState>,
}

impl InterfaceServer {
    pub fn new(config: InterfaceConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    async fn bind(&self) -> Result<TcpListener, InterfaceError> {
        let addr = self.addr();
        let socket: SocketAddr = addr.parse().map_err(|e: std::net::AddrParseError| {
            InterfaceError::InvalidAddress {
                addr: addr.clone(),
                message: e.to_string(),
            }
        })?;
        TcpListener::bind(socket)
            .await
            .map_err(|source| InterfaceError::Bind { addr, source })
    }

    /// Start the server.
    pub async fn run(&self) -> Result<(), InterfaceError> {
        self.run_until(std::future::pending()).await
    }

    /// Start the server and stop gracefully once `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), InterfaceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        let app = create_router(self.state.clone());

        info!("Interface server listening on {}", self.addr());
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(InterfaceError::Serve)
    }
}
