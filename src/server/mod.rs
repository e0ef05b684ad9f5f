//! HTTP surface
//!
//! Routes:
//! - `GET /sse` - session event stream
//! - `POST /message` - JSON-RPC
//! - `GET|POST /authorize` - consent
//! - `POST /token` - grant exchange
//! - `GET /.well-known/oauth-authorization-server`,
//!   `/.well-known/oauth-protected-resource`, `/.well-known/mcp.json`
//! - `GET /health`, `/status`, `/`

pub mod handlers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::discovery::{
    AUTHORIZATION_SERVER_PATH, MCP_MANIFEST_PATH, PROTECTED_RESOURCE_PATH,
};
use crate::auth::{CredentialStore, Exchanger, InMemoryStore, Issuer};
use crate::config::Config;
use crate::error::{AdaMcpError, Result};
use crate::mcp::types::Implementation;
use crate::mcp::{Dispatcher, SessionManager};
use crate::tools::ToolRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CredentialStore>,
    pub registry: Arc<ToolRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: SessionManager,
    pub issuer: Arc<Issuer>,
    pub exchanger: Arc<Exchanger>,
    /// Cancelled on shutdown; every SSE session holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds state around a fresh [`InMemoryStore`] and the default tools.
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn CredentialStore> = Arc::new(InMemoryStore::from_config(&config.auth));
        Self::with_parts(config, store, ToolRegistry::with_default_tools())
    }

    /// Builds state around an existing store and registry.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn CredentialStore>,
        registry: ToolRegistry,
    ) -> Self {
        let identity = Implementation {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
        };
        let registry = Arc::new(registry);

        let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&store), identity.clone());
        let sessions = SessionManager::new(
            Arc::clone(&store),
            identity,
            config.server.public_scheme.clone(),
            Duration::from_secs(config.session.keepalive_seconds),
        );
        let issuer = Issuer::new(
            Arc::clone(&store),
            config.auth.shared_secrets.clone(),
            config.auth.default_scope.clone(),
        );
        let exchanger = Exchanger::new(
            Arc::clone(&store),
            config.auth.default_scope.clone(),
            config.auth.enforce_pkce,
        );

        Self {
            config: Arc::new(config),
            store,
            registry,
            dispatcher: Arc::new(dispatcher),
            sessions,
            issuer: Arc::new(issuer),
            exchanger: Arc::new(exchanger),
            shutdown: CancellationToken::new(),
        }
    }
}

/// Builds the router with request logging.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/sse", get(handlers::sse))
        .route("/message", post(handlers::message))
        .route(
            "/authorize",
            get(handlers::authorize_prompt).post(handlers::authorize_decide),
        )
        .route("/token", post(handlers::token))
        .route(AUTHORIZATION_SERVER_PATH, get(handlers::authorization_server_metadata))
        .route(PROTECTED_RESOURCE_PATH, get(handlers::protected_resource_metadata))
        .route(MCP_MANIFEST_PATH, get(handlers::mcp_manifest))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Handled request"
    );
    response
}

/// Periodically drops expired codes and tokens until `shutdown` fires.
pub fn spawn_purge_task(
    store: Arc<dyn CredentialStore>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let stats = store.purge_expired().await;
                    if stats.codes + stats.tokens > 0 {
                        tracing::debug!(codes = stats.codes, tokens = stats.tokens, "Purged expired credentials");
                    }
                }
            }
        }
    })
}

/// Runs the server until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns error if the listener cannot be bound or the server fails.
pub async fn serve(config: Config) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let purge_every = Duration::from_secs(config.auth.purge_interval_seconds);

    let state = AppState::new(config);
    let shutdown = state.shutdown.clone();
    let purge = spawn_purge_task(Arc::clone(&state.store), purge_every, shutdown.clone());

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| AdaMcpError::Server(format!("Failed to bind {}:{}: {}", host, port, e)))?;

    tracing::info!(
        host = %host,
        port,
        tools = state.registry.len(),
        "Listening"
    );

    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .map_err(|e| AdaMcpError::Server(e.to_string()))?;

    shutdown.cancel();
    if let Err(e) = purge.await {
        tracing::warn!("Purge task ended abnormally: {}", e);
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Waits for a termination signal, then cancels `shutdown` so open SSE
/// sessions end and the graceful drain can complete.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_sweeps_and_stops() {
        let store = Arc::new(InMemoryStore::new(Duration::ZERO, Duration::ZERO));
        store.issue_token("c", "mcp").await;
        let shutdown = CancellationToken::new();

        let handle = spawn_purge_task(store.clone(), Duration::from_secs(300), shutdown.clone());
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(store.token_count().await, 0);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_state_uses_configured_secrets() {
        let mut config = Config::default();
        config.auth.shared_secrets = vec!["x".to_string()];
        let state = AppState::new(config);
        assert_eq!(state.registry.len(), 3);
        assert!(!state.shutdown.is_cancelled());
    }
}
