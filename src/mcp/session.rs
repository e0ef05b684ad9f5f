//! SSE session lifecycle for `GET /sse`
//!
//! A session stream always starts with `endpoint`. If a bearer credential
//! was presented and does not resolve to a live token, a single `error`
//! event follows and the stream ends. Otherwise `connected` follows and a
//! `ping` is emitted every keep-alive interval until the cancellation
//! token fires or the client goes away (the stream is dropped).

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use axum::response::sse::Event;
use futures::Stream;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::store::CredentialStore;
use crate::mcp::types::Implementation;
use crate::mcp::unix_timestamp;

/// An event pushed on a session stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Where to POST JSON-RPC messages.
    Endpoint { url: String },
    /// The stream is authorized and live.
    Connected {
        server: String,
        version: String,
        session: String,
        ts: f64,
    },
    /// Authorization failed; terminal.
    Error { error: String, description: String },
    /// Keep-alive.
    Ping { ts: f64 },
}

impl ServerEvent {
    /// The SSE `event:` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Endpoint { .. } => "endpoint",
            Self::Connected { .. } => "connected",
            Self::Error { .. } => "error",
            Self::Ping { .. } => "ping",
        }
    }

    /// The SSE `data:` payload. Plain text for `endpoint`, JSON otherwise.
    pub fn data(&self) -> String {
        match self {
            Self::Endpoint { url } => url.clone(),
            Self::Connected {
                server,
                version,
                session,
                ts,
            } => json!({
                "server": server,
                "version": version,
                "session": session,
                "ts": ts,
            })
            .to_string(),
            Self::Error { error, description } => json!({
                "error": error,
                "error_description": description,
            })
            .to_string(),
            Self::Ping { ts } => json!({ "ts": ts }).to_string(),
        }
    }

    /// Renders the event in `text/event-stream` framing.
    ///
    /// # Examples
    ///
    /// ```
    /// use ada_mcp::mcp::ServerEvent;
    ///
    /// let event = ServerEvent::Endpoint { url: "https://h/message".to_string() };
    /// assert_eq!(event.to_wire(), "event: endpoint\ndata: https://h/message\n\n");
    /// ```
    pub fn to_wire(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.data())
    }
}

impl From<ServerEvent> for Event {
    fn from(event: ServerEvent) -> Self {
        Event::default().event(event.name()).data(event.data())
    }
}

/// Per-connection inputs taken from the HTTP request.
#[derive(Debug, Clone, Default)]
pub struct ConnectionContext {
    /// Value of the `Host` header.
    pub host: Option<String>,
}

impl ConnectionContext {
    /// The host clients should use to reach this server.
    pub fn public_host(&self) -> &str {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost")
    }
}

/// Opens session streams.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    identity: Implementation,
    public_scheme: String,
    keepalive: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        identity: Implementation,
        public_scheme: String,
        keepalive: Duration,
    ) -> Self {
        Self {
            store,
            identity,
            public_scheme,
            keepalive,
        }
    }

    /// The URL announced in the `endpoint` event.
    pub fn endpoint_url(&self, ctx: &ConnectionContext) -> String {
        format!("{}://{}/message", self.public_scheme, ctx.public_host())
    }

    /// Opens a session stream.
    ///
    /// `credential` is the presented bearer value; `None` means no
    /// `Authorization` header was sent.
    pub fn open(
        &self,
        ctx: ConnectionContext,
        credential: Option<String>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = ServerEvent> + Send + 'static {
        let url = self.endpoint_url(&ctx);
        let store = Arc::clone(&self.store);
        let identity = self.identity.clone();
        let keepalive = self.keepalive;

        stream! {
            yield ServerEvent::Endpoint { url };

            if let Some(token) = credential {
                if let Err(e) = store.lookup_token(&token).await.into_result() {
                    tracing::info!(reason = %e.description(), "Rejected SSE session");
                    yield ServerEvent::Error {
                        error: e.error_code().to_string(),
                        description: e.description().to_string(),
                    };
                    return;
                }
            }

            let session = Uuid::new_v4().to_string();
            tracing::info!(session = %session, "SSE session connected");
            yield ServerEvent::Connected {
                server: identity.name,
                version: identity.version,
                session: session.clone(),
                ts: unix_timestamp(),
            };

            loop {
                let cancelled = tokio::select! {
                    _ = cancel.cancelled() => true,
                    _ = tokio::time::sleep(keepalive) => false,
                };
                if cancelled {
                    tracing::info!(session = %session, "SSE session closed");
                    break;
                }
                yield ServerEvent::Ping { ts: unix_timestamp() };
            }
        }
    }
}
