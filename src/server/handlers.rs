//! Request handlers

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        Html, IntoResponse, Response,
    },
    Form, Json,
};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};

use crate::auth::consent;
use crate::auth::discovery::{
    public_base, AuthorizationServerMetadata, McpManifest, ProtectedResourceMetadata,
};
use crate::auth::{AuthorizeParams, ConsentForm, ConsentOutcome, TokenRequest};
use crate::error::OAuthError;
use crate::mcp::types::{INVALID_REQUEST, PARSE_ERROR};
use crate::mcp::{unix_timestamp, ConnectionContext, Dispatch};
use crate::server::AppState;

fn host_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Extracts the presented credential. A header that is present but not a
/// usable bearer value still counts as a (failing) credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?;
    let value = raw.to_str().unwrap_or("").trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => "",
    };
    Some(token.to_string())
}

fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    let ctx = ConnectionContext {
        host: host_header(headers),
    };
    public_base(&state.config.server.public_scheme, ctx.public_host())
}

fn oauth_error(error: &OAuthError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(header::CACHE_CONTROL, "no-store")],
        Json(error.to_body()),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// MCP
// ---------------------------------------------------------------------------

/// `GET /sse`
pub async fn sse(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (
    [(&'static str, &'static str); 2],
    Sse<impl Stream<Item = Result<Event, Infallible>>>,
) {
    let ctx = ConnectionContext {
        host: host_header(&headers),
    };
    let cancel = state.shutdown.child_token();
    let events = state
        .sessions
        .open(ctx, bearer_token(&headers), cancel)
        .map(|event| Ok::<_, Infallible>(Event::from(event)));

    (
        [("cache-control", "no-cache"), ("x-accel-buffering", "no")],
        Sse::new(events),
    )
}

/// `POST /message`
pub async fn message(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let credential = bearer_token(&headers);
    match state.dispatcher.handle(&body, credential.as_deref()).await {
        Dispatch::Acknowledged => StatusCode::NO_CONTENT.into_response(),
        Dispatch::Reply(response) => {
            let malformed = match response.error_code() {
                Some(PARSE_ERROR) => true,
                Some(INVALID_REQUEST) => response.id.is_null(),
                _ => false,
            };
            let status = if malformed {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::OK
            };
            (status, Json(response)).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

fn consent_response(state: &AppState, outcome: ConsentOutcome) -> Response {
    match outcome {
        ConsentOutcome::Prompt { params, error } => Html(consent::render(
            &state.config.server.name,
            &params,
            error.as_deref(),
        ))
        .into_response(),
        ConsentOutcome::Redirect(location) => redirect(&location),
        ConsentOutcome::Rejected(error) => oauth_error(&error),
    }
}

/// 303 to `location`, or `invalid_request` when it cannot be sent as a
/// `Location` header.
fn redirect(location: &str) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!("Rejected redirect_uri that is not a valid Location header");
            oauth_error(&OAuthError::InvalidRequest(
                "redirect_uri is not a valid URI".to_string(),
            ))
        }
    }
}

/// `GET /authorize`
pub async fn authorize_prompt(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let outcome = state.issuer.prompt(params);
    consent_response(&state, outcome)
}

/// `POST /authorize`
pub async fn authorize_decide(
    State(state): State<AppState>,
    Form(form): Form<ConsentForm>,
) -> Response {
    let outcome = state.issuer.decide(form).await;
    consent_response(&state, outcome)
}

/// `POST /token`
pub async fn token(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match TokenRequest::from_form(&body) {
        Ok(request) => request,
        Err(e) => return oauth_error(&e),
    };

    match state.exchanger.exchange(request).await {
        Ok(issued) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
            Json(issued),
        )
            .into_response(),
        Err(e) => {
            tracing::info!(error = e.error_code(), "Token request rejected");
            oauth_error(&e)
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// `GET /.well-known/oauth-authorization-server`
pub async fn authorization_server_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<AuthorizationServerMetadata> {
    let base = base_url(&state, &headers);
    Json(AuthorizationServerMetadata::for_base(
        &base,
        &state.config.auth.scopes_supported,
    ))
}

/// `GET /.well-known/oauth-protected-resource`
pub async fn protected_resource_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ProtectedResourceMetadata> {
    let base = base_url(&state, &headers);
    Json(ProtectedResourceMetadata::for_base(
        &base,
        &state.config.auth.scopes_supported,
    ))
}

/// `GET /.well-known/mcp.json`
pub async fn mcp_manifest(State(state): State<AppState>, headers: HeaderMap) -> Json<McpManifest> {
    let base = base_url(&state, &headers);
    Json(McpManifest::for_base(
        &base,
        &state.config.server.name,
        &state.config.server.version,
        &state.registry.list(),
    ))
}

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": state.config.server.name,
        "version": state.config.server.version,
        "tools": state.registry.len(),
        "ts": unix_timestamp(),
    }))
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.config.server.name,
        "version": state.config.server.version,
        "endpoints": {
            "sse": "/sse",
            "message": "/message",
            "authorize": "/authorize",
            "token": "/token",
            "discovery": "/.well-known/mcp.json",
            "health": "/health",
            "status": "/status",
        },
    }))
}
