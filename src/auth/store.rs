//! Authorization code and access token storage
//!
//! [`CredentialStore`] is the only owner of issued codes and tokens. The
//! server holds it as `Arc<dyn CredentialStore>` so the HTTP handlers, the
//! SSE session manager and the dispatcher all share one instance.
//!
//! [`InMemoryStore`] keeps both maps behind a single `tokio::sync::Mutex`;
//! every read and every write happens under that lock, so redeeming a code
//! is atomic with respect to concurrent redemptions of the same code.
//! Nothing survives a process restart.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::AuthConfig;
use crate::error::OAuthError;

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Generates an opaque credential: 32 random bytes, base64url without
/// padding (43 characters).
///
/// # Examples
///
/// ```
/// use ada_mcp::auth::store::generate_secret;
///
/// let secret = generate_secret();
/// assert_eq!(secret.len(), 43);
/// assert_ne!(secret, generate_secret());
/// ```
pub fn generate_secret() -> String {
    use rand::RngCore as _;

    let mut random_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What the consent step grants: everything a code remembers apart from the
/// code itself and its expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGrant {
    /// Client that requested authorization.
    pub client_id: String,
    /// Redirect target the code was delivered to.
    pub redirect_uri: String,
    /// Granted scope (space separated).
    pub scope: String,
    /// PKCE challenge, when the client sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    /// PKCE challenge method (`S256` or `plain`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

/// An issued, not yet redeemed authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The opaque code value.
    pub code: String,
    /// The grant recorded at consent time.
    #[serde(flatten)]
    pub grant: CodeGrant,
    /// Instant after which the code can no longer be redeemed.
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationCode {
    /// Returns `true` once `now` has reached the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The opaque bearer value.
    pub token: String,
    /// Who the token was issued to (a client id or `anonymous`).
    pub subject: String,
    /// Granted scope (space separated).
    pub scope: String,
    /// Instant the token was minted.
    pub issued_at: DateTime<Utc>,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns `true` once `now` has reached the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Granted lifetime in whole seconds, as reported in `expires_in`.
    pub fn lifetime(&self) -> u64 {
        (self.expires_at - self.issued_at).num_seconds().max(0) as u64
    }
}

/// Outcome of looking up a presented bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// The token exists and has not expired.
    Valid(AccessToken),
    /// The token exists but its lifetime is over.
    Expired,
    /// The token was never issued (or was purged).
    Unknown,
}

impl TokenStatus {
    /// Returns `true` for [`TokenStatus::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Maps a failed lookup to the `invalid_token` error the stream and the
    /// dispatcher report.
    pub fn into_result(self) -> std::result::Result<AccessToken, OAuthError> {
        match self {
            Self::Valid(token) => Ok(token),
            Self::Expired => Err(OAuthError::InvalidToken(
                "access token expired".to_string(),
            )),
            Self::Unknown => Err(OAuthError::InvalidToken(
                "access token not recognized".to_string(),
            )),
        }
    }
}

/// Counts returned by [`CredentialStore::purge_expired`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Expired codes removed.
    pub codes: usize,
    /// Expired tokens removed.
    pub tokens: usize,
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Shared storage for authorization codes and access tokens.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Mints a fresh code for `grant` with the store's code lifetime.
    async fn issue_code(&self, grant: CodeGrant) -> AuthorizationCode;

    /// Removes `code` and returns it if it was still live.
    ///
    /// The code is removed even when it has expired, so a code can be
    /// presented successfully at most once.
    ///
    /// # Errors
    ///
    /// [`OAuthError::InvalidGrant`] when the code is unknown, already
    /// redeemed, or expired.
    async fn redeem_code(&self, code: &str) -> std::result::Result<AuthorizationCode, OAuthError>;

    /// Mints a fresh access token with the store's token lifetime.
    async fn issue_token(&self, subject: &str, scope: &str) -> AccessToken;

    /// Looks up a presented bearer value, enforcing expiry.
    async fn lookup_token(&self, token: &str) -> TokenStatus;

    /// Drops every expired code and token.
    async fn purge_expired(&self) -> PurgeStats;
}

#[derive(Default)]
struct Maps {
    codes: HashMap<String, AuthorizationCode>,
    tokens: HashMap<String, AccessToken>,
}

/// Process-local [`CredentialStore`].
pub struct InMemoryStore {
    maps: Mutex<Maps>,
    code_ttl: chrono::Duration,
    token_ttl: chrono::Duration,
}

impl InMemoryStore {
    /// Creates an empty store with explicit lifetimes.
    ///
    /// Lifetimes that do not fit a `chrono::Duration` are clamped to the
    /// largest representable value.
    pub fn new(code_ttl: Duration, token_ttl: Duration) -> Self {
        Self {
            maps: Mutex::new(Maps::default()),
            code_ttl: to_chrono(code_ttl),
            token_ttl: to_chrono(token_ttl),
        }
    }

    /// Creates an empty store using the configured lifetimes.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Duration::from_secs(config.code_ttl_seconds),
            Duration::from_secs(config.token_ttl_seconds),
        )
    }

    /// Number of codes currently held (live or expired).
    pub async fn code_count(&self) -> usize {
        self.maps.lock().await.codes.len()
    }

    /// Number of tokens currently held (live or expired).
    pub async fn token_count(&self) -> usize {
        self.maps.lock().await.tokens.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

fn expiry_from(now: DateTime<Utc>, ttl: chrono::Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn issue_code(&self, grant: CodeGrant) -> AuthorizationCode {
        let issued = AuthorizationCode {
            code: generate_secret(),
            grant,
            expires_at: expiry_from(Utc::now(), self.code_ttl),
        };

        self.maps
            .lock()
            .await
            .codes
            .insert(issued.code.clone(), issued.clone());

        tracing::debug!(client_id = %issued.grant.client_id, "Issued authorization code");
        issued
    }

    async fn redeem_code(&self, code: &str) -> std::result::Result<AuthorizationCode, OAuthError> {
        let removed = self.maps.lock().await.codes.remove(code);

        match removed {
            None => Err(OAuthError::InvalidGrant(
                "unknown authorization code".to_string(),
            )),
            Some(entry) if entry.is_expired_at(Utc::now()) => {
                tracing::debug!(client_id = %entry.grant.client_id, "Rejected expired authorization code");
                Err(OAuthError::InvalidGrant(
                    "authorization code expired".to_string(),
                ))
            }
            Some(entry) => Ok(entry),
        }
    }

    async fn issue_token(&self, subject: &str, scope: &str) -> AccessToken {
        let now = Utc::now();
        let issued = AccessToken {
            token: generate_secret(),
            subject: subject.to_string(),
            scope: scope.to_string(),
            issued_at: now,
            expires_at: expiry_from(now, self.token_ttl),
        };

        self.maps
            .lock()
            .await
            .tokens
            .insert(issued.token.clone(), issued.clone());

        tracing::debug!(subject = %issued.subject, scope = %issued.scope, "Issued access token");
        issued
    }

    async fn lookup_token(&self, token: &str) -> TokenStatus {
        let maps = self.maps.lock().await;
        match maps.tokens.get(token) {
            None => TokenStatus::Unknown,
            Some(entry) if entry.is_expired_at(Utc::now()) => TokenStatus::Expired,
            Some(entry) => TokenStatus::Valid(entry.clone()),
        }
    }

    async fn purge_expired(&self) -> PurgeStats {
        let now = Utc::now();
        let mut maps = self.maps.lock().await;

        let codes_before = maps.codes.len();
        maps.codes.retain(|_, entry| !entry.is_expired_at(now));
        let tokens_before = maps.tokens.len();
        maps.tokens.retain(|_, entry| !entry.is_expired_at(now));

        PurgeStats {
            codes: codes_before - maps.codes.len(),
            tokens: tokens_before - maps.tokens.len(),
        }
    }
}
