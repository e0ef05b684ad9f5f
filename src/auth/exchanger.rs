//! `/token` grant exchange
//!
//! Three grant types mint tokens: `authorization_code` (the code is
//! redeemed exactly once), and `refresh_token` / `client_credentials`,
//! which issue a fresh token without validating the presented refresh
//! token or client credentials. Refresh tokens are returned to the client
//! but never stored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::pkce;
use crate::auth::store::{generate_secret, CredentialStore};
use crate::error::OAuthError;

/// `grant_type=authorization_code`
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
/// `grant_type=refresh_token`
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
/// `grant_type=client_credentials`
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Grant types accepted by [`Exchanger::exchange`], in the order they are
/// advertised.
pub const SUPPORTED_GRANTS: [&str; 3] = [
    GRANT_AUTHORIZATION_CODE,
    GRANT_REFRESH_TOKEN,
    GRANT_CLIENT_CREDENTIALS,
];

/// Subject recorded for tokens minted without a client id.
const ANONYMOUS_SUBJECT: &str = "anonymous";

/// A decoded `/token` form body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub code_verifier: Option<String>,
}

impl TokenRequest {
    /// Decodes an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// [`OAuthError::InvalidRequest`] when the body is not a valid form.
    ///
    /// # Examples
    ///
    /// ```
    /// use ada_mcp::auth::exchanger::TokenRequest;
    ///
    /// let req = TokenRequest::from_form(b"grant_type=authorization_code&code=a%2Bb").unwrap();
    /// assert_eq!(req.code.as_deref(), Some("a+b"));
    /// ```
    pub fn from_form(body: &[u8]) -> std::result::Result<Self, OAuthError> {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| OAuthError::InvalidRequest(format!("malformed form body: {}", e)))
    }
}

/// Successful `/token` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub scope: String,
}

/// Turns grants into access tokens.
pub struct Exchanger {
    store: Arc<dyn CredentialStore>,
    default_scope: String,
    enforce_pkce: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Exchanger {
    pub fn new(store: Arc<dyn CredentialStore>, default_scope: String, enforce_pkce: bool) -> Self {
        Self {
            store,
            default_scope,
            enforce_pkce,
        }
    }

    /// Exchanges a grant for a token.
    ///
    /// # Errors
    ///
    /// - [`OAuthError::InvalidRequest`] when `grant_type` is missing
    /// - [`OAuthError::InvalidGrant`] for a missing, unknown, redeemed or
    ///   expired code, or a failed PKCE check
    /// - [`OAuthError::UnsupportedGrantType`] for any other grant type
    pub async fn exchange(
        &self,
        request: TokenRequest,
    ) -> std::result::Result<TokenResponse, OAuthError> {
        let grant_type = non_empty(request.grant_type.clone())
            .ok_or_else(|| OAuthError::InvalidRequest("grant_type is required".to_string()))?;

        let (subject, scope) = match grant_type.as_str() {
            GRANT_AUTHORIZATION_CODE => self.redeem(request).await?,
            GRANT_REFRESH_TOKEN | GRANT_CLIENT_CREDENTIALS => {
                let subject = non_empty(request.client_id)
                    .unwrap_or_else(|| ANONYMOUS_SUBJECT.to_string());
                let scope =
                    non_empty(request.scope).unwrap_or_else(|| self.default_scope.clone());
                (subject, scope)
            }
            other => {
                tracing::debug!(grant_type = %other, "Rejected unsupported grant type");
                return Err(OAuthError::UnsupportedGrantType(format!(
                    "grant_type {} is not supported",
                    other
                )));
            }
        };

        let token = self.store.issue_token(&subject, &scope).await;
        tracing::info!(grant_type = %grant_type, subject = %subject, "Issued access token");

        Ok(TokenResponse {
            expires_in: token.lifetime(),
            access_token: token.token,
            token_type: "Bearer".to_string(),
            refresh_token: generate_secret(),
            scope: token.scope,
        })
    }

    async fn redeem(
        &self,
        request: TokenRequest,
    ) -> std::result::Result<(String, String), OAuthError> {
        let code = non_empty(request.code)
            .ok_or_else(|| OAuthError::InvalidGrant("code is required".to_string()))?;
        let redeemed = self.store.redeem_code(&code).await?;

        if self.enforce_pkce {
            if let Some(challenge) = redeemed.grant.code_challenge.as_deref() {
                pkce::verify(
                    challenge,
                    redeemed.grant.code_challenge_method.as_deref(),
                    request.code_verifier.as_deref(),
                )?;
            }
        }

        Ok((redeemed.grant.client_id, redeemed.grant.scope))
    }
}
