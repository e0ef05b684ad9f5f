//! Authorization code issuance
//!
//! The consent step is a two-state machine. `GET /authorize` validates the
//! request and yields the prompt; `POST /authorize` resolves it to a
//! redirect (deny or authorize) or back to the prompt with an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use url::Url;

use crate::auth::store::{CodeGrant, CredentialStore};
use crate::error::OAuthError;

/// OAuth authorization request parameters as received on `/authorize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeParams {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// The consent form posted back to `/authorize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsentForm {
    #[serde(flatten)]
    pub params: AuthorizeParams,
    /// Shared secret typed by the resource owner.
    pub secret: Option<String>,
    /// `authorize` or `deny`.
    pub action: Option<String>,
}

/// Result of an authorize step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// Show the consent page, optionally with an error message.
    Prompt {
        params: AuthorizeParams,
        error: Option<String>,
    },
    /// Send the user agent to this URL.
    Redirect(String),
    /// The request cannot be served at all.
    Rejected(OAuthError),
}

/// Issues authorization codes after checking the shared secret.
pub struct Issuer {
    store: Arc<dyn CredentialStore>,
    secrets: Vec<String>,
    default_scope: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Issuer {
    /// Creates an issuer accepting any of `secrets`. Empty secrets are
    /// ignored.
    pub fn new(store: Arc<dyn CredentialStore>, secrets: Vec<String>, default_scope: String) -> Self {
        Self {
            store,
            secrets: secrets.into_iter().filter(|s| !s.is_empty()).collect(),
            default_scope,
        }
    }

    fn check_required(params: &AuthorizeParams) -> Result<String, OAuthError> {
        if non_empty(&params.client_id).is_none() {
            return Err(OAuthError::InvalidRequest("client_id is required".to_string()));
        }
        non_empty(&params.redirect_uri)
            .map(String::from)
            .ok_or_else(|| OAuthError::InvalidRequest("redirect_uri is required".to_string()))
    }

    /// Handles `GET /authorize`.
    pub fn prompt(&self, params: AuthorizeParams) -> ConsentOutcome {
        match Self::check_required(&params) {
            Ok(_) => ConsentOutcome::Prompt {
                params,
                error: None,
            },
            Err(e) => ConsentOutcome::Rejected(e),
        }
    }

    /// Handles `POST /authorize`.
    pub async fn decide(&self, form: ConsentForm) -> ConsentOutcome {
        let redirect_uri = match Self::check_required(&form.params) {
            Ok(uri) => uri,
            Err(e) => return ConsentOutcome::Rejected(e),
        };
        let state = non_empty(&form.params.state).unwrap_or("").to_string();

        match form.action.as_deref() {
            Some("deny") => {
                let denied = OAuthError::AccessDenied("resource owner denied the request".to_string());
                tracing::info!(client_id = ?form.params.client_id, error = %denied, "Authorization denied");
                let mut pairs = vec![("error", denied.error_code())];
                if !state.is_empty() {
                    pairs.push(("state", state.as_str()));
                }
                ConsentOutcome::Redirect(append_query(&redirect_uri, &pairs))
            }
            Some("authorize") => {
                let presented = form.secret.as_deref().unwrap_or("");
                if !self.secret_matches(presented) {
                    tracing::warn!(client_id = ?form.params.client_id, "Rejected consent with invalid secret");
                    return ConsentOutcome::Prompt {
                        params: form.params,
                        error: Some("Invalid secret".to_string()),
                    };
                }

                let params = form.params;
                let grant = CodeGrant {
                    client_id: params.client_id.unwrap_or_default(),
                    redirect_uri: redirect_uri.clone(),
                    scope: params
                        .scope
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| self.default_scope.clone()),
                    code_challenge: params.code_challenge.filter(|s| !s.is_empty()),
                    code_challenge_method: params.code_challenge_method.filter(|s| !s.is_empty()),
                };
                let issued = self.store.issue_code(grant).await;
                tracing::info!(client_id = %issued.grant.client_id, "Authorization granted");

                let mut pairs = vec![("code", issued.code.as_str())];
                if !state.is_empty() {
                    pairs.push(("state", state.as_str()));
                }
                ConsentOutcome::Redirect(append_query(&redirect_uri, &pairs))
            }
            other => ConsentOutcome::Prompt {
                params: form.params,
                error: Some(format!("Unknown action: {}", other.unwrap_or(""))),
            },
        }
    }

    fn secret_matches(&self, presented: &str) -> bool {
        if presented.is_empty() {
            return false;
        }
        let matched = self.secrets.iter().fold(Choice::from(0), |acc, secret| {
            acc | secret.as_bytes().ct_eq(presented.as_bytes())
        });
        bool::from(matched)
    }
}

/// Appends form-urlencoded `pairs` to `uri`'s query, keeping any existing
/// query and fragment.
///
/// # Examples
///
/// ```
/// use ada_mcp::auth::issuer::append_query;
///
/// assert_eq!(append_query("https://x/cb", &[("state", "s1")]), "https://x/cb?state=s1");
/// assert_eq!(append_query("https://x/cb?a=1", &[("state", "s 1")]), "https://x/cb?a=1&state=s+1");
/// ```
pub fn append_query(uri: &str, pairs: &[(&str, &str)]) -> String {
    if let Ok(mut url) = Url::parse(uri) {
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        return url.to_string();
    }

    // Relative or otherwise unparseable URIs: join by hand.
    let (base, fragment) = match uri.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (uri, None),
    };
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish();

    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    let mut joined = format!("{}{}{}", base, separator, encoded);
    if let Some(fragment) = fragment {
        joined.push('#');
        joined.push_str(fragment);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::InMemoryStore;

    fn issuer() -> (Issuer, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::default());
        let issuer = Issuer::new(
            store.clone(),
            vec!["s3cret".to_string(), String::new()],
            "mcp".to_string(),
        );
        (issuer, store)
    }

    fn params() -> AuthorizeParams {
        AuthorizeParams {
            client_id: Some("client-a".to_string()),
            redirect_uri: Some("https://x/cb".to_string()),
            state: Some("s1".to_string()),
            ..Default::default()
        }
    }

    fn form(action: &str, secret: Option<&str>) -> ConsentForm {
        ConsentForm {
            params: params(),
            secret: secret.map(String::from),
            action: Some(action.to_string()),
        }
    }

    #[test]
    fn test_append_query_without_existing_query() {
        assert_eq!(
            append_query("https://x/cb", &[("error", "access_denied"), ("state", "s1")]),
            "https://x/cb?error=access_denied&state=s1"
        );
    }

    #[test]
    fn test_append_query_with_existing_query_and_fragment() {
        assert_eq!(
            append_query("https://x/cb?keep=1#frag", &[("code", "abc")]),
            "https://x/cb?keep=1&code=abc#frag"
        );
    }

    #[test]
    fn test_append_query_encodes_values() {
        assert_eq!(
            append_query("https://x/cb", &[("state", "a&b=c")]),
            "https://x/cb?state=a%26b%3Dc"
        );
    }

    #[test]
    fn test_append_query_relative_uri() {
        assert_eq!(append_query("/cb", &[("code", "x")]), "/cb?code=x");
        assert_eq!(append_query("/cb?", &[("code", "x")]), "/cb?code=x");
        assert_eq!(append_query("/cb?a=1&", &[("code", "x")]), "/cb?a=1&code=x");
        assert_eq!(append_query("/cb?a=1#f", &[("code", "x")]), "/cb?a=1&code=x#f");
    }

    #[test]
    fn test_prompt_requires_client_and_redirect() {
        let (issuer, _) = issuer();
        assert!(matches!(issuer.prompt(params()), ConsentOutcome::Prompt { error: None, .. }));

        let mut missing = params();
        missing.redirect_uri = None;
        match issuer.prompt(missing) {
            ConsentOutcome::Rejected(e) => assert_eq!(e.error_code(), "invalid_request"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deny_redirects_with_access_denied() {
        let (issuer, store) = issuer();
        let outcome = issuer.decide(form("deny", None)).await;
        assert_eq!(
            outcome,
            ConsentOutcome::Redirect("https://x/cb?error=access_denied&state=s1".to_string())
        );
        assert_eq!(store.code_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_secret_reprompts_without_code() {
        let (issuer, store) = issuer();
        for secret in [Some("wrong"), Some(""), None] {
            match issuer.decide(form("authorize", secret)).await {
                ConsentOutcome::Prompt { params: p, error } => {
                    assert_eq!(p, params());
                    assert!(error.is_some());
                }
                other => panic!("expected prompt, got {:?}", other),
            }
        }
        assert_eq!(store.code_count().await, 0);
    }

    #[tokio::test]
    async fn test_valid_secret_issues_code() {
        let (issuer, store) = issuer();
        let location = match issuer.decide(form("authorize", Some("s3cret"))).await {
            ConsentOutcome::Redirect(location) => location,
            other => panic!("expected redirect, got {:?}", other),
        };

        let url = Url::parse(&location).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0].0, "code");
        assert_eq!(pairs[1], ("state".to_string(), "s1".to_string()));

        let redeemed = store.redeem_code(&pairs[0].1).await.unwrap();
        assert_eq!(redeemed.grant.client_id, "client-a");
        assert_eq!(redeemed.grant.scope, "mcp");
    }

    #[tokio::test]
    async fn test_empty_state_is_omitted() {
        let (issuer, _) = issuer();
        let mut f = form("deny", None);
        f.params.state = None;
        assert_eq!(
            issuer.decide(f).await,
            ConsentOutcome::Redirect("https://x/cb?error=access_denied".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_action_reprompts() {
        let (issuer, _) = issuer();
        match issuer.decide(form("maybe", Some("s3cret"))).await {
            ConsentOutcome::Prompt { error, .. } => {
                assert_eq!(error.as_deref(), Some("Unknown action: maybe"))
            }
            other => panic!("expected prompt, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pkce_parameters_are_captured() {
        let (issuer, store) = issuer();
        let mut f = form("authorize", Some("s3cret"));
        f.params.code_challenge = Some("abc".to_string());
        f.params.code_challenge_method = Some("S256".to_string());

        let ConsentOutcome::Redirect(location) = issuer.decide(f).await else {
            panic!("expected redirect");
        };
        let code = Url::parse(&location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let redeemed = store.redeem_code(&code).await.unwrap();
        assert_eq!(redeemed.grant.code_challenge.as_deref(), Some("abc"));
        assert_eq!(redeemed.grant.code_challenge_method.as_deref(), Some("S256"));
    }
}
