//! PKCE (RFC 7636) challenge verification
//!
//! Challenges are always captured when a code is issued. Checking the
//! `code_verifier` at token exchange only happens when
//! `auth.enforce_pkce` is set; with the default configuration a code
//! carrying a challenge is redeemable without a verifier.

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::OAuthError;

/// The `S256` challenge method.
pub const METHOD_S256: &str = "S256";
/// The `plain` challenge method.
pub const METHOD_PLAIN: &str = "plain";

/// Challenge methods advertised in discovery metadata.
pub const SUPPORTED_METHODS: [&str; 2] = [METHOD_S256, METHOD_PLAIN];

/// Computes `BASE64URL(SHA256(ASCII(verifier)))`.
///
/// # Examples
///
/// ```
/// use ada_mcp::auth::pkce::compute_s256;
///
/// assert_eq!(
///     compute_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
///     "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
/// );
/// ```
pub fn compute_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}

/// Checks a `code_verifier` against the challenge stored with a code.
///
/// A missing method means `plain`, as RFC 7636 section 4.3 prescribes.
///
/// # Errors
///
/// [`OAuthError::InvalidGrant`] when the verifier is missing, the method is
/// not supported, or the verifier does not match.
pub fn verify(
    challenge: &str,
    method: Option<&str>,
    verifier: Option<&str>,
) -> std::result::Result<(), OAuthError> {
    let verifier = verifier
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuthError::InvalidGrant("code_verifier required".to_string()))?;

    let computed = match method.unwrap_or(METHOD_PLAIN) {
        METHOD_S256 => compute_s256(verifier),
        METHOD_PLAIN => verifier.to_string(),
        other => {
            return Err(OAuthError::InvalidGrant(format!(
                "unsupported code_challenge_method: {}",
                other
            )))
        }
    };

    if computed == challenge {
        Ok(())
    } else {
        Err(OAuthError::InvalidGrant(
            "code_verifier does not match code_challenge".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_s256_known_answer_rfc7636_appendix_b() {
        assert_eq!(compute_s256(RFC_VERIFIER), RFC_CHALLENGE);
    }

    #[test]
    fn test_verify_s256_accepts_matching_verifier() {
        assert!(verify(RFC_CHALLENGE, Some("S256"), Some(RFC_VERIFIER)).is_ok());
    }

    #[test]
    fn test_verify_s256_rejects_wrong_verifier() {
        let err = verify(RFC_CHALLENGE, Some("S256"), Some("wrong")).unwrap_err();
        assert_eq!(err.error_code(), "invalid_grant");
    }

    #[test]
    fn test_verify_plain_compares_directly() {
        assert!(verify("abc", Some("plain"), Some("abc")).is_ok());
        assert!(verify("abc", None, Some("abc")).is_ok());
        assert!(verify("abc", None, Some("abd")).is_err());
    }

    #[test]
    fn test_verify_requires_verifier() {
        let err = verify(RFC_CHALLENGE, Some("S256"), None).unwrap_err();
        assert_eq!(err.description(), "code_verifier required");
        assert!(verify(RFC_CHALLENGE, Some("S256"), Some("")).is_err());
    }

    #[test]
    fn test_verify_method_is_case_sensitive() {
        assert!(verify(RFC_CHALLENGE, Some("s256"), Some(RFC_VERIFIER)).is_err());
    }
}
