//! OAuth 2.0 authorization server
//!
//! - [`store`]: the shared code/token store
//! - [`issuer`] and [`consent`]: the `/authorize` consent step
//! - [`exchanger`]: the `/token` grant exchange
//! - [`pkce`]: optional code verifier checks
//! - [`discovery`]: `/.well-known/` documents

pub mod consent;
pub mod discovery;
pub mod exchanger;
pub mod issuer;
pub mod pkce;
pub mod store;

pub use exchanger::{Exchanger, TokenRequest, TokenResponse};
pub use issuer::{AuthorizeParams, ConsentForm, ConsentOutcome, Issuer};
pub use store::{CredentialStore, InMemoryStore, TokenStatus};
