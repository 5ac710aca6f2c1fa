//! Error types surfaced by the authenticator and its decorators

use crate::config::tls::TlsError;
use crate::credentials::SecurityLevel;
use crate::token_source::ClientCredentials;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error produced by token sources and base transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Required configuration fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    ClientId,
    ClientSecret,
    TokenUrl,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::ClientId => "client_id",
            MissingField::ClientSecret => "client_secret",
            MissingField::TokenUrl => "token_url",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while constructing an authenticator
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no {0} provided in the OAuth2 client credentials configuration")]
    MissingField(MissingField),
    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// Errors returned by a decorated stream transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The token source failed; the base transport was not invoked.
    #[error("token source failed")]
    Token(#[source] BoxError),
    #[error("access token cannot be used as a header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors returned by per-call credentials
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("token source failed")]
    Token(#[source] BoxError),
    #[error(
        "unable to transfer per-call credentials: connection security level {0:?} is below PrivacyAndIntegrity"
    )]
    InsecureTransport(SecurityLevel),
    #[error("access token cannot be used as call metadata: {0}")]
    InvalidMetadata(#[from] http::header::InvalidHeaderValue),
}

/// A token endpoint could not produce a token.
///
/// Carries the underlying error together with the credentials that were used,
/// so the message names the failing token endpoint while `source()` still
/// yields the untouched cause.
#[derive(Debug)]
pub struct FailedToGetSecurityToken {
    inner: BoxError,
    config: Option<Arc<ClientCredentials>>,
}

impl FailedToGetSecurityToken {
    pub fn new(inner: BoxError, config: Option<Arc<ClientCredentials>>) -> Self {
        Self { inner, config }
    }

    /// The error reported by the wrapped token source
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> BoxError {
        self.inner
    }

    /// Token endpoint of the attached credentials, if any
    pub fn token_url(&self) -> Option<&str> {
        self.config.as_deref().map(ClientCredentials::token_url)
    }
}

impl fmt::Display for FailedToGetSecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_url() {
            Some(token_url) => write!(
                f,
                "failed to get security token from token endpoint {:?}: {}",
                token_url, self.inner
            ),
            None => f.write_str("unconfigured FailedToGetSecurityToken"),
        }
    }
}

impl std::error::Error for FailedToGetSecurityToken {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}
