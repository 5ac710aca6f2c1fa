//! Token sources yield a currently valid access token.
//!
//! - [`ClientCredentialsTokenSource`] performs the client credentials grant
//!   against a token endpoint on every call.
//! - [`ReuseTokenSource`] caches a token until it expires and refreshes it
//!   lazily, with one refresh in flight at a time.
//! - [`ErrorWrappingTokenSource`] attaches the token endpoint to failures.

use crate::error::{BoxError, FailedToGetSecurityToken};
use crate::token::Token;
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub mod client_credentials;
pub mod reuse;

pub use client_credentials::{
    ClientCredentials, ClientCredentialsTokenSource, ExchangeError, TokenRequestError,
};
pub use reuse::ReuseTokenSource;

/// A source of access tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a token, fetching or refreshing it when necessary.
    async fn token(&self) -> Result<Token, BoxError>;
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    async fn token(&self) -> Result<Token, BoxError> {
        (**self).token().await
    }
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for Box<T> {
    async fn token(&self) -> Result<Token, BoxError> {
        (**self).token().await
    }
}

/// Replaces token source failures with [`FailedToGetSecurityToken`].
///
/// Successful tokens pass through unchanged and every failure is wrapped,
/// so retry behaviour of the inner source is unaffected.
pub struct ErrorWrappingTokenSource<S> {
    inner: S,
    config: Option<Arc<ClientCredentials>>,
}

impl<S: TokenSource> ErrorWrappingTokenSource<S> {
    pub fn new(inner: S, config: Option<Arc<ClientCredentials>>) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<S: TokenSource> TokenSource for ErrorWrappingTokenSource<S> {
    async fn token(&self) -> Result<Token, BoxError> {
        self.inner.token().await.map_err(|inner| {
            let err = FailedToGetSecurityToken::new(inner, self.config.clone());
            warn!("{}", err);
            Box::new(err) as BoxError
        })
    }
}
