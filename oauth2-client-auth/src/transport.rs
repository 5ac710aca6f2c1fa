//! Stream transport decoration
//!
//! A [`RoundTripper`] sends a single HTTP request and returns its response.
//! [`Transport`] decorates a base round tripper with an `Authorization`
//! header obtained from a token source.

use crate::error::TransportError;
use crate::token_source::TokenSource;
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::HeaderValue;
use log::debug;
use reqwest::{Client, Request, Response};
use std::sync::Arc;

/// Sends one HTTP request
#[async_trait]
pub trait RoundTripper: Send + Sync {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl RoundTripper for Client {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<T: RoundTripper + ?Sized> RoundTripper for Arc<T> {
    async fn round_trip(&self, request: Request) -> Result<Response, TransportError> {
        (**self).round_trip(request).await
    }
}

/// Round tripper that authorizes every request with a token from `source`
/// before handing it to `base`.
///
/// Token caching and refresh belong to the token source; this type only
/// attaches whatever token it is given.
pub struct Transport {
    source: Arc<dyn TokenSource>,
    base: Arc<dyn RoundTripper>,
}

impl Transport {
    pub fn new(source: Arc<dyn TokenSource>, base: Arc<dyn RoundTripper>) -> Self {
        Self { source, base }
    }
}

#[async_trait]
impl RoundTripper for Transport {
    async fn round_trip(&self, mut request: Request) -> Result<Response, TransportError> {
        let token = self.source.token().await.map_err(TransportError::Token)?;

        let mut value = HeaderValue::from_str(&token.authorization_value())?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        debug!(
            "Sending {} {} with {} authorization",
            request.method(),
            request.url(),
            token.token_type()
        );
        self.base.round_trip(request).await
    }
}
