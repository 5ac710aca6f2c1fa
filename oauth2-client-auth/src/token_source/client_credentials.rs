//! Client credentials grant (RFC 6749 section 4.4) against a token endpoint

use crate::config::{AuthStyle, Config};
use crate::error::BoxError;
use crate::token::Token;
use crate::token_source::{ReuseTokenSource, TokenSource};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthType, ClientId, ClientSecret, HttpClientError, RequestTokenError, Scope, TokenResponse,
    TokenUrl,
};
use reqwest::Client;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the OAuth2 client for a token request
pub type TokenRequestError = RequestTokenError<HttpClientError<reqwest::Error>, BasicErrorResponse>;

/// Errors that can occur while exchanging client credentials for a token
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("invalid token endpoint URL: {0}")]
    InvalidTokenUrl(#[from] url::ParseError),
    /// The token endpoint answered with an RFC 6749 error response
    #[error("token endpoint rejected the request: {0}")]
    Rejected(BasicErrorResponse),
    #[error("token request failed: {0}")]
    Request(#[source] TokenRequestError),
    #[error("endpoint parameter {0:?} cannot be overridden")]
    ReservedParameter(String),
}

impl From<TokenRequestError> for ExchangeError {
    fn from(err: TokenRequestError) -> Self {
        match err {
            RequestTokenError::ServerResponse(response) => ExchangeError::Rejected(response),
            other => ExchangeError::Request(other),
        }
    }
}

/// Credentials and endpoint used for the client credentials grant
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
    token_url: String,
    scopes: Vec<String>,
    endpoint_params: Vec<(String, String)>,
    auth_style: AuthStyle,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field("endpoint_params", &self.endpoint_params)
            .field("auth_style", &self.auth_style)
            .finish()
    }
}

impl ClientCredentials {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            scopes: config.scopes.clone(),
            endpoint_params: config.endpoint_param_pairs(),
            auth_style: config.auth_style,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Builds a caching token source that requests tokens through `client`
    pub fn token_source(
        self: &Arc<Self>,
        client: Client,
    ) -> ReuseTokenSource<ClientCredentialsTokenSource> {
        ReuseTokenSource::new(ClientCredentialsTokenSource::new(Arc::clone(self), client))
    }

    #[cfg(test)]
    pub(crate) fn for_test(token_url: &str) -> Self {
        Self {
            client_id: "id1".to_string(),
            client_secret: "sec1".to_string(),
            token_url: token_url.to_string(),
            scopes: vec!["read".to_string()],
            endpoint_params: Vec::new(),
            auth_style: AuthStyle::Auto,
        }
    }
}

/// Requests a new token from the token endpoint on every call
pub struct ClientCredentialsTokenSource {
    credentials: Arc<ClientCredentials>,
    client: Client,
    /// Auth style that last succeeded when configured as `Auto`
    detected_style: Mutex<Option<AuthStyle>>,
}

impl ClientCredentialsTokenSource {
    pub fn new(credentials: Arc<ClientCredentials>, client: Client) -> Self {
        Self {
            credentials,
            client,
            detected_style: Mutex::new(None),
        }
    }

    fn detected_style(&self) -> Option<AuthStyle> {
        *self
            .detected_style
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remember_style(&self, style: AuthStyle) {
        *self
            .detected_style
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(style);
    }

    async fn exchange(&self) -> Result<Token, ExchangeError> {
        let style = match self.credentials.auth_style {
            AuthStyle::Auto => self.detected_style(),
            style => Some(style),
        };
        if let Some(style) = style {
            return self.request_token(style).await;
        }

        match self.request_token(AuthStyle::Header).await {
            Ok(token) => {
                self.remember_style(AuthStyle::Header);
                Ok(token)
            }
            Err(ExchangeError::Rejected(response)) => {
                debug!(
                    "Token endpoint rejected HTTP Basic client authentication ({}), retrying with form parameters",
                    response.error()
                );
                let token = self.request_token(AuthStyle::Params).await?;
                self.remember_style(AuthStyle::Params);
                Ok(token)
            }
            Err(e) => Err(e),
        }
    }

    async fn request_token(&self, style: AuthStyle) -> Result<Token, ExchangeError> {
        let credentials = &self.credentials;
        debug!(
            "Requesting token for client '{}' from {} with {} scopes",
            credentials.client_id,
            credentials.token_url,
            credentials.scopes.len()
        );

        let auth_type = match style {
            AuthStyle::Params => AuthType::RequestBody,
            AuthStyle::Header | AuthStyle::Auto => AuthType::BasicAuth,
        };
        let oauth_client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
            .set_client_secret(ClientSecret::new(credentials.client_secret.clone()))
            .set_token_uri(TokenUrl::new(credentials.token_url.clone())?)
            .set_auth_type(auth_type);

        let mut request = oauth_client.exchange_client_credentials();
        let overrides_scope = credentials.endpoint_params.iter().any(|(key, _)| key == "scope");
        if !overrides_scope {
            request = request.add_scopes(credentials.scopes.iter().cloned().map(Scope::new));
        }
        for (key, value) in &credentials.endpoint_params {
            if key == "grant_type" {
                return Err(ExchangeError::ReservedParameter(key.clone()));
            }
            request = request.add_extra_param(key.clone(), value.clone());
        }

        let response = request.request_async(&self.client).await?;
        let token_type: &str = response.token_type().as_ref();
        let mut token = Token::new(response.access_token().secret().clone(), token_type);
        if let Some(expiry) = response.expires_in().and_then(expiry_after) {
            token = token.with_expiry(expiry);
        }

        debug!(
            "Obtained {} token for client '{}' (expires: {})",
            token.token_type(),
            credentials.client_id,
            token
                .expiry
                .map(|e| e.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        );
        Ok(token)
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsTokenSource {
    async fn token(&self) -> Result<Token, BoxError> {
        Ok(self.exchange().await?)
    }
}

/// Expiry for a token issued now with lifetime `expires_in`.
///
/// Zero and lifetimes beyond the representable date range mean no expiry.
fn expiry_after(expires_in: Duration) -> Option<DateTime<Utc>> {
    if expires_in.is_zero() {
        return None;
    }
    let lifetime = TimeDelta::from_std(expires_in).ok()?;
    Utc::now().checked_add_signed(lifetime)
}
