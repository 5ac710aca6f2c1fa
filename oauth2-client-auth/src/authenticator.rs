//! OAuth2 client credentials authenticator for HTTP and RPC clients

use crate::config::Config;
use crate::config::tls::TlsError;
use crate::credentials::{PerRpcCredentials, TokenSourceCredentials};
use crate::error::AuthError;
use crate::extension::{ClientAuthenticator, Extension, Host};
use crate::token_source::{
    ClientCredentialsTokenSource, ErrorWrappingTokenSource, ReuseTokenSource, TokenSource,
};
use crate::transport::{RoundTripper, Transport};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use reqwest::redirect::Policy;
use std::sync::Arc;

pub use crate::token_source::ClientCredentials;

/// Authenticates outgoing calls with tokens from the client credentials grant.
///
/// The authenticator only holds configuration and the HTTP client used for
/// token endpoint requests. Every call to [`round_tripper`] or
/// [`per_rpc_credentials`] creates its own token source, so decorators never
/// share cached tokens.
///
/// [`round_tripper`]: ClientAuthenticator::round_tripper
/// [`per_rpc_credentials`]: ClientAuthenticator::per_rpc_credentials
#[derive(Debug, Clone)]
pub struct ClientCredentialsAuthenticator {
    credentials: Arc<ClientCredentials>,
    client: Client,
}

const _: fn() = || {
    fn assert_client_authenticator<T: ClientAuthenticator + Clone + 'static>() {}
    fn assert_token_source<T: TokenSource + 'static>() {}
    assert_client_authenticator::<ClientCredentialsAuthenticator>();
    assert_token_source::<
        ErrorWrappingTokenSource<ReuseTokenSource<ClientCredentialsTokenSource>>,
    >();
};

impl ClientCredentialsAuthenticator {
    /// Validates the configuration and prepares the token endpoint client.
    ///
    /// No request is sent here; tokens are fetched on first use.
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        config.validate()?;

        let tls = config.tls.load_tls_config()?;
        // The OAuth2 client follows no redirects from the token endpoint
        let mut builder = tls.apply(Client::builder().redirect(Policy::none()));
        if let Some(timeout) = config.timeout_duration() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TlsError::ClientBuild)?;

        let credentials = Arc::new(ClientCredentials::from_config(config));
        debug!(
            "Created client credentials authenticator for client '{}' (token endpoint: {}, scopes: {:?})",
            credentials.client_id(),
            credentials.token_url(),
            credentials.scopes()
        );

        Ok(Self {
            credentials,
            client,
        })
    }

    pub fn credentials(&self) -> &ClientCredentials {
        &self.credentials
    }

    /// A fresh caching token source whose failures name the token endpoint
    fn token_source(&self) -> Arc<dyn TokenSource> {
        Arc::new(ErrorWrappingTokenSource::new(
            self.credentials.token_source(self.client.clone()),
            Some(Arc::clone(&self.credentials)),
        ))
    }
}

#[async_trait]
impl Extension for ClientCredentialsAuthenticator {
    async fn start(&self, _host: &dyn Host) -> Result<(), AuthError> {
        info!(
            "Starting OAuth2 client credentials authenticator for client '{}'",
            self.credentials.client_id()
        );
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), AuthError> {
        info!(
            "Shutting down OAuth2 client credentials authenticator for client '{}'",
            self.credentials.client_id()
        );
        Ok(())
    }
}

impl ClientAuthenticator for ClientCredentialsAuthenticator {
    fn round_tripper(
        &self,
        base: Arc<dyn RoundTripper>,
    ) -> Result<Arc<dyn RoundTripper>, AuthError> {
        Ok(Arc::new(Transport::new(self.token_source(), base)))
    }

    fn per_rpc_credentials(&self) -> Result<Arc<dyn PerRpcCredentials>, AuthError> {
        Ok(Arc::new(TokenSourceCredentials::new(self.token_source())))
    }
}
