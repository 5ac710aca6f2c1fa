//! # oauth2-client-auth
//!
//! Client-side authenticator that obtains access tokens with the OAuth2
//! client credentials grant and attaches them to outgoing calls.
//!
//! ## Components
//!
//! - **Config:** Client id, secret, token endpoint, scopes and TLS settings, loaded with confique.
//! - **Token sources:** Token endpoint exchange, single-flight caching and error wrapping.
//! - **Transport:** Decorates a stream round tripper with an `Authorization` header.
//! - **Credentials:** Per-call metadata for remote procedure clients.
//! - **Authenticator:** Ties the pieces together behind the host extension contracts.

pub mod authenticator;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extension;
pub mod token;
pub mod token_source;
pub mod transport;

pub use authenticator::ClientCredentialsAuthenticator;
pub use config::{AuthStyle, Config, TlsClientSettings};
pub use credentials::{PerRpcCredentials, RequestInfo, SecurityLevel, TokenSourceCredentials};
pub use error::{
    AuthError, BoxError, CredentialsError, FailedToGetSecurityToken, MissingField, TransportError,
};
pub use extension::{ClientAuthenticator, Extension, Host};
pub use token::Token;
pub use token_source::{
    ClientCredentials, ErrorWrappingTokenSource, ReuseTokenSource, TokenSource,
};
pub use transport::{RoundTripper, Transport};
