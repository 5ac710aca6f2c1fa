//! Contracts between the authenticator and the component host

use crate::credentials::PerRpcCredentials;
use crate::error::{AuthError, BoxError};
use crate::transport::RoundTripper;
use async_trait::async_trait;
use std::sync::Arc;

/// Services the host offers to extensions while they start
pub trait Host: Send + Sync {
    /// Reports an error the extension cannot recover from
    fn report_fatal_error(&self, err: BoxError);
}

/// Lifecycle of a host-managed extension
#[async_trait]
pub trait Extension: Send + Sync {
    async fn start(&self, host: &dyn Host) -> Result<(), AuthError>;

    async fn shutdown(&self) -> Result<(), AuthError>;
}

/// An extension that authenticates outgoing client calls
pub trait ClientAuthenticator: Extension {
    /// Decorates a stream transport so each request carries credentials
    fn round_tripper(
        &self,
        base: Arc<dyn RoundTripper>,
    ) -> Result<Arc<dyn RoundTripper>, AuthError>;

    /// Credentials attached to each remote procedure call
    fn per_rpc_credentials(&self) -> Result<Arc<dyn PerRpcCredentials>, AuthError>;
}
