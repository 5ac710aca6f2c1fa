//! Per-call credentials for remote procedure clients

use crate::error::CredentialsError;
use crate::token_source::TokenSource;
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use std::sync::Arc;

/// Protection offered by the connection a call is sent on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityLevel {
    NoSecurity,
    IntegrityOnly,
    PrivacyAndIntegrity,
}

/// Information about the call credentials are requested for
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Full method name, e.g. `/opentelemetry.proto.collector.trace.v1.TraceService/Export`
    pub method: String,
    pub security_level: SecurityLevel,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, security_level: SecurityLevel) -> Self {
        Self {
            method: method.into(),
            security_level,
        }
    }
}

/// Supplies authentication metadata for each outgoing call
#[async_trait]
pub trait PerRpcCredentials: Send + Sync {
    /// Metadata to attach to the call described by `info`
    async fn request_metadata(&self, info: &RequestInfo) -> Result<HeaderMap, CredentialsError>;

    /// Whether the credentials may only be sent over a secure connection
    fn require_transport_security(&self) -> bool;
}

/// Per-call credentials backed by a token source
pub struct TokenSourceCredentials {
    source: Arc<dyn TokenSource>,
}

impl TokenSourceCredentials {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl PerRpcCredentials for TokenSourceCredentials {
    async fn request_metadata(&self, info: &RequestInfo) -> Result<HeaderMap, CredentialsError> {
        let token = self.source.token().await.map_err(CredentialsError::Token)?;
        if info.security_level < SecurityLevel::PrivacyAndIntegrity {
            return Err(CredentialsError::InsecureTransport(info.security_level));
        }

        let mut value = HeaderValue::from_str(&token.authorization_value())?;
        value.set_sensitive(true);
        let mut metadata = HeaderMap::with_capacity(1);
        metadata.insert(AUTHORIZATION, value);
        Ok(metadata)
    }

    fn require_transport_security(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailedToGetSecurityToken;
    use crate::token::Token;
    use crate::token_source::testing::{StubTokenSource, failure};
    use crate::token_source::{ClientCredentials, ErrorWrappingTokenSource, ReuseTokenSource};

    const EXPORT: &str = "/opentelemetry.proto.collector.metrics.v1.MetricsService/Export";

    #[tokio::test]
    async fn test_metadata_contains_authorization() {
        let source = Arc::new(StubTokenSource::returning(Token::new("abc123", "bearer")));
        let credentials = TokenSourceCredentials::new(source);

        let metadata = credentials
            .request_metadata(&RequestInfo::new(EXPORT, SecurityLevel::PrivacyAndIntegrity))
            .await
            .unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("authorization").unwrap(), "Bearer abc123");
        assert!(credentials.require_transport_security());
    }

    #[tokio::test]
    async fn test_refuses_insecure_connection() {
        let source = Arc::new(StubTokenSource::returning(Token::new("abc123", "Bearer")));
        let credentials = TokenSourceCredentials::new(source);

        for level in [SecurityLevel::NoSecurity, SecurityLevel::IntegrityOnly] {
            let result = credentials
                .request_metadata(&RequestInfo::new(EXPORT, level))
                .await;
            assert!(matches!(
                result,
                Err(CredentialsError::InsecureTransport(l)) if l == level
            ));
        }
    }

    #[tokio::test]
    async fn test_token_error_is_surfaced() {
        let stub = StubTokenSource::scripted(vec![failure("denied")], Token::new("x", "Bearer"));
        let config = Arc::new(ClientCredentials::for_test("https://auth.example/token"));
        let source = Arc::new(ErrorWrappingTokenSource::new(stub, Some(config)));
        let credentials = TokenSourceCredentials::new(source);

        let err = credentials
            .request_metadata(&RequestInfo::new(EXPORT, SecurityLevel::PrivacyAndIntegrity))
            .await
            .unwrap_err();
        let CredentialsError::Token(inner) = err else {
            panic!("expected a token error");
        };
        assert!(inner.is::<FailedToGetSecurityToken>());
        assert!(inner.to_string().contains("https://auth.example/token"));
    }

    #[tokio::test]
    async fn test_token_reused_across_calls() {
        let stub = Arc::new(StubTokenSource::returning(Token::new("abc123", "Bearer")));
        let source = Arc::new(ReuseTokenSource::new(Arc::clone(&stub)));
        let credentials = TokenSourceCredentials::new(source);

        let info = RequestInfo::new(EXPORT, SecurityLevel::PrivacyAndIntegrity);
        for _ in 0..3 {
            credentials.request_metadata(&info).await.unwrap();
        }
        assert_eq!(stub.calls(), 1);
    }
}
