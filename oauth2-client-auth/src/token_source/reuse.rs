use crate::error::BoxError;
use crate::token::Token;
use crate::token_source::TokenSource;
use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

/// Caches the token of an inner source until it is no longer valid.
///
/// The cache lock is held while the inner source fetches, so concurrent
/// callers that find the token missing or expired wait for a single refresh
/// instead of each calling the token endpoint. Failed fetches are not cached.
pub struct ReuseTokenSource<S> {
    current: Mutex<Option<Token>>,
    new: S,
}

impl<S: TokenSource> ReuseTokenSource<S> {
    pub fn new(source: S) -> Self {
        Self::with_token(None, source)
    }

    /// Starts from an already issued token, used until it expires
    pub fn with_token(token: Option<Token>, source: S) -> Self {
        Self {
            current: Mutex::new(token),
            new: source,
        }
    }
}

#[async_trait]
impl<S: TokenSource> TokenSource for ReuseTokenSource<S> {
    async fn token(&self) -> Result<Token, BoxError> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref().filter(|t| t.valid()) {
            return Ok(token.clone());
        }

        debug!("Cached token is missing or expired, fetching a new one");
        let token = self.new.token().await?;
        *current = Some(token.clone());
        Ok(token)
    }
}
