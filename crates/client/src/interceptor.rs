//! Per-request hooks applied by [`crate::ApiClient`] right before dispatch.

use moderation_auth::SessionStore;
use reqwest::RequestBuilder;

/// Supplies the current access token; `""` means anonymous.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> String;
}

impl TokenSource for SessionStore {
    fn access_token(&self) -> String {
        SessionStore::access_token(self)
    }
}

/// Hook invoked synchronously on every outgoing request.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Attaches `Authorization: Bearer <token>` when a token is available.
///
/// Resolves the token on every call, so a login or logout takes effect on the
/// next request without rebuilding the client.
#[derive(Debug, Clone)]
pub struct BearerAuth<S> {
    source: S,
}

impl<S: TokenSource> BearerAuth<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: TokenSource> RequestInterceptor for BearerAuth<S> {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.source.access_token();
        if token.is_empty() {
            request
        } else {
            request.bearer_auth(token)
        }
    }
}
