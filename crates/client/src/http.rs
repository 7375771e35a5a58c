//! HTTP plumbing shared by every endpoint wrapper.

use std::fmt;
use std::sync::Arc;

use moderation_auth::{SessionStore, TokenPair};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth_api::AuthApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, parse_detail};
use crate::interceptor::{BearerAuth, RequestInterceptor};
use crate::resources::{ItemsApi, ListPage, ListRequest, Resource, UsersApi};

/// Handle to the backend. Cheap to clone; clones share the session and the
/// connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionStore,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
    /// Serializes refresh attempts so concurrent 401s renew only once.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url)
            .field("interceptors", &self.inner.interceptors.len())
            .finish()
    }
}

impl ApiClient {
    /// Client that authorizes requests from `session`.
    pub fn new(config: ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let bearer: Arc<dyn RequestInterceptor> = Arc::new(BearerAuth::new(session.clone()));
        Self::with_interceptors(config, session, vec![bearer])
    }

    /// Client with an explicit interceptor chain, applied in order.
    pub fn with_interceptors(
        config: ClientConfig,
        session: SessionStore,
        interceptors: Vec<Arc<dyn RequestInterceptor>>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Build(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                session,
                interceptors,
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn items(&self) -> ItemsApi<'_> {
        ItemsApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn health(&self) -> bool {
        let Ok(url) = self.endpoint("", &["health"], false) else {
            return false;
        };
        match self.inner.http.head(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!("health check failed: {err}");
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // URLs
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) fn api_endpoint(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, ApiError> {
        self.endpoint(&self.inner.config.api_prefix, segments, trailing_slash)
    }

    pub(crate) fn auth_endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        self.endpoint(&self.inner.config.auth_prefix, segments, false)
    }

    /// `{api_url}{prefix}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, prefix: &str, segments: &[&str], trailing_slash: bool) -> Result<Url, ApiError> {
        let base = format!("{}{}", self.inner.config.api_url, prefix);
        let mut url = Url::parse(&base).map_err(|e| ApiError::Build(format!("{base}: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Build(format!("{base}: not a hierarchical URL")))?;
            path.pop_if_empty().extend(segments);
            if trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Send an authorized request.
    ///
    /// A 401 on a request that carried a token triggers one refresh and one
    /// resend. If the session cannot be renewed it is cleared.
    pub(crate) async fn execute<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let sent_with = self.inner.session.access_token();
        let response = self.dispatch(build(&self.inner.http)).await?;

        if response.status() != StatusCode::UNAUTHORIZED || sent_with.is_empty() {
            return check_status(response).await;
        }

        let detail = parse_detail(&response.text().await.unwrap_or_default());
        if let Err(err) = self.renew_session(&sent_with).await {
            tracing::info!("session could not be renewed, signing out: {err}");
            self.inner.session.clear_auth_data();
            return Err(ApiError::Unauthorized(detail));
        }

        let retried = self.dispatch(build(&self.inner.http)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("request rejected after token refresh, signing out");
            self.inner.session.clear_auth_data();
        }
        check_status(retried).await
    }

    /// Send a request without interceptors or 401 handling.
    pub(crate) async fn execute_anonymous(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(network)?;
        check_status(response).await
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = self
            .inner
            .interceptors
            .iter()
            .fold(request, |request, interceptor| interceptor.intercept(request));
        request.send().await.map_err(network)
    }

    async fn renew_session(&self, sent_with: &str) -> Result<(), ApiError> {
        let _guard = self.inner.refresh_lock.lock().await;

        let current = self.inner.session.access_token();
        if !current.is_empty() && current != sent_with {
            tracing::debug!("session already renewed by a concurrent request");
            return Ok(());
        }

        self.refresh_tokens().await.map(|_| ())
    }

    /// Exchange the stored refresh token for a new pair and save it.
    pub(crate) async fn refresh_tokens(&self) -> Result<TokenPair, ApiError> {
        let refresh_token = self.inner.session.refresh_token();
        if refresh_token.is_empty() {
            return Err(ApiError::Unauthorized(None));
        }

        let url = self.auth_endpoint(&["refresh"])?;
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let response = self
            .execute_anonymous(self.inner.http.post(url).json(&body))
            .await?;
        let tokens: TokenPair = parse_json(response).await?;

        self.inner.session.save_token_pair(&tokens);
        tracing::info!("access token refreshed");
        Ok(tokens)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    // ─────────────────────────────────────────────────────────────────────
    // Typed helpers
    // ─────────────────────────────────────────────────────────────────────

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self.execute(|http| http.get(url.clone())).await?;
        parse_json(response).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, url: Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, %method, "sending");
        let response = self
            .execute(|http| http.request(method.clone(), url.clone()).json(body))
            .await?;
        parse_json(response).await
    }

    pub(crate) async fn delete(&self, url: Url) -> Result<(), ApiError> {
        tracing::debug!(%url, "DELETE");
        self.execute(|http| http.delete(url.clone())).await?;
        Ok(())
    }

    /// Fetch one page of `R`.
    pub async fn list<R: Resource>(&self, request: &ListRequest) -> Result<ListPage<R::Record>, ApiError> {
        let url = self.api_endpoint(&[R::PATH], true)?;
        let query = request.query_pairs();
        tracing::debug!(%url, seq = request.seq, skip = request.skip, limit = request.limit, "list");

        let response = self.execute(|http| http.get(url.clone()).query(&query)).await?;
        let body: serde_json::Value = parse_json(response).await?;

        let records = match body.get(R::COLLECTION_KEY) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<R::Record>>(value.clone())
                .map_err(|e| ApiError::Parse(format!("{}: {e}", R::COLLECTION_KEY)))?,
        };
        let total = body
            .get("total")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(records.len() as u64);

        Ok(ListPage { records, total })
    }
}

fn network(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = parse_detail(&body);
    tracing::debug!(status = status.as_u16(), ?detail, "request failed");

    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(detail),
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(detail),
        _ => ApiError::Api { status: status.as_u16(), detail },
    })
}

pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await.map_err(network)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
}
