//! The token-refreshing API client.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{AuthError, Error, InvalidInputError, TransportError};
use crate::listener::{NoopListener, TokenListener};
use crate::refresh::{LeaderGuard, RefreshGate, RefreshOutcome, Ticket};
use crate::tokens::{AccessToken, RefreshToken, TokenPair};
use crate::transport::{AUTHORIZATION, ApiRequest, ApiResponse, Transport};
use crate::Result;

/// API client that refreshes expired access tokens transparently.
///
/// `ApiSdk` wraps a [`Transport`]. A request answered with `401` while a
/// refresh token is held joins the current refresh (or starts one) and is
/// replayed with the new access token once it lands. When the refresh fails,
/// tokens are cleared and every caller caught in the storm receives
/// [`AuthError::RefreshFailed`]. Any other error is returned unchanged.
///
/// # Thread Safety
///
/// Cheap to clone (internal `Arc`) and safe to share across tasks. All clones
/// share one refresh gate, so concurrent callers never issue more than one
/// refresh call at a time.
pub struct ApiSdk<T> {
    inner: Arc<SdkInner<T>>,
}

struct SdkInner<T> {
    transport: T,
    config: ClientConfig,
    refresh_token: RwLock<Option<RefreshToken>>,
    gate: RefreshGate,
    listener: Box<dyn TokenListener>,
}

impl<T> Clone for ApiSdk<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`ApiSdk`].
pub struct ApiSdkBuilder<T> {
    transport: T,
    config: ClientConfig,
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    listener: Box<dyn TokenListener>,
}

impl<T: Transport> ApiSdkBuilder<T> {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Access token to install at construction.
    pub fn access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Refresh token to hold at construction.
    pub fn refresh_token(mut self, token: RefreshToken) -> Self {
        self.refresh_token = Some(token);
        self
    }

    /// Listener told about every token change.
    pub fn listener(mut self, listener: impl TokenListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    /// Closure told about every token change.
    pub fn on_tokens_change<F>(self, callback: F) -> Self
    where
        F: Fn(Option<&AccessToken>, Option<&RefreshToken>) + Send + Sync + 'static,
    {
        self.listener(callback)
    }

    /// Build the client. Initial tokens are installed without notifying the
    /// listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token cannot be used as a header value.
    pub fn build(self) -> Result<ApiSdk<T>> {
        if let Some(ref access) = self.access_token {
            self.transport
                .set_header(AUTHORIZATION, &self.config.authorization_value(access.as_str()))?;
        }

        Ok(ApiSdk {
            inner: Arc::new(SdkInner {
                transport: self.transport,
                config: self.config,
                refresh_token: RwLock::new(self.refresh_token),
                gate: RefreshGate::new(),
                listener: self.listener,
            }),
        })
    }
}

impl<T: Transport> ApiSdk<T> {
    /// Start building a client over `transport`.
    pub fn builder(transport: T) -> ApiSdkBuilder<T> {
        ApiSdkBuilder {
            transport,
            config: ClientConfig::default(),
            access_token: None,
            refresh_token: None,
            listener: Box::new(NoopListener),
        }
    }

    /// Client with default config, no tokens and no listener.
    pub fn new(transport: T) -> Self {
        Self {
            inner: Arc::new(SdkInner {
                transport,
                config: ClientConfig::default(),
                refresh_token: RwLock::new(None),
                gate: RefreshGate::new(),
                listener: Box::new(NoopListener),
            }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Current access token, read back from the `Authorization` header.
    pub fn access_token(&self) -> Option<AccessToken> {
        let header = self.inner.transport.header(AUTHORIZATION)?;
        self.inner
            .config
            .strip_scheme(&header)
            .map(AccessToken::new)
    }

    /// Current refresh token.
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.inner
            .refresh_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true when an access token is installed.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Returns true while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.inner.gate.is_refreshing()
    }

    /// Install a token pair and notify the listener.
    ///
    /// Always notifies, even when the pair is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token cannot be used as a header value;
    /// nothing is changed in that case.
    pub fn set_tokens(&self, access: AccessToken, refresh: RefreshToken) -> Result<()> {
        self.inner.transport.set_header(
            AUTHORIZATION,
            &self.inner.config.authorization_value(access.as_str()),
        )?;
        *self
            .inner
            .refresh_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(refresh.clone());

        self.inner
            .listener
            .tokens_changed(Some(&access), Some(&refresh));
        Ok(())
    }

    /// Drop both tokens and notify the listener.
    ///
    /// Always notifies, even when nothing was held.
    pub fn clear_tokens(&self) {
        self.inner.transport.remove_header(AUTHORIZATION);
        *self
            .inner
            .refresh_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        self.inner.listener.tokens_changed(None, None);
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Send a request, refreshing and replaying on `401`.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut refreshes_left = self.inner.config.max_refresh_attempts;

        loop {
            let sent_with = self.access_token();
            let err = match self.inner.transport.send(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_unauthorized() {
                return Err(err);
            }
            if refreshes_left == 0 {
                debug!("unauthorized after refresh, giving up");
                return Err(err);
            }
            if self.refresh_token().is_none() {
                debug!("unauthorized without a refresh token");
                return Err(err);
            }

            refreshes_left -= 1;
            self.coordinate(sent_with.as_ref(), err).await?;
            debug!("replaying request with refreshed token");
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.execute(ApiRequest::post(path).with_body(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.execute(ApiRequest::put(path).with_body(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.execute(ApiRequest::patch(path).with_body(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// GET and decode the body.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.get(path).await?.json()
    }

    /// POST a serializable body and decode the response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.post(path, to_body(body)?).await?.json()
    }

    /// PUT a serializable body and decode the response.
    pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.put(path, to_body(body)?).await?.json()
    }

    /// PATCH a serializable body and decode the response.
    pub async fn patch_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.patch(path, to_body(body)?).await?.json()
    }

    /// Send without refresh handling.
    pub(crate) async fn send_direct(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.inner.transport.send(request).await
    }

    // ========================================================================
    // Refresh coordination
    // ========================================================================

    /// Force a refresh, sharing any refresh already in flight.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] without a refresh token,
    /// [`AuthError::RefreshFailed`] when the refresh call fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        if self.refresh_token().is_none() {
            return Err(AuthError::NotAuthenticated.into());
        }
        self.coordinate(None, AuthError::NotAuthenticated.into())
            .await
    }

    /// Join or lead the refresh for a request rejected with `401`.
    ///
    /// `Ok` means replay. `original` is returned when there turns out to be
    /// nothing to refresh with.
    async fn coordinate(&self, sent_with: Option<&AccessToken>, original: Error) -> Result<()> {
        loop {
            let ticket = self.inner.gate.enter(|| match (sent_with, self.access_token()) {
                (Some(sent), Some(current)) => sent != &current,
                _ => false,
            });

            match ticket {
                Ticket::Replay => {
                    debug!("access token replaced since request was sent");
                    return Ok(());
                }
                Ticket::Leader(guard) => return self.lead_refresh(guard, original).await,
                Ticket::Follower(waiter) => match waiter.wait().await {
                    Some(RefreshOutcome::Refreshed) => return Ok(()),
                    Some(RefreshOutcome::Failed) => return Err(AuthError::RefreshFailed.into()),
                    None => {
                        debug!("refresh abandoned, re-entering gate");
                        continue;
                    }
                },
            }
        }
    }

    async fn lead_refresh(&self, guard: LeaderGuard<'_>, original: Error) -> Result<()> {
        let Some(refresh_token) = self.refresh_token() else {
            // Cleared between the 401 and taking the lead.
            guard.finish(RefreshOutcome::Failed);
            return Err(original);
        };

        info!("access token rejected, refreshing session");

        let installed = match self.request_refresh(&refresh_token).await {
            Ok(pair) => {
                let (access, refresh) = pair.into_tokens();
                self.set_tokens(access, refresh)
            }
            Err(err) => Err(err),
        };

        match installed {
            Ok(()) => {
                let released = guard.finish(RefreshOutcome::Refreshed);
                info!(released, "session refreshed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing session");
                self.clear_tokens();
                guard.finish(RefreshOutcome::Failed);
                Err(AuthError::RefreshFailed.into())
            }
        }
    }

    /// The refresh call itself. Never wrapped by coordination.
    async fn request_refresh(&self, refresh_token: &RefreshToken) -> Result<TokenPair> {
        let request = ApiRequest::post(self.inner.config.refresh_path.as_str())
            .with_body(json!({ "refreshToken": refresh_token.as_str() }));

        let call = self.inner.transport.send(request);
        let response = match self.inner.config.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                Error::from(TransportError::Timeout {
                    duration_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })
            })??,
            None => call.await?,
        };

        response.json()
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| {
        InvalidInputError::Other {
            message: format!("request body is not serializable: {}", e),
        }
        .into()
    })
}

// Custom Debug impl that hides sensitive data
impl<T> fmt::Debug for ApiSdk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSdk")
            .field("config", &self.inner.config)
            .field("refreshing", &self.inner.gate.is_refreshing())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
