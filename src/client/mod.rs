// ABOUTME: Guarded API client binding token store, transport, navigator and configuration
// ABOUTME: Runs gate check, send, and the single 401 refresh-and-replay for every call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! # Guarded API client
//!
//! [`ApiClient`] is the factory product that replaces ambient global token
//! state: the [`SessionStore`], the [`HttpTransport`] and the [`Navigator`]
//! are all injected, and every clone of the client shares them.
//!
//! ```text
//! send(request)
//!   gate.authorize ──deny──▶ LocalAuthorization / UndeclaredEndpoint
//!   transport.execute
//!   401 and not retried?
//!     coordinator.coordinate(refresh) ──fail──▶ clear store, redirect, SessionExpired
//!     replay (same request id, gate again) ──▶ result, a second 401 is returned as-is
//! ```

/// Client error taxonomy
pub mod error;
/// Request/response types and the transport seam
pub mod transport;

pub use error::{ClientError, TransportError};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

use crate::config::ClientConfig;
use crate::constants::paths;
use crate::guard::{GateDecision, RefreshCoordinator, RefreshMode, RefreshState, RequestGate};
use crate::logging::AppLogger;
use crate::models::{RefreshRequest, RefreshResponse};
use crate::navigation::{Navigator, TracingNavigator};
use crate::permissions::EndpointCatalog;
use crate::session::{decode_session, MemorySessionStore, Session, SessionStore, TokenKind};
use crate::utils::http_client::create_client;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, warn};

/// Assembles an [`ApiClient`]
pub struct ApiClientBuilder {
    transport: Arc<dyn HttpTransport>,
    store: Option<Arc<dyn SessionStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    catalog: EndpointCatalog,
    refresh_mode: RefreshMode,
}

impl ApiClientBuilder {
    /// Token store; defaults to an empty in-memory store
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Redirect handler; defaults to [`TracingNavigator`]
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Endpoint table used by the gate; defaults to the standard catalog
    #[must_use]
    pub fn catalog(mut self, catalog: EndpointCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Concurrent refresh behaviour
    #[must_use]
    pub const fn refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> ApiClient {
        ApiClient {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
                navigator: self
                    .navigator
                    .unwrap_or_else(|| Arc::new(TracingNavigator)),
                gate: RequestGate::new(self.catalog),
                coordinator: RefreshCoordinator::new(self.refresh_mode),
                default_token: RwLock::new(None),
            }),
        }
    }
}

struct ClientInner {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    gate: RequestGate,
    coordinator: RefreshCoordinator,
    // Equivalent of a default `Authorization` header, holds the bare token
    default_token: RwLock<Option<String>>,
}

/// HTTP client with the session and access guard applied to every call
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("refresh_mode", &self.inner.coordinator.mode())
            .field("refresh_state", &self.inner.coordinator.state())
            .field("has_default_authorization", &self.default_token().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Start building a client around `transport`
    pub fn builder(transport: Arc<dyn HttpTransport>) -> ApiClientBuilder {
        ApiClientBuilder {
            transport,
            store: None,
            navigator: None,
            catalog: EndpointCatalog::standard(),
            refresh_mode: RefreshMode::default(),
        }
    }

    /// Builder preloaded with a `reqwest` transport and the configured refresh mode
    #[must_use]
    pub fn for_config(config: &ClientConfig) -> ApiClientBuilder {
        let transport = ReqwestTransport::new(create_client(&config.http), config.base_url.clone());
        Self::builder(Arc::new(transport)).refresh_mode(config.refresh_mode)
    }

    /// Token store shared by every clone of this client
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    /// Redirect handler
    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    /// Request gate
    #[must_use]
    pub fn gate(&self) -> &RequestGate {
        &self.inner.gate
    }

    /// `Refreshing` while a refresh call is outstanding
    #[must_use]
    pub fn refresh_state(&self) -> RefreshState {
        self.inner.coordinator.state()
    }

    /// Refresh calls issued by this client so far
    #[must_use]
    pub fn refreshes_performed(&self) -> u64 {
        self.inner.coordinator.refreshes_performed()
    }

    /// Session decoded from the stored access token
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the token store cannot be read
    pub fn session(&self) -> Result<Option<Session>, ClientError> {
        let token = self.inner.store.get(TokenKind::Access)?;
        Ok(decode_session(token.as_deref()))
    }

    /// Gate decision for `method path` under the current session, without sending
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the token store cannot be read
    pub fn check(&self, method: &Method, path: &str) -> Result<GateDecision, ClientError> {
        let session = self.session()?;
        Ok(self.inner.gate.check(session.as_ref(), method, path))
    }

    /// Current default `Authorization` header value
    #[must_use]
    pub fn default_authorization(&self) -> Option<String> {
        self.default_token().map(|token| format!("Bearer {token}"))
    }

    fn default_token(&self) -> Option<String> {
        self.inner
            .default_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_default_token(&self, token: Option<&str>) {
        *self
            .inner
            .default_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token.map(str::to_owned);
    }

    /// Send `request` through the guard
    ///
    /// Non-2xx responses become [`ClientError::Status`]. A first 401 triggers
    /// one refresh and one replay; the replay's outcome is returned.
    ///
    /// # Errors
    ///
    /// Returns a local denial, a transport failure, [`ClientError::SessionExpired`]
    /// when the refresh fails, or the status error of the final response
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let (response, sent_with) = self.dispatch(&request).await?;
        if response.status != StatusCode::UNAUTHORIZED || request.retried {
            return response.error_for_status(&request.path);
        }

        debug!(
            path = %request.path,
            request_id = %request.request_id,
            "401 received, refreshing access token"
        );
        self.refresh_access_token(sent_with.as_deref()).await?;

        let (replayed, _) = self.dispatch(&request.replay()).await?;
        replayed.error_for_status(&request.path)
    }

    /// Send `request` and decode a JSON response
    ///
    /// # Errors
    ///
    /// Returns any [`send`](Self::send) error, or [`ClientError::Decode`]
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let path = request.path.clone();
        self.send(request).await?.json(&path)
    }

    /// `GET path` decoded as `T`
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json)
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send_json(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body, decoded as `T`
    ///
    /// # Errors
    ///
    /// See [`send_json`](Self::send_json)
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// `stale` is the access token the failed request carried. On failure the
    /// local session is ended and the user redirected to login.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionExpired`] wrapping the refresh failure
    pub async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, ClientError> {
        let outcome = self
            .inner
            .coordinator
            .coordinate(stale, self.inner.store.as_ref(), || {
                self.exchange_refresh_token()
            })
            .await;
        outcome.map_err(|cause| self.expire_session(cause))
    }

    /// Send without gate or refresh; for authentication and health calls
    pub(crate) async fn send_unguarded(
        &self,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ClientError> {
        self.transmit(request).await
    }

    /// Clear tokens and the default header, then redirect to login
    ///
    /// Header and redirect happen even when clearing the store fails.
    pub(crate) fn end_session(&self) -> Result<(), ClientError> {
        let cleared = self.inner.store.clear();
        self.set_default_token(None);
        self.inner.navigator.redirect_to_login();
        cleared.map_err(ClientError::from)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
    ) -> Result<(ApiResponse, Option<String>), ClientError> {
        let stored = self.inner.store.get(TokenKind::Access)?;
        let session = decode_session(stored.as_deref());
        self.inner
            .gate
            .authorize(session.as_ref(), &request.method, &request.path)?;

        let mut outbound = request.clone();
        if outbound.bearer.is_none() {
            outbound.bearer = stored.or_else(|| self.default_token());
        }
        let response = self.transmit(&outbound).await?;
        Ok((response, outbound.bearer))
    }

    async fn transmit(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let started = Instant::now();
        let response = self
            .inner
            .transport
            .execute(request)
            .await
            .map_err(|source| ClientError::Transport {
                path: request.path.clone(),
                source,
            })?;
        AppLogger::log_api_request(
            request.method.as_str(),
            &request.path,
            response.status.as_u16(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            &request.request_id.to_string(),
            request.retried,
        );
        Ok(response)
    }

    async fn exchange_refresh_token(&self) -> Result<String, ClientError> {
        let refresh = self
            .inner
            .store
            .get(TokenKind::Refresh)?
            .ok_or_else(|| ClientError::SessionExpired {
                reason: "no refresh token stored".to_owned(),
                source: None,
            })?;

        let request = ApiRequest::post(paths::TOKEN_REFRESH).json(&RefreshRequest {
            refresh: &refresh,
        })?;
        let body: RefreshResponse = self
            .transmit(&request)
            .await?
            .error_for_status(paths::TOKEN_REFRESH)?
            .json(paths::TOKEN_REFRESH)?;

        self.inner.store.set(TokenKind::Access, &body.access)?;
        if let Some(rotated) = body.refresh.as_deref() {
            self.inner.store.set(TokenKind::Refresh, rotated)?;
        }
        self.set_default_token(Some(&body.access));
        AppLogger::log_session_event("token_refresh", true, None);
        Ok(body.access)
    }

    fn expire_session(&self, cause: ClientError) -> ClientError {
        AppLogger::log_session_event("session_expired", false, Some(&cause.to_string()));
        if let Err(e) = self.end_session() {
            warn!(error = %e, "failed to clear tokens after refresh failure");
        }
        match cause {
            expired @ ClientError::SessionExpired { .. } => expired,
            other => ClientError::SessionExpired {
                reason: "token refresh failed".to_owned(),
                source: Some(Box::new(other)),
            },
        }
    }
}
