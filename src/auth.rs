// ABOUTME: Authentication service: login, logout, session restore and role/permission queries
// ABOUTME: Also authorizes client-side routes by role, redirecting through the Navigator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! # Authentication
//!
//! Login calls go straight to the transport: a 401 from a login endpoint
//! means bad credentials and must not start a token refresh. Everything
//! else (`/auth/me/` included) goes through the guarded client.

use crate::client::{ApiClient, ApiRequest, ClientError};
use crate::constants::paths;
use crate::logging::AppLogger;
use crate::models::{Credentials, LoginResponse, LoginResponseBody, Role, TokenPair, UserProfile};
use crate::session::{Session, TokenKind};
use serde_json::json;
use tracing::{debug, warn};

/// Outcome of a route authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Session may view the route
    Granted(Session),
    /// No session; the user was sent to login
    RedirectLogin,
    /// Session's role is not allowed; the user was sent to the unauthorized page
    RedirectUnauthorized,
}

/// Login, logout and session queries on top of an [`ApiClient`]
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Service sharing `client`'s store, transport and navigator
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Underlying guarded client
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Authenticate and store the returned token pair
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for rejected credentials, a transport
    /// or decode error, or a store error if the tokens cannot be saved
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        let (path, body, identifier) = match credentials {
            Credentials::Student {
                usn_or_email,
                password,
            } => (
                paths::STUDENT_LOGIN,
                json!({ "usn_or_email": usn_or_email, "password": password }),
                usn_or_email,
            ),
            Credentials::Admin { email, password } => (
                paths::ADMIN_LOGIN,
                json!({ "email": email, "password": password }),
                email,
            ),
            Credentials::Staff { email, password } => (
                paths::LOGIN,
                json!({ "email": email, "password": password }),
                email,
            ),
        };

        let request = ApiRequest::post(path).json_value(body);
        let result = async {
            self.client
                .send_unguarded(&request)
                .await?
                .error_for_status(path)?
                .json::<LoginResponseBody>(path)
        }
        .await;

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                AppLogger::log_auth_event(identifier, "login", false, Some(&e.to_string()));
                return Err(e);
            }
        };

        let tokens = TokenPair {
            access_token: body.access,
            refresh_token: body.refresh,
        };
        self.client.store().store_pair(&tokens)?;
        self.client.set_default_token(Some(&tokens.access_token));
        AppLogger::log_auth_event(&body.user.id, "login", true, Some(body.user.role.as_str()));

        Ok(LoginResponse {
            tokens,
            user: body.user,
        })
    }

    /// End the session: best-effort backend logout, then local cleanup and redirect
    ///
    /// A failing backend call is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] only if the tokens could not be removed
    pub async fn logout(&self) -> Result<(), ClientError> {
        let refresh = self
            .client
            .store()
            .get(TokenKind::Refresh)
            .unwrap_or_else(|e| {
                warn!(error = %e, "could not read refresh token for backend logout");
                None
            });
        let access = self.client.store().get(TokenKind::Access).ok().flatten();

        if let Some(refresh) = refresh {
            let mut request = ApiRequest::post(paths::LOGOUT).json_value(json!({ "refresh": refresh }));
            request.bearer = access;
            match self.client.send_unguarded(&request).await {
                Ok(response) if response.is_success() => debug!("backend logout accepted"),
                Ok(response) => warn!(
                    status = %response.status,
                    "backend logout rejected, clearing local session anyway"
                ),
                Err(e) => warn!(error = %e, "backend logout failed, clearing local session anyway"),
            }
        }

        let user = self
            .current_session()
            .ok()
            .flatten()
            .map_or_else(|| "anonymous".to_owned(), |s| s.id);
        let cleared = self.client.end_session();
        AppLogger::log_auth_event(&user, "logout", cleared.is_ok(), None);
        cleared
    }

    /// Re-establish the user from stored tokens via `/auth/me/`
    ///
    /// Returns `None` when no token pair is stored or the backend rejects it,
    /// in which case the stored tokens are removed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the token store cannot be accessed
    pub async fn restore(&self) -> Result<Option<UserProfile>, ClientError> {
        if self.client.store().token_pair()?.is_none() {
            return Ok(None);
        }
        match self.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "stored session could not be restored");
                self.client.store().clear()?;
                self.client.set_default_token(None);
                Ok(None)
            }
        }
    }

    /// Profile of the logged-in user
    ///
    /// # Errors
    ///
    /// Returns any guarded-call error from `/auth/me/`
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.client.get_json(paths::ME).await
    }

    /// Session decoded from the stored access token
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the token store cannot be read
    pub fn current_session(&self) -> Result<Option<Session>, ClientError> {
        self.client.session()
    }

    /// Whether the current session holds `permission`; false without a session
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.session_or_none()
            .is_some_and(|s| s.has_permission(permission))
    }

    /// Whether the current session has `role`; false without a session
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.session_or_none().is_some_and(|s| s.role == role)
    }

    /// Check a route restricted to `allowed` roles (empty means any logged-in user)
    ///
    /// Redirects through the navigator when access is not granted.
    #[must_use]
    pub fn authorize_route(&self, allowed: &[Role]) -> RouteAccess {
        let Some(session) = self.session_or_none() else {
            self.client.navigator().redirect_to_login();
            return RouteAccess::RedirectLogin;
        };
        if !allowed.is_empty() && !allowed.contains(&session.role) {
            AppLogger::log_security_event(
                "route_denied",
                "low",
                &format!("role {} not in {allowed:?}", session.role),
                Some(&session.id),
            );
            self.client.navigator().redirect_to_unauthorized();
            return RouteAccess::RedirectUnauthorized;
        }
        RouteAccess::Granted(session)
    }

    fn session_or_none(&self) -> Option<Session> {
        self.current_session().unwrap_or_else(|e| {
            warn!(error = %e, "token store unreadable, treating caller as anonymous");
            None
        })
    }
}
