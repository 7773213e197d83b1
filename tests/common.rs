// ABOUTME: Shared test utilities for the session guard integration tests
// ABOUTME: Provides token minting, an in-process mock fee backend, and client wiring helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `college_fee_client`
//!
//! The mock backend speaks just enough of the fee API to exercise the guard:
//! login, refresh, logout, `/auth/me/`, `/test/`, and a catch-all data route
//! that answers 200 only for access tokens it issued itself.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use college_fee_client::{
    client::{ApiClient, ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, TransportError},
    constants::paths,
    guard::RefreshMode,
    models::TokenPair,
    navigation::RecordingNavigator,
    session::{MemorySessionStore, SessionStore},
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use url::Url;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

const SIGNING_SECRET: &[u8] = b"mock-backend-signing-secret";

static TOKEN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Claims placed in a minted access token
#[derive(Debug, Clone)]
pub struct TestClaims {
    pub user_id: i64,
    pub role: &'static str,
    pub usn: Option<&'static str>,
    pub email: Option<&'static str>,
    pub permissions: Vec<&'static str>,
    pub ttl_secs: i64,
}

impl TestClaims {
    pub fn admin() -> Self {
        Self {
            user_id: 1,
            role: "admin",
            usn: None,
            email: Some("admin@college.edu"),
            permissions: Vec::new(),
            ttl_secs: 300,
        }
    }

    pub fn finance() -> Self {
        Self {
            user_id: 2,
            role: "finance",
            email: Some("accounts@college.edu"),
            ..Self::admin()
        }
    }

    pub fn hod() -> Self {
        Self {
            user_id: 3,
            role: "hod",
            email: Some("hod.cse@college.edu"),
            ..Self::admin()
        }
    }

    pub fn student() -> Self {
        Self {
            user_id: 42,
            role: "student",
            usn: Some("1XX21CS042"),
            email: Some("student@college.edu"),
            permissions: vec!["view_own_data"],
            ttl_secs: 300,
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: &[&'static str]) -> Self {
        self.permissions = permissions.to_vec();
        self
    }

    #[must_use]
    pub fn expired(mut self) -> Self {
        self.ttl_secs = -60;
        self
    }
}

/// Sign an HS256 access token carrying `claims`; every call yields a distinct token
pub fn mint_token(claims: &TestClaims) -> String {
    let now = chrono::Utc::now().timestamp();
    let mut payload = json!({
        "token_type": "access",
        "user_id": claims.user_id,
        "role": claims.role,
        "permissions": claims.permissions,
        "iat": now,
        "exp": now + claims.ttl_secs,
        "jti": TOKEN_SEQ.fetch_add(1, Ordering::SeqCst).to_string(),
    });
    if let Some(usn) = claims.usn {
        payload["usn"] = json!(usn);
    }
    if let Some(email) = claims.email {
        payload["email"] = json!(email);
    }
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(SIGNING_SECRET),
    )
    .expect("sign test token")
}

/// How the mock answers `POST /auth/token/refresh/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshBehavior {
    /// Issue a fresh access token
    Issue,
    /// Issue a fresh access token and rotate the refresh token
    Rotate,
    /// Reject with 401 `token_not_valid`
    Reject,
    /// Answer 200 with an HTML page instead of JSON
    Garbage,
}

/// Observable state of the mock backend
pub struct MockState {
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub data_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    /// `x-request-id` of every data call, in arrival order
    pub request_ids: Mutex<Vec<String>>,
    /// `Authorization` header of every data call, in arrival order
    pub authorizations: Mutex<Vec<Option<String>>>,
    /// Refresh tokens presented to the refresh endpoint
    pub refresh_tokens_seen: Mutex<Vec<String>>,
    /// JSON bodies received by the login endpoints
    pub login_bodies: Mutex<Vec<Value>>,
    valid_access: Mutex<HashSet<String>>,
    refresh_behavior: Mutex<RefreshBehavior>,
    refresh_delay_ms: AtomicU64,
    refresh_claims: Mutex<TestClaims>,
    always_unauthorized: Mutex<bool>,
    logout_status: Mutex<StatusCode>,
}

impl MockState {
    fn new() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            request_ids: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            login_bodies: Mutex::new(Vec::new()),
            valid_access: Mutex::new(HashSet::new()),
            refresh_behavior: Mutex::new(RefreshBehavior::Issue),
            refresh_delay_ms: AtomicU64::new(0),
            refresh_claims: Mutex::new(TestClaims::admin()),
            always_unauthorized: Mutex::new(false),
            logout_status: Mutex::new(StatusCode::OK),
        }
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if *self.always_unauthorized.lock().unwrap() {
            return false;
        }
        bearer_of(headers).is_some_and(|token| self.valid_access.lock().unwrap().contains(&token))
    }

    fn issue(&self, claims: &TestClaims) -> String {
        let token = mint_token(claims);
        self.valid_access.lock().unwrap().insert(token.clone());
        token
    }
}

fn bearer_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })),
    )
}

/// In-process fee backend bound to an ephemeral localhost port
pub struct MockBackend {
    pub state: Arc<MockState>,
    base_url: Url,
}

impl MockBackend {
    /// Start the backend; it runs until the test's runtime shuts down
    pub async fn start() -> Self {
        init_test_logging();
        let state = Arc::new(MockState::new());
        let app = Router::new()
            .route("/api/auth/login/", post(login))
            .route("/api/auth/admin/login/", post(login))
            .route("/api/auth/student/login/", post(login))
            .route("/api/auth/token/refresh/", post(refresh))
            .route("/api/auth/logout/", post(logout))
            .route("/api/auth/me/", get(me))
            .route("/api/test/", get(health))
            .fallback(data)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        let base_url = Url::parse(&format!("http://{addr}/api")).expect("mock base url");
        Self { state, base_url }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Access token the backend will accept
    pub fn issue_access(&self, claims: &TestClaims) -> String {
        self.state.issue(claims)
    }

    /// Token pair whose access token the backend already accepts
    pub fn valid_pair(&self, claims: &TestClaims) -> TokenPair {
        TokenPair {
            access_token: self.issue_access(claims),
            refresh_token: "refresh-initial".to_owned(),
        }
    }

    /// Token pair whose access token decodes locally but the backend rejects
    pub fn stale_pair(claims: &TestClaims) -> TokenPair {
        TokenPair {
            access_token: mint_token(claims),
            refresh_token: "refresh-initial".to_owned(),
        }
    }

    pub fn set_refresh_behavior(&self, behavior: RefreshBehavior) {
        *self.state.refresh_behavior.lock().unwrap() = behavior;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.state
            .refresh_delay_ms
            .store(u64::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
    }

    /// Claims of the tokens the refresh endpoint issues
    pub fn set_refresh_claims(&self, claims: TestClaims) {
        *self.state.refresh_claims.lock().unwrap() = claims;
    }

    pub fn reject_all_access_tokens(&self) {
        *self.state.always_unauthorized.lock().unwrap() = true;
    }

    pub fn set_logout_status(&self, status: StatusCode) {
        *self.state.logout_status.lock().unwrap() = status;
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.state.data_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.state.logout_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.state.login_calls.load(Ordering::SeqCst)
    }

    pub fn request_ids(&self) -> Vec<String> {
        self.state.request_ids.lock().unwrap().clone()
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.state.authorizations.lock().unwrap().clone()
    }
}

async fn login(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    state.login_bodies.lock().unwrap().push(body.clone());

    if body.get("password").and_then(Value::as_str) != Some("correct-horse") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid credentials" })),
        );
    }

    let (claims, user) = if uri.path().contains("/student/") {
        let claims = TestClaims::student();
        let user = json!({
            "id": claims.user_id,
            "role": "student",
            "usn": claims.usn,
            "email": claims.email,
            "name": "Asha Rao",
        });
        (claims, user)
    } else {
        let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
        let claims = if email.starts_with("hod") {
            TestClaims::hod()
        } else if email.starts_with("accounts") {
            TestClaims::finance()
        } else {
            TestClaims::admin()
        };
        let user = json!({
            "id": claims.user_id,
            "role": claims.role,
            "email": email,
        });
        (claims, user)
    };

    let access = state.issue(&claims);
    (
        StatusCode::OK,
        Json(json!({
            "access": access,
            "refresh": format!("refresh-for-{}", claims.user_id),
            "user": user,
        })),
    )
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(token) = body.get("refresh").and_then(Value::as_str) {
        state
            .refresh_tokens_seen
            .lock()
            .unwrap()
            .push(token.to_owned());
    }

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let behavior = *state.refresh_behavior.lock().unwrap();
    match behavior {
        RefreshBehavior::Reject => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "detail": "Token is invalid or expired",
                    "code": "token_not_valid"
                })),
            )
                .into_response();
        }
        RefreshBehavior::Garbage => {
            return (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html")],
                "<html><body>502 Bad Gateway</body></html>",
            )
                .into_response();
        }
        RefreshBehavior::Issue | RefreshBehavior::Rotate => {}
    }

    let claims = state.refresh_claims.lock().unwrap().clone();
    let access = state.issue(&claims);
    let body = if behavior == RefreshBehavior::Rotate {
        json!({ "access": access, "refresh": format!("rotated-{}", TOKEN_SEQ.load(Ordering::SeqCst)) })
    } else {
        json!({ "access": access })
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn logout(State(state): State<Arc<MockState>>) -> (StatusCode, Json<Value>) {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    let status = *state.logout_status.lock().unwrap();
    (status, Json(json!({ "message": "Logged out" })))
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": 1,
            "role": "admin",
            "email": "admin@college.edu",
            "name": "Registrar",
        })),
    )
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Backend is working!" }))
}

async fn data(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.data_calls.fetch_add(1, Ordering::SeqCst);
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    state.request_ids.lock().unwrap().push(request_id);
    state.authorizations.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    );

    if !state.is_authorized(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "results": [],
        })),
    )
}

/// A client wired to `backend` with an inspectable store and navigator
pub struct TestClient {
    pub client: ApiClient,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl TestClient {
    pub fn new(base_url: Url, mode: RefreshMode, tokens: Option<&TokenPair>) -> Self {
        let transport = ReqwestTransport::new(reqwest::Client::new(), base_url);
        Self::with_transport(Arc::new(transport), mode, tokens)
    }

    /// Client whose refresh calls go to a port nothing listens on
    pub async fn with_dead_refresh_endpoint(
        base_url: Url,
        mode: RefreshMode,
        tokens: Option<&TokenPair>,
    ) -> Self {
        let http = reqwest::Client::new();
        let transport = SplitRefreshTransport {
            api: ReqwestTransport::new(http.clone(), base_url),
            refresh: ReqwestTransport::new(http, unreachable_base_url().await),
        };
        Self::with_transport(Arc::new(transport), mode, tokens)
    }

    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        mode: RefreshMode,
        tokens: Option<&TokenPair>,
    ) -> Self {
        let store = Arc::new(tokens.map_or_else(MemorySessionStore::new, MemorySessionStore::with_tokens));
        let navigator = Arc::new(RecordingNavigator::new());
        let client = ApiClient::builder(transport)
            .store(store.clone())
            .navigator(navigator.clone())
            .refresh_mode(mode)
            .build();
        Self {
            client,
            store,
            navigator,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store
            .get(college_fee_client::session::TokenKind::Access)
            .unwrap()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store
            .get(college_fee_client::session::TokenKind::Refresh)
            .unwrap()
    }
}

/// Sends the refresh call through `refresh` and everything else through `api`
struct SplitRefreshTransport {
    api: ReqwestTransport,
    refresh: ReqwestTransport,
}

#[async_trait::async_trait]
impl HttpTransport for SplitRefreshTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        if request.path == paths::TOKEN_REFRESH {
            self.refresh.execute(request).await
        } else {
            self.api.execute(request).await
        }
    }
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/api")).unwrap()
}
