// ABOUTME: Request/response types and the HttpTransport seam used by the guarded client
// ABOUTME: Provides the reqwest-backed transport that talks to the fee backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use super::error::{ClientError, TransportError};
use crate::constants::headers;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// One outbound call, before the bearer token is attached
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, e.g. `/students/`
    pub path: String,
    /// Query parameters appended to the URL
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Access token sent as `Authorization: Bearer`
    pub bearer: Option<String>,
    /// Correlation id, shared by the original send and its replay
    pub request_id: Uuid,
    /// Set once the request has been replayed after a refresh
    pub retried: bool,
}

impl ApiRequest {
    /// Request for `method path` with a fresh correlation id
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            request_id: Uuid::new_v4(),
            retried: false,
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body from an already-built value
    #[must_use]
    pub fn json_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if `body` cannot be serialized
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::InvalidRequest(format!("body for {}: {e}", self.path)))?;
        Ok(self.json_value(value))
    }

    /// Attach an access token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Copy to be replayed after a refresh: same id, marked retried, token re-resolved
    #[must_use]
    pub fn replay(&self) -> Self {
        Self {
            bearer: None,
            retried: true,
            ..self.clone()
        }
    }
}

/// Status and raw body of a completed call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Response status
    pub status: StatusCode,
    /// Raw body
    pub body: Bytes,
}

impl ApiResponse {
    /// Response with a JSON body
    #[must_use]
    pub fn json_body(status: StatusCode, body: &Value) -> Self {
        Self {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    /// 2xx status
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as `T`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the body is not valid JSON for `T`
    pub fn json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|source| ClientError::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// Body as UTF-8 text, lossily
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Error message from a DRF-style body (`detail`, `error` or `message`)
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        let value: Value = serde_json::from_slice(&self.body).ok()?;
        ["detail", "error", "message"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::to_owned)
    }

    /// Turn a non-2xx response into [`ClientError::Status`]
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] unless the status is 2xx
    pub fn error_for_status(self, path: &str) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Status {
                status: self.status,
                path: path.to_owned(),
                detail: self.error_detail(),
            })
        }
    }
}

/// Sends a fully prepared request; the guard runs before this point
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute `request` and return whatever status the backend answered with
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] only when no response was received
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Transport backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Transport sending requests relative to `base_url`
    #[must_use]
    pub const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` and `path` joined with exactly one slash
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the joined string is not a URL
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|source| TransportError::InvalidUrl {
            url: joined,
            source,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(headers::REQUEST_ID, request.request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(ApiResponse { status, body })
    }
}
