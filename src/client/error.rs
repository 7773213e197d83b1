// ABOUTME: Error taxonomy of the guarded API client
// ABOUTME: Distinguishes local denials, transport failures, expired sessions and HTTP status errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use crate::guard::DenyReason;
use crate::session::StoreError;
use http::{Method, StatusCode};

/// Failure of the HTTP transport itself (nothing usable came back)
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `reqwest` failed to connect, send or read the body
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL and path do not form a valid URL
    #[error("invalid request URL '{url}'")]
    InvalidUrl {
        /// URL that failed to parse
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// Backend could not be reached (used by non-reqwest transports)
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

/// Errors returned by guarded API calls
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request gate refused the call; nothing was sent
    #[error("{method} {path} denied locally: {reason}")]
    LocalAuthorization {
        /// Method of the refused call
        method: Method,
        /// Path of the refused call
        path: String,
        /// Why it was refused
        reason: DenyReason,
    },

    /// The call matches no declared endpoint; nothing was sent
    #[error("{method} {path} is not a declared endpoint")]
    UndeclaredEndpoint {
        /// Method of the refused call
        method: Method,
        /// Path of the refused call
        path: String,
    },

    /// Network failure, including on the refresh call
    #[error("request to {path} failed")]
    Transport {
        /// Path that was being called
        path: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// The session could not be renewed; tokens were cleared
    #[error("session expired: {reason}")]
    SessionExpired {
        /// Short description of what failed
        reason: String,
        /// Error from the refresh attempt, if one was made
        #[source]
        source: Option<Box<ClientError>>,
    },

    /// Backend answered with a non-success status
    #[error("{path} returned {status}{}", .detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        /// Response status
        status: StatusCode,
        /// Path that was called
        path: String,
        /// `detail` (or similar) message from the response body
        detail: Option<String>,
    },

    /// Response body is not the expected JSON
    #[error("unexpected response body from {path}")]
    Decode {
        /// Path that was called
        path: String,
        /// JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Token store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClientError {
    /// Whether the error was produced without contacting the backend
    #[must_use]
    pub const fn is_local_denial(&self) -> bool {
        matches!(
            self,
            Self::LocalAuthorization { .. } | Self::UndeclaredEndpoint { .. }
        )
    }

    /// HTTP status carried by the error, if any
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
