// ABOUTME: Backend connectivity probe against the unauthenticated test endpoint
// ABOUTME: Reports Connected with the backend's message or Unreachable with the failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use crate::client::{ApiClient, ApiRequest};
use crate::constants::paths;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Result of probing the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackendStatus {
    /// Backend answered the probe
    Connected {
        /// `message` field of the response, or the raw body
        message: String,
        /// Round trip in milliseconds
        latency_ms: u64,
    },
    /// Probe failed or returned an error status
    Unreachable {
        /// What went wrong
        error: String,
    },
}

impl BackendStatus {
    /// Whether the backend answered with a success status
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Probe `GET /test/` without credentials and without the guard
pub async fn check_backend(client: &ApiClient) -> BackendStatus {
    let started = Instant::now();
    let request = ApiRequest::get(paths::HEALTH);
    let response = match client.send_unguarded(&request).await {
        Ok(response) => response,
        Err(e) => {
            return BackendStatus::Unreachable {
                error: format!("{e:#}"),
            }
        }
    };
    let latency_ms = duration_ms(started.elapsed());

    if !response.is_success() {
        return BackendStatus::Unreachable {
            error: format!("backend answered {}", response.status),
        };
    }

    let message = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| response.text());
    BackendStatus::Connected {
        message,
        latency_ms,
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
