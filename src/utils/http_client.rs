// ABOUTME: HTTP client construction with connection pooling and timeout configuration
// ABOUTME: Builds the reqwest client used by the fee backend transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use crate::config::HttpClientConfig;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Create a new HTTP client with the configured timeouts
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client(config: &HttpClientConfig) -> Client {
    create_custom_client(|builder| {
        builder
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("college-fee-client/", env!("CARGO_PKG_VERSION")))
    })
}

/// Create a new HTTP client with custom configuration
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_custom_client<F>(config_fn: F) -> Client
where
    F: FnOnce(ClientBuilder) -> ClientBuilder,
{
    config_fn(ClientBuilder::new())
        .build()
        .unwrap_or_else(|_| Client::new())
}
