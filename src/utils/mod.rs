// ABOUTME: Utility module for shared helpers
// ABOUTME: Currently hosts HTTP client construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

/// Shared HTTP client construction with configured timeouts
pub mod http_client;
