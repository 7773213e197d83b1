// ABOUTME: Configuration module for the fee client
// ABOUTME: Re-exports the environment-driven ClientConfig and its value types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Configuration is read once at startup from environment variables and
//! passed explicitly to the client factory; nothing reads it globally.

/// Environment variable parsing and validation
pub mod environment;

pub use environment::{ClientConfig, Environment, HttpClientConfig};
