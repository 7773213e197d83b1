// ABOUTME: Main library entry point for the college fee-management API client
// ABOUTME: Provides the session and access guard wrapped around every backend call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

#![deny(unsafe_code)]

//! # College Fee Client
//!
//! Client-side session and access guard for the college fee-management
//! REST backend.
//!
//! ## Features
//!
//! - **Token storage**: injectable [`session::SessionStore`] holding the access/refresh pair
//! - **Local session decoding**: role and permissions read from the access token payload
//! - **Request gate**: every call is checked against a declared endpoint table before it is sent
//! - **Refresh and replay**: a first 401 exchanges the refresh token once and replays the call
//! - **Logout**: best-effort backend logout followed by unconditional local cleanup
//!
//! ## Architecture
//!
//! - **Session**: token store and JWT payload decoder
//! - **Permissions**: static role table and the endpoint catalog
//! - **Guard**: request gate and refresh coordinator
//! - **Client**: transport seam and the guarded [`client::ApiClient`]
//! - **Auth**: login, logout, restore and route authorization
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use college_fee_client::auth::AuthService;
//! use college_fee_client::client::ApiClient;
//! use college_fee_client::config::ClientConfig;
//! use college_fee_client::errors::AppResult;
//! use college_fee_client::models::Credentials;
//! use college_fee_client::session::MemorySessionStore;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ClientConfig::from_env()?;
//!     let client = ApiClient::for_config(&config)
//!         .store(Arc::new(MemorySessionStore::new()))
//!         .build();
//!     let auth = AuthService::new(client.clone());
//!
//!     auth.login(&Credentials::Admin {
//!         email: "finance@college.edu".into(),
//!         password: "secret".into(),
//!     })
//!     .await?;
//!
//!     let invoices: serde_json::Value = client.get_json("/invoices/").await?;
//!     println!("{invoices}");
//!     auth.logout().await?;
//!     Ok(())
//! }
//! ```

/// Login, logout, session restore and route authorization
pub mod auth;

/// Guarded API client, request/response types and transport
pub mod client;

/// Environment-driven configuration
pub mod config;

/// System-wide constants
pub mod constants;

/// Application error type with stable error codes
pub mod errors;

/// Request gate and refresh coordinator
pub mod guard;

/// Backend connectivity probe
pub mod health;

/// Logging configuration and structured event helpers
pub mod logging;

/// Roles, token pairs and login payloads
pub mod models;

/// Redirect side effects
pub mod navigation;

/// Role permission table and endpoint catalog
pub mod permissions;

/// Token storage and session decoding
pub mod session;

/// HTTP client construction
pub mod utils;
