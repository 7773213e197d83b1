// ABOUTME: Session module: token storage and local decoding of access tokens into sessions
// ABOUTME: Re-exports the SessionStore trait, its implementations, and the Session decoder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! # Sessions
//!
//! A [`Session`] is never persisted. It is rebuilt from the stored access
//! token every time it is needed, so clearing the [`SessionStore`] is enough
//! to end it.

/// Local JWT payload decoding
pub mod decoder;
/// Token storage trait with in-memory and file-backed implementations
pub mod store;

pub use decoder::{decode_session, Session};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError, TokenKind};
