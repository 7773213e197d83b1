// ABOUTME: Access guard wrapped around every outbound API call
// ABOUTME: Combines the pre-flight request gate with the 401 refresh coordinator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! # Access Guard
//!
//! Per logical request the guard runs strictly in order:
//! gate check, send, and on a first 401 one refresh followed by one replay.
//! Nothing here reorders or queues requests across callers.

/// Pre-flight permission check
pub mod gate;
/// 401 → refresh → replay state machine
pub mod refresh;

pub use gate::{DenyReason, GateDecision, RequestGate};
pub use refresh::{RefreshCoordinator, RefreshMode, RefreshState, UnknownRefreshMode};
