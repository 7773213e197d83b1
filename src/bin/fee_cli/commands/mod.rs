// ABOUTME: Re-exports command modules for fee-cli
// ABOUTME: Provides session (login/logout/whoami) and request (can/request/status) commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

pub mod request;
pub mod session;
