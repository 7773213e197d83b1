// ABOUTME: System-wide constants for the fee client: storage keys, backend paths, defaults
// ABOUTME: Contains env var names, timeout defaults, and role permission names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! # Constants Module
//!
//! Hardcoded values shared by the session guard, the auth service and the CLI.
//! Environment-driven values live in [`crate::config::environment`].

/// Keys under which the token pair is persisted
pub mod storage_keys {
    /// Access token key (matches the browser client's local storage key)
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// Refresh token key
    pub const REFRESH_TOKEN: &str = "refreshToken";
}

/// Backend paths relative to the configured base URL
pub mod paths {
    /// Prefix shared by every authentication route; requests under it bypass the gate
    pub const AUTH_PREFIX: &str = "auth";
    /// Generic staff login
    pub const LOGIN: &str = "/auth/login/";
    /// Student login (USN or email + password)
    pub const STUDENT_LOGIN: &str = "/auth/student/login/";
    /// Admin / finance / HOD login
    pub const ADMIN_LOGIN: &str = "/auth/admin/login/";
    /// Refresh token exchange
    pub const TOKEN_REFRESH: &str = "/auth/token/refresh/";
    /// Server-side logout (refresh token blacklisting)
    pub const LOGOUT: &str = "/auth/logout/";
    /// Current user profile
    pub const ME: &str = "/auth/me/";
    /// Unauthenticated connectivity probe
    pub const HEALTH: &str = "/test/";
}

/// Client-side navigation targets
pub mod routes {
    /// Login entry point
    pub const LOGIN: &str = "/login";
    /// Shown when the session lacks the role required by a route
    pub const UNAUTHORIZED: &str = "/unauthorized";
}

/// Environment variable names read by the configuration layer
pub mod env_vars {
    /// Backend base URL
    pub const BASE_URL: &str = "FEE_API_BASE_URL";
    /// Legacy base URL variable shared with the browser build
    pub const LEGACY_BASE_URL: &str = "API_BASE_URL";
    /// Total request timeout in seconds
    pub const HTTP_TIMEOUT_SECS: &str = "FEE_HTTP_TIMEOUT_SECS";
    /// Connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: &str = "FEE_CONNECT_TIMEOUT_SECS";
    /// `independent` or `coalesced`
    pub const REFRESH_MODE: &str = "FEE_REFRESH_MODE";
    /// Path of the JSON token file used by the CLI
    pub const SESSION_FILE: &str = "FEE_SESSION_FILE";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Log filter
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Defaults applied when the environment does not say otherwise
pub mod defaults {
    /// Backend base URL used by the development server
    pub const BASE_URL: &str = "http://localhost:8000/api";
    /// Request timeout in seconds
    pub const HTTP_TIMEOUT_SECS: u64 = 30;
    /// Connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Directory under the user config dir holding the session file
    pub const CONFIG_DIR_NAME: &str = "college-fee-client";
    /// Session file name
    pub const SESSION_FILE_NAME: &str = "session.json";
}

/// Header names
pub mod headers {
    /// Correlation id attached to every logical request (shared by its replay)
    pub const REQUEST_ID: &str = "x-request-id";
}

/// Service identity used in structured logs
pub mod service_names {
    /// Library / CLI service name
    pub const FEE_CLIENT: &str = "college-fee-client";
}

/// Permission names granted by roles or embedded in tokens
pub mod permissions {
    /// Create student records
    pub const CREATE_STUDENT: &str = "create_student";
    /// Edit student records
    pub const EDIT_STUDENT: &str = "edit_student";
    /// Delete student records
    pub const DELETE_STUDENT: &str = "delete_student";
    /// Read every record in the institution
    pub const VIEW_ALL: &str = "view_all";
    /// Manage fee components, templates and assignments
    pub const MANAGE_FEES: &str = "manage_fees";
    /// Generate and edit invoices
    pub const MANAGE_INVOICES: &str = "manage_invoices";
    /// Record and adjust payments
    pub const MANAGE_PAYMENTS: &str = "manage_payments";
    /// Produce collection and outstanding reports
    pub const MANAGE_REPORTS: &str = "manage_reports";
    /// Send notifications and reminders
    pub const MANAGE_NOTIFICATIONS: &str = "manage_notifications";
    /// Read invoices
    pub const VIEW_INVOICES: &str = "view_invoices";
    /// Read payments
    pub const VIEW_PAYMENTS: &str = "view_payments";
    /// Read reports
    pub const VIEW_REPORTS: &str = "view_reports";
    /// Read the caller's own student record
    pub const VIEW_OWN_DATA: &str = "view_own_data";
    /// Read the caller's own fees
    pub const VIEW_OWN_FEES: &str = "view_own_fees";
    /// Read the caller's own invoices
    pub const VIEW_OWN_INVOICES: &str = "view_own_invoices";
    /// Read and make the caller's own payments
    pub const VIEW_OWN_PAYMENTS: &str = "view_own_payments";
}
