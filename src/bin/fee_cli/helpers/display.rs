// ABOUTME: Output formatting helpers for fee-cli
// ABOUTME: Provides consistent display functions for sessions, profiles and gate decisions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use college_fee_client::{
    guard::GateDecision,
    health::BackendStatus,
    models::UserProfile,
    session::Session,
};
use http::Method;
use serde_json::Value;

/// Display the session decoded from the stored access token
pub fn display_session(session: &Session) {
    println!("\nSESSION");
    println!("{}", "=".repeat(50));
    println!("   User ID: {}", session.id);
    println!("   Role: {}", session.role);
    if let Some(usn) = &session.usn {
        println!("   USN: {usn}");
    }
    if let Some(email) = &session.email {
        println!("   Email: {email}");
    }
    match session.expires_at {
        Some(exp) if session.is_expired() => {
            println!("   Expires: {} (expired, next call will refresh)", exp.format("%Y-%m-%d %H:%M UTC"));
        }
        Some(exp) => println!("   Expires: {}", exp.format("%Y-%m-%d %H:%M UTC")),
        None => println!("   Expires: unknown"),
    }

    println!("\nPERMISSIONS ({})", session.permissions.len());
    println!("{}", "=".repeat(50));
    for permission in session.permissions.iter() {
        let origin = if session.token_permissions.iter().any(|p| p == permission) {
            "token"
        } else {
            "role"
        };
        println!("   {permission:<24} [{origin}]");
    }
}

/// Display a successful login
pub fn display_login(user: &UserProfile) {
    println!("\nLogged in successfully.");
    display_profile(user);
}

/// Display a user profile
pub fn display_profile(user: &UserProfile) {
    println!("{}", "=".repeat(50));
    println!("   User ID: {}", user.id);
    println!("   Role: {}", user.role);
    if let Some(name) = &user.name {
        println!("   Name: {name}");
    }
    if let Some(usn) = &user.usn {
        println!("   USN: {usn}");
    }
    if let Some(email) = &user.email {
        println!("   Email: {email}");
    }
}

/// Display a gate decision
pub fn display_decision(method: &Method, path: &str, decision: &GateDecision) {
    match decision {
        GateDecision::Bypass => println!("{method} {path}: allowed (no permission check)"),
        GateDecision::Allow => println!("{method} {path}: allowed"),
        GateDecision::Deny(reason) => println!("{method} {path}: denied, {reason}"),
    }
}

/// Display the backend probe result
pub fn display_status(status: &BackendStatus) {
    match status {
        BackendStatus::Connected {
            message,
            latency_ms,
        } => println!("Backend Connected ({latency_ms} ms): {message}"),
        BackendStatus::Unreachable { error } => {
            println!("Backend Unreachable: {error}");
            println!("Check FEE_API_BASE_URL and that the backend server is running.");
        }
    }
}

/// Pretty-print a JSON value
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{pretty}"),
        Err(_) => println!("{value}"),
    }
}
