// ABOUTME: Session commands for fee-cli
// ABOUTME: Handles login, logout, whoami, me and route authorization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use college_fee_client::{
    auth::{AuthService, RouteAccess},
    errors::AppResult,
    models::{Credentials, Role},
};
use tracing::info;

use crate::helpers::display::{display_login, display_profile, display_session};

type Result<T> = AppResult<T>;

/// Log in and persist the token pair
pub async fn login(auth: &AuthService, credentials: Credentials) -> Result<()> {
    let response = auth.login(&credentials).await?;
    info!(user.id = %response.user.id, "logged in");
    display_login(&response.user);
    Ok(())
}

/// Best-effort backend logout, then local cleanup
pub async fn logout(auth: &AuthService) -> Result<()> {
    auth.logout().await?;
    println!("Logged out.");
    Ok(())
}

/// Print the session decoded from the stored token
pub fn whoami(auth: &AuthService) -> Result<()> {
    match auth.current_session()? {
        Some(session) => display_session(&session),
        None => println!("Not logged in (no decodable access token stored)."),
    }
    Ok(())
}

/// Fetch `/auth/me/` through the guard
pub async fn me(auth: &AuthService) -> Result<()> {
    match auth.restore().await? {
        Some(profile) => display_profile(&profile),
        None => println!("No session could be restored; log in again."),
    }
    Ok(())
}

/// Report whether the session may enter a route limited to `roles`
pub fn route(auth: &AuthService, roles: &[Role]) {
    match auth.authorize_route(roles) {
        RouteAccess::Granted(session) => {
            println!("Granted: {} ({})", session.id, session.role);
        }
        RouteAccess::RedirectLogin => println!("Denied: not logged in."),
        RouteAccess::RedirectUnauthorized => println!("Denied: role not allowed."),
    }
}
