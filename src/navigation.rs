// ABOUTME: Navigation side effects triggered by the guard (redirect to login or unauthorized)
// ABOUTME: Provides a tracing navigator for headless use and a recording navigator for embedding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Redirects requested by the guard.
//!
//! A browser client changes its location; a headless client has nowhere to
//! go, so the default navigator only logs. Front ends that do route users
//! supply their own [`Navigator`].

use crate::constants::routes;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Where the guard wants the user to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Login entry point
    Login,
    /// Role not allowed on the requested route
    Unauthorized,
}

impl NavigationTarget {
    /// Client-side route of the target
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::Login => routes::LOGIN,
            Self::Unauthorized => routes::UNAUTHORIZED,
        }
    }
}

/// Receiver of redirect requests
pub trait Navigator: Send + Sync {
    /// Send the user to the login entry point
    fn redirect_to_login(&self);

    /// Send the user to the unauthorized page
    fn redirect_to_unauthorized(&self);

    /// Dispatch on `target`
    fn navigate(&self, target: NavigationTarget) {
        match target {
            NavigationTarget::Login => self.redirect_to_login(),
            NavigationTarget::Unauthorized => self.redirect_to_unauthorized(),
        }
    }
}

/// Logs redirects and does nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect_to_login(&self) {
        info!(route = routes::LOGIN, "redirect to login requested");
    }

    fn redirect_to_unauthorized(&self) {
        info!(route = routes::UNAUTHORIZED, "redirect to unauthorized requested");
    }
}

/// Remembers every redirect, in order
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<NavigationTarget>>,
}

impl RecordingNavigator {
    /// Empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects so far
    #[must_use]
    pub fn visits(&self) -> Vec<NavigationTarget> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent redirect
    #[must_use]
    pub fn last(&self) -> Option<NavigationTarget> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }

    fn record(&self, target: NavigationTarget) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.record(NavigationTarget::Login);
    }

    fn redirect_to_unauthorized(&self) {
        self.record(NavigationTarget::Unauthorized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        assert_eq!(navigator.last(), None);
        navigator.redirect_to_unauthorized();
        navigator.navigate(NavigationTarget::Login);
        assert_eq!(
            navigator.visits(),
            vec![NavigationTarget::Unauthorized, NavigationTarget::Login]
        );
        assert_eq!(navigator.last().map(NavigationTarget::route), Some("/login"));
    }
}
