// ABOUTME: Refresh coordinator tracking Active/Refreshing state around token refresh calls
// ABOUTME: Supports independent per-request refreshes or coalescing behind one async mutex
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Refresh coordination.
//!
//! The coordinator does not perform the refresh itself; the client hands it
//! a future that does. What the coordinator decides is whether that future
//! runs at all (coalesced mode may reuse a token another request already
//! obtained) and it keeps the `Active`/`Refreshing` state observable.

use crate::session::{SessionStore, StoreError, TokenKind};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// How concurrent 401s are turned into refresh calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Every 401 issues its own refresh; the last response written wins
    #[default]
    Independent,
    /// Refreshes run one at a time and waiters reuse a token obtained meanwhile
    Coalesced,
}

impl RefreshMode {
    /// Configuration name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Coalesced => "coalesced",
        }
    }
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a refresh mode name that is neither `independent` nor `coalesced`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown refresh mode '{0}' (expected 'independent' or 'coalesced')")]
pub struct UnknownRefreshMode(pub String);

impl FromStr for RefreshMode {
    type Err = UnknownRefreshMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "coalesced" | "single-flight" => Ok(Self::Coalesced),
            _ => Err(UnknownRefreshMode(s.to_owned())),
        }
    }
}

/// Observable coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh call outstanding
    Active,
    /// At least one refresh call outstanding
    Refreshing,
}

/// Decides when a 401 turns into a refresh call
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    mode: RefreshMode,
    in_flight: AtomicUsize,
    performed: AtomicU64,
    single_flight: Mutex<()>,
}

/// Decrements the in-flight counter even if the refresh future is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RefreshCoordinator {
    /// Coordinator using `mode`
    #[must_use]
    pub fn new(mode: RefreshMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Configured mode
    #[must_use]
    pub const fn mode(&self) -> RefreshMode {
        self.mode
    }

    /// `Refreshing` while any refresh call is outstanding
    #[must_use]
    pub fn state(&self) -> RefreshState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            RefreshState::Refreshing
        } else {
            RefreshState::Active
        }
    }

    /// Number of refresh calls actually issued so far
    #[must_use]
    pub fn refreshes_performed(&self) -> u64 {
        self.performed.load(Ordering::SeqCst)
    }

    /// Obtain a fresh access token for a request that was sent with `stale`
    ///
    /// `perform` issues the refresh call and returns the new access token.
    /// In coalesced mode it is skipped when the store already holds a token
    /// different from `stale`.
    ///
    /// # Errors
    ///
    /// Returns whatever `perform` returns, or a store read error in
    /// coalesced mode
    pub async fn coordinate<F, Fut, E>(
        &self,
        stale: Option<&str>,
        store: &dyn SessionStore,
        perform: F,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: From<StoreError>,
    {
        match self.mode {
            RefreshMode::Independent => self.run(perform).await,
            RefreshMode::Coalesced => {
                let _turn = self.single_flight.lock().await;
                if let Some(current) = store.get(TokenKind::Access)? {
                    if stale != Some(current.as_str()) {
                        debug!("access token already refreshed by a concurrent request");
                        return Ok(current);
                    }
                }
                self.run(perform).await
            }
        }
    }

    async fn run<F, Fut, E>(&self, perform: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let _in_flight = InFlight::enter(&self.in_flight);
        self.performed.fetch_add(1, Ordering::SeqCst);
        perform().await
    }
}
