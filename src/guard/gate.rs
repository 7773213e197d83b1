// ABOUTME: Request gate deciding locally whether a call may leave the process
// ABOUTME: Resolves calls through the endpoint catalog and checks the session's permission union
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use crate::client::ClientError;
use crate::constants::permissions::VIEW_OWN_DATA;
use crate::logging::AppLogger;
use crate::models::Role;
use crate::permissions::endpoints::is_auth_path;
use crate::permissions::{Access, EndpointCatalog, Resource};
use crate::session::Session;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Why the gate refused a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// No decodable access token
    Anonymous {
        /// Requirement of the endpoint
        required: String,
    },
    /// Session lacks the endpoint's permission
    MissingPermission {
        /// Requirement of the endpoint
        required: String,
    },
    /// Students may only read student records, and only with `view_own_data`
    StudentScope,
    /// The call matches no declared endpoint
    Undeclared,
}

impl DenyReason {
    /// Requirement that was not met, for error reporting
    #[must_use]
    pub fn required(&self) -> String {
        match self {
            Self::Anonymous { required } | Self::MissingPermission { required } => {
                required.clone()
            }
            Self::StudentScope => format!("{VIEW_OWN_DATA} (read only)"),
            Self::Undeclared => "a declared endpoint".to_owned(),
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous { required } => write!(f, "not logged in (requires {required})"),
            Self::MissingPermission { required } => write!(f, "missing permission {required}"),
            Self::StudentScope => {
                write!(f, "students may only read their own record ({VIEW_OWN_DATA})")
            }
            Self::Undeclared => f.write_str("endpoint is not declared"),
        }
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Authentication or public route; no check performed
    Bypass,
    /// Session holds the required permission
    Allow,
    /// Call must not be sent
    Deny(DenyReason),
}

impl GateDecision {
    /// Whether the call may be sent
    #[must_use]
    pub const fn is_permitted(&self) -> bool {
        matches!(self, Self::Bypass | Self::Allow)
    }
}

/// Pre-flight permission check run before every outbound call
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
    catalog: Arc<EndpointCatalog>,
}

impl RequestGate {
    /// Gate backed by `catalog`
    #[must_use]
    pub fn new(catalog: EndpointCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Endpoint table consulted by the gate
    #[must_use]
    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    /// Decide whether `method path` may be sent for `session`
    #[must_use]
    pub fn check(&self, session: Option<&Session>, method: &Method, path: &str) -> GateDecision {
        if is_auth_path(path) {
            return GateDecision::Bypass;
        }
        let Some(endpoint) = self.catalog.resolve(method, path) else {
            return GateDecision::Deny(DenyReason::Undeclared);
        };
        if endpoint.access == Access::Public {
            return GateDecision::Bypass;
        }
        let Some(session) = session else {
            return GateDecision::Deny(DenyReason::Anonymous {
                required: endpoint.access.describe(),
            });
        };

        // Any student id passes: the caller's own id is not compared
        if session.role == Role::Student && endpoint.resource == Resource::Students {
            return if endpoint.verb.is_read() && session.has_permission(VIEW_OWN_DATA) {
                GateDecision::Allow
            } else {
                GateDecision::Deny(DenyReason::StudentScope)
            };
        }

        let granted = match endpoint.access {
            Access::Public => true,
            Access::Permission(permission) => session.has_permission(permission),
            Access::AnyOf(permissions) => permissions.iter().any(|p| session.has_permission(p)),
        };
        if granted {
            GateDecision::Allow
        } else {
            GateDecision::Deny(DenyReason::MissingPermission {
                required: endpoint.access.describe(),
            })
        }
    }

    /// Like [`check`](Self::check) but reports a denial as a [`ClientError`]
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UndeclaredEndpoint`] for unknown routes and
    /// [`ClientError::LocalAuthorization`] for every other denial
    pub fn authorize(
        &self,
        session: Option<&Session>,
        method: &Method,
        path: &str,
    ) -> Result<(), ClientError> {
        let reason = match self.check(session, method, path) {
            GateDecision::Bypass | GateDecision::Allow => return Ok(()),
            GateDecision::Deny(reason) => reason,
        };

        AppLogger::log_security_event(
            "request_denied",
            "low",
            &format!("{method} {path}: {reason}"),
            session.map(|s| s.id.as_str()),
        );

        Err(match reason {
            DenyReason::Undeclared => ClientError::UndeclaredEndpoint {
                method: method.clone(),
                path: path.to_owned(),
            },
            reason => ClientError::LocalAuthorization {
                method: method.clone(),
                path: path.to_owned(),
                reason,
            },
        })
    }
}
