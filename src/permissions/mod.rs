// ABOUTME: Static role to permission table and the permission union carried by sessions
// ABOUTME: Re-exports the declared per-endpoint permission catalog used by the request gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! # Permissions
//!
//! Two sources grant a permission: the role table below, which is fixed for
//! the lifetime of the process, and the `permissions` claim embedded in the
//! access token. A [`PermissionSet`] is the union of both.

/// Declared endpoint → permission table
pub mod endpoints;

pub use endpoints::{Access, Endpoint, EndpointCatalog, Resource, Verb};

use crate::constants::permissions::{
    CREATE_STUDENT, DELETE_STUDENT, EDIT_STUDENT, MANAGE_FEES, MANAGE_INVOICES,
    MANAGE_NOTIFICATIONS, MANAGE_PAYMENTS, MANAGE_REPORTS, VIEW_ALL, VIEW_INVOICES,
    VIEW_OWN_DATA, VIEW_OWN_FEES, VIEW_OWN_INVOICES, VIEW_OWN_PAYMENTS, VIEW_PAYMENTS,
    VIEW_REPORTS,
};
use crate::models::Role;
use std::collections::BTreeSet;

const ADMIN_PERMISSIONS: &[&str] = &[
    CREATE_STUDENT,
    EDIT_STUDENT,
    DELETE_STUDENT,
    VIEW_ALL,
    MANAGE_FEES,
    MANAGE_INVOICES,
    MANAGE_PAYMENTS,
    MANAGE_REPORTS,
    MANAGE_NOTIFICATIONS,
];

const FINANCE_PERMISSIONS: &[&str] = &[
    VIEW_ALL,
    MANAGE_FEES,
    MANAGE_INVOICES,
    MANAGE_PAYMENTS,
    MANAGE_REPORTS,
    MANAGE_NOTIFICATIONS,
];

const HOD_PERMISSIONS: &[&str] = &[
    VIEW_ALL,
    EDIT_STUDENT,
    MANAGE_FEES,
    VIEW_INVOICES,
    VIEW_PAYMENTS,
    VIEW_REPORTS,
    MANAGE_NOTIFICATIONS,
];

const STUDENT_PERMISSIONS: &[&str] = &[
    VIEW_OWN_DATA,
    VIEW_OWN_FEES,
    VIEW_OWN_INVOICES,
    VIEW_OWN_PAYMENTS,
];

/// Permissions every holder of `role` has, independent of the token
#[must_use]
pub const fn role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Finance => FINANCE_PERMISSIONS,
        Role::Hod => HOD_PERMISSIONS,
        Role::Student => STUDENT_PERMISSIONS,
    }
}

/// Whether the role table alone grants `permission` to `role`
#[must_use]
pub fn role_grants(role: Role, permission: &str) -> bool {
    role_permissions(role).contains(&permission)
}

/// Set of permission names held by a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    names: BTreeSet<String>,
}

impl PermissionSet {
    /// Union of the role table entry and the token-embedded permissions
    #[must_use]
    pub fn for_session(role: Role, token_permissions: &[String]) -> Self {
        let names = role_permissions(role)
            .iter()
            .map(|p| (*p).to_owned())
            .chain(token_permissions.iter().cloned())
            .collect();
        Self { names }
    }

    /// Whether `permission` is in the set
    #[must_use]
    pub fn contains(&self, permission: &str) -> bool {
        self.names.contains(permission)
    }

    /// An empty set denies everything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of distinct permissions
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Permissions in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
