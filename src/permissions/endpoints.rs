// ABOUTME: Declared permission for every backend endpoint the client may call
// ABOUTME: Resolves (method, path) to an endpoint descriptor by matching path templates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Endpoint catalog.
//!
//! Each backend route is listed once with the permission it requires. The
//! gate looks calls up here instead of deriving a permission name from the
//! URL, so an unlisted route is refused rather than guessed at.
//!
//! Path templates use `{name}` for a single variable segment. Leading and
//! trailing slashes are ignored when matching, as is any query string.

use crate::constants::paths;
use crate::constants::permissions::{
    CREATE_STUDENT, DELETE_STUDENT, EDIT_STUDENT, MANAGE_FEES, MANAGE_INVOICES,
    MANAGE_NOTIFICATIONS, MANAGE_PAYMENTS, MANAGE_REPORTS, VIEW_ALL, VIEW_INVOICES,
    VIEW_OWN_DATA, VIEW_OWN_FEES, VIEW_OWN_INVOICES, VIEW_OWN_PAYMENTS, VIEW_PAYMENTS,
    VIEW_REPORTS,
};
use http::Method;
use std::fmt;

/// HTTP methods used by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// Map an `http::Method`; other methods are never declared
    #[must_use]
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::PATCH => Some(Self::Patch),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    /// Convert back to an `http::Method`
    #[must_use]
    pub fn as_method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    /// Reads never change backend state
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// Backend resource an endpoint belongs to
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Login, refresh, logout, profile
    Auth,
    /// Connectivity probe
    Health,
    /// Student records
    Students,
    /// Fee components
    FeeComponents,
    /// Fee templates
    FeeTemplates,
    /// Fee assignments and per-student fee structures
    FeeAssignments,
    /// Invoices
    Invoices,
    /// Payments and refunds
    Payments,
    /// Collection and outstanding reports
    Reports,
    /// Student notifications
    Notifications,
    /// Department-scoped HOD views
    Department,
    /// The logged-in student's own portal
    StudentPortal,
}

/// What a caller needs to reach an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No session needed; the gate is bypassed
    Public,
    /// The session must hold this permission
    Permission(&'static str),
    /// The session must hold at least one of these permissions
    AnyOf(&'static [&'static str]),
}

impl Access {
    /// Human readable requirement, used in denial messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Public => "public".to_owned(),
            Self::Permission(p) => (*p).to_owned(),
            Self::AnyOf(ps) => ps.join(" | "),
        }
    }
}

/// One declared backend route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP method
    pub verb: Verb,
    /// Path template relative to the base URL, e.g. `/students/{id}/`
    pub path: &'static str,
    /// Resource the route operates on
    pub resource: Resource,
    /// Requirement checked by the gate
    pub access: Access,
}

impl Endpoint {
    const fn new(verb: Verb, path: &'static str, resource: Resource, access: Access) -> Self {
        Self {
            verb,
            path,
            resource,
            access,
        }
    }

    /// Number of `{..}` segments; fewer means more specific
    fn placeholder_count(&self) -> usize {
        segments(self.path).filter(|s| is_placeholder(s)).count()
    }

    /// Whether a concrete `path` (query string allowed) fits this template
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        let mut template = segments(self.path);
        let mut concrete = segments(strip_query(path));
        loop {
            match (template.next(), concrete.next()) {
                (None, None) => return true,
                (Some(t), Some(c)) if is_placeholder(t) || t == c => {}
                _ => return false,
            }
        }
    }

    /// Fill `{..}` segments in order with `params`
    ///
    /// Missing params leave the placeholder in place, which no route matches.
    #[must_use]
    pub fn render(&self, params: &[&str]) -> String {
        let mut params = params.iter();
        let mut rendered = String::from("/");
        for segment in segments(self.path) {
            if is_placeholder(segment) {
                rendered.push_str(params.next().copied().unwrap_or(segment));
            } else {
                rendered.push_str(segment);
            }
            rendered.push('/');
        }
        rendered
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.path)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn is_placeholder(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('{') && segment.ends_with('}')
}

/// Whether `path` is under `/auth/`; such calls skip the gate entirely
#[must_use]
pub fn is_auth_path(path: &str) -> bool {
    segments(strip_query(path)).next() == Some(paths::AUTH_PREFIX)
}

use Access::{AnyOf, Permission, Public};
use Resource::{
    Auth, Department, FeeAssignments, FeeComponents, FeeTemplates, Health, Invoices,
    Notifications, Payments, Reports, StudentPortal, Students,
};
use Verb::{Delete, Get, Patch, Post, Put};

const READ_REPORTS: &[&str] = &[MANAGE_REPORTS, VIEW_REPORTS];
const READ_INVOICES: &[&str] = &[VIEW_ALL, VIEW_INVOICES, VIEW_OWN_INVOICES];
const READ_PAYMENT_STATUS: &[&str] = &[VIEW_ALL, VIEW_PAYMENTS, VIEW_OWN_PAYMENTS];
const READ_NOTIFICATIONS: &[&str] = &[VIEW_OWN_DATA, MANAGE_NOTIFICATIONS];

/// Routes exposed by the fee backend
static STANDARD_ENDPOINTS: &[Endpoint] = &[
    // Authentication (gate bypassed by prefix; listed for completeness)
    Endpoint::new(Post, paths::LOGIN, Auth, Public),
    Endpoint::new(Post, paths::STUDENT_LOGIN, Auth, Public),
    Endpoint::new(Post, paths::ADMIN_LOGIN, Auth, Public),
    Endpoint::new(Post, "/auth/register/", Auth, Public),
    Endpoint::new(Post, paths::LOGOUT, Auth, Public),
    Endpoint::new(Get, paths::ME, Auth, Public),
    Endpoint::new(Post, paths::TOKEN_REFRESH, Auth, Public),
    Endpoint::new(Get, paths::HEALTH, Health, Public),
    // Students
    Endpoint::new(Get, "/students/", Students, Permission(VIEW_ALL)),
    Endpoint::new(Post, "/students/", Students, Permission(CREATE_STUDENT)),
    Endpoint::new(Get, "/students/{id}/", Students, Permission(VIEW_ALL)),
    Endpoint::new(Put, "/students/{id}/", Students, Permission(EDIT_STUDENT)),
    Endpoint::new(Patch, "/students/{id}/", Students, Permission(EDIT_STUDENT)),
    Endpoint::new(Delete, "/students/{id}/", Students, Permission(DELETE_STUDENT)),
    // Fee components
    Endpoint::new(Get, "/fee/components/", FeeComponents, Permission(VIEW_ALL)),
    Endpoint::new(Post, "/fee/components/", FeeComponents, Permission(MANAGE_FEES)),
    Endpoint::new(Get, "/fee/components/{id}/", FeeComponents, Permission(VIEW_ALL)),
    Endpoint::new(Put, "/fee/components/{id}/", FeeComponents, Permission(MANAGE_FEES)),
    Endpoint::new(Patch, "/fee/components/{id}/", FeeComponents, Permission(MANAGE_FEES)),
    Endpoint::new(Delete, "/fee/components/{id}/", FeeComponents, Permission(MANAGE_FEES)),
    // Fee templates
    Endpoint::new(Get, "/fee/templates/", FeeTemplates, Permission(VIEW_ALL)),
    Endpoint::new(Post, "/fee/templates/", FeeTemplates, Permission(MANAGE_FEES)),
    Endpoint::new(Get, "/fee/templates/{id}/", FeeTemplates, Permission(VIEW_ALL)),
    Endpoint::new(Put, "/fee/templates/{id}/", FeeTemplates, Permission(MANAGE_FEES)),
    Endpoint::new(Patch, "/fee/templates/{id}/", FeeTemplates, Permission(MANAGE_FEES)),
    Endpoint::new(Delete, "/fee/templates/{id}/", FeeTemplates, Permission(MANAGE_FEES)),
    // Fee assignments
    Endpoint::new(Get, "/fee/assignments/", FeeAssignments, Permission(VIEW_ALL)),
    Endpoint::new(Post, "/fee/assignments/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Get, "/fee/assignments/{id}/", FeeAssignments, Permission(VIEW_ALL)),
    Endpoint::new(Put, "/fee/assignments/{id}/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Patch, "/fee/assignments/{id}/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Delete, "/fee/assignments/{id}/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Post, "/bulk-fee-assignment/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Get, "/admin/students/{id}/individual-fees/", FeeAssignments, Permission(VIEW_ALL)),
    Endpoint::new(Post, "/admin/students/{id}/individual-fees/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Get, "/admin/students/{id}/fee-breakdown/", FeeAssignments, Permission(VIEW_ALL)),
    Endpoint::new(Get, "/admin/students/{id}/fee-profile/", FeeAssignments, Permission(VIEW_ALL)),
    Endpoint::new(Get, "/admin/students/{id}/custom-fees/", FeeAssignments, Permission(VIEW_ALL)),
    Endpoint::new(Post, "/admin/students/{id}/custom-fees/", FeeAssignments, Permission(MANAGE_FEES)),
    Endpoint::new(Get, "/admin/student-status-dashboard/", FeeAssignments, Permission(VIEW_ALL)),
    // Invoices
    Endpoint::new(Get, "/invoices/", Invoices, AnyOf(READ_INVOICES)),
    Endpoint::new(Post, "/invoices/generate/", Invoices, Permission(MANAGE_INVOICES)),
    Endpoint::new(Get, "/invoices/{id}/", Invoices, AnyOf(READ_INVOICES)),
    Endpoint::new(Patch, "/invoices/{id}/", Invoices, Permission(MANAGE_INVOICES)),
    Endpoint::new(Delete, "/invoices/{id}/", Invoices, Permission(MANAGE_INVOICES)),
    Endpoint::new(Get, "/invoices/{id}/components/", Invoices, AnyOf(READ_INVOICES)),
    Endpoint::new(Post, "/invoices/{id}/component-payment/", Payments, Permission(VIEW_OWN_PAYMENTS)),
    Endpoint::new(Post, "/invoices/{id}/create-checkout-session/", Payments, Permission(VIEW_OWN_PAYMENTS)),
    // Payments
    Endpoint::new(Get, "/payments/", Payments, AnyOf(&[VIEW_ALL, VIEW_PAYMENTS])),
    Endpoint::new(Post, "/payments/offline/", Payments, Permission(MANAGE_PAYMENTS)),
    Endpoint::new(Get, "/payments/{session}/status/", Payments, AnyOf(READ_PAYMENT_STATUS)),
    Endpoint::new(Post, "/payments/{id}/refund/", Payments, Permission(MANAGE_PAYMENTS)),
    // Reports
    Endpoint::new(Get, "/reports/outstanding/", Reports, AnyOf(READ_REPORTS)),
    Endpoint::new(Get, "/reports/collections/", Reports, AnyOf(READ_REPORTS)),
    // Notifications
    Endpoint::new(Get, "/notifications/", Notifications, AnyOf(READ_NOTIFICATIONS)),
    Endpoint::new(Post, "/notifications/{id}/mark-read/", Notifications, Permission(VIEW_OWN_DATA)),
    // HOD department views
    Endpoint::new(Get, "/hod/students/", Department, Permission(VIEW_ALL)),
    Endpoint::new(Get, "/hod/reports/", Department, AnyOf(READ_REPORTS)),
    // Student self-service portal
    Endpoint::new(Get, "/api/student/profile/", StudentPortal, Permission(VIEW_OWN_DATA)),
    Endpoint::new(Patch, "/api/student/profile/", StudentPortal, Permission(VIEW_OWN_DATA)),
    Endpoint::new(Get, "/api/student/profile/edit/", StudentPortal, Permission(VIEW_OWN_DATA)),
    Endpoint::new(Patch, "/api/student/profile/edit/", StudentPortal, Permission(VIEW_OWN_DATA)),
    Endpoint::new(Get, "/api/student/dashboard/", StudentPortal, Permission(VIEW_OWN_DATA)),
    Endpoint::new(Get, "/api/student/receipts/", StudentPortal, Permission(VIEW_OWN_PAYMENTS)),
    Endpoint::new(Get, "/api/student/invoices/", StudentPortal, Permission(VIEW_OWN_INVOICES)),
    Endpoint::new(Get, "/api/student/invoices/{id}/", StudentPortal, Permission(VIEW_OWN_INVOICES)),
    Endpoint::new(Get, "/api/student/payments/", StudentPortal, Permission(VIEW_OWN_PAYMENTS)),
    Endpoint::new(Get, "/api/student/payments/{id}/receipt/", StudentPortal, Permission(VIEW_OWN_PAYMENTS)),
    Endpoint::new(Get, "/api/fees/{usn}/", StudentPortal, Permission(VIEW_OWN_FEES)),
    Endpoint::new(Get, "/api/student/complete-fee-data/{usn}/", StudentPortal, Permission(VIEW_OWN_FEES)),
];

/// Lookup table from concrete calls to declared endpoints
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    endpoints: Vec<Endpoint>,
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl EndpointCatalog {
    /// The fee backend's routes
    #[must_use]
    pub fn standard() -> Self {
        Self {
            endpoints: STANDARD_ENDPOINTS.to_vec(),
        }
    }

    /// A catalog with no routes; every non-auth call is refused
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            endpoints: Vec::new(),
        }
    }

    /// Declare an additional route
    #[must_use]
    pub fn with(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Declare an additional route from its parts
    #[must_use]
    pub fn declare(
        self,
        verb: Verb,
        path: &'static str,
        resource: Resource,
        access: Access,
    ) -> Self {
        self.with(Endpoint::new(verb, path, resource, access))
    }

    /// All declared routes
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Find the declared route for `method path`
    ///
    /// When several templates match, the one with the fewest variable
    /// segments wins, so `/invoices/generate/` beats `/invoices/{id}/`.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&Endpoint> {
        let verb = Verb::from_method(method)?;
        self.endpoints
            .iter()
            .filter(|e| e.verb == verb && e.matches_path(path))
            .min_by_key(|e| e.placeholder_count())
    }
}
