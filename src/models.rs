// ABOUTME: Wire and domain models shared by the session guard and the auth service
// ABOUTME: Defines roles, token pairs, login payloads and user profiles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an authenticated user
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Accounts office: fees, invoices, payments, reports
    Finance,
    /// Head of department
    Hod,
    /// Student, limited to their own records
    Student,
}

impl Role {
    /// All roles known to the permission table
    pub const ALL: [Self; 4] = [Self::Admin, Self::Finance, Self::Hod, Self::Student];

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Finance => "finance",
            Self::Hod => "hod",
            Self::Student => "student",
        }
    }

    /// Staff roles log in through the admin portal
    #[must_use]
    pub const fn is_staff(self) -> bool {
        !matches!(self, Self::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not one of the known roles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "finance" => Ok(Self::Finance),
            "hod" => Ok(Self::Hod),
            "student" => Ok(Self::Student),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

/// Access and refresh token pair, replaced wholesale at login
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Longer-lived renewal credential
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Backend user ids are integers, tokens sometimes carry them as strings
pub(crate) fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// User profile returned by login and `/auth/me/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user id
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    /// Role of the user
    pub role: Role,
    /// University seat number (students only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usn: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Permissions granted to this user beyond the role defaults
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Tokens now held by the session store
    pub tokens: TokenPair,
    /// Profile returned alongside the tokens
    pub user: UserProfile,
}

/// Raw login response body: `{ access, refresh, user }`
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponseBody {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

/// Credentials accepted by the login endpoints
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Student portal: USN or email plus password
    Student {
        /// USN or email address
        usn_or_email: String,
        /// Password
        password: String,
    },
    /// Admin portal (admin, finance, HOD)
    Admin {
        /// Email address
        email: String,
        /// Password
        password: String,
    },
    /// Generic staff login endpoint
    Staff {
        /// Email address
        email: String,
        /// Password
        password: String,
    },
}

/// Request body for the refresh token exchange
#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response body of the refresh token exchange
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    /// Present when the backend rotates refresh tokens
    #[serde(default)]
    pub refresh: Option<String>,
}
