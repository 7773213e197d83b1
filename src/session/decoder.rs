// ABOUTME: Decodes the access token payload into a Session without contacting the backend
// ABOUTME: Malformed tokens yield no session (anonymous) instead of an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

//! Session decoder.
//!
//! The signature is not verified here; the backend remains the authority on
//! token validity. Decoding only recovers the identity and permission claims
//! the gate needs before a request leaves the process.

use crate::models::{Role, UnknownRole};
use crate::permissions::PermissionSet;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// JWT segments are base64url; some issuers keep the `=` padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Identity and permissions of the current caller, derived from the access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Backend user id (`sub`, `id` or `user_id` claim)
    pub id: String,
    /// Role claim
    pub role: Role,
    /// University seat number, students only
    pub usn: Option<String>,
    /// Email claim
    pub email: Option<String>,
    /// Union of token-embedded permissions and the role's table permissions
    pub permissions: PermissionSet,
    /// Permissions embedded in the token itself
    pub token_permissions: Vec<String>,
    /// Expiry claim, informational only
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether `permission` is in the session's permission union
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the token's `exp` claim is in the past
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Utc::now())
    }
}

/// Why a token could not be turned into a session
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TokenDecodeError {
    /// Not three dot-separated segments
    #[error("token has no payload segment")]
    MissingPayload,

    /// Payload segment is not base64url
    #[error("token payload is not valid base64url")]
    Base64(#[from] base64::DecodeError),

    /// Payload is not a JSON claims object
    #[error("token payload is not a valid claims object")]
    Json(#[from] serde_json::Error),

    /// None of `sub`, `id`, `user_id` present
    #[error("token carries no subject claim")]
    MissingSubject,

    /// Role claim is not a known role
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaimId {
    Number(i64),
    Text(String),
}

impl ClaimId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessClaims {
    #[serde(default)]
    sub: Option<ClaimId>,
    #[serde(default)]
    id: Option<ClaimId>,
    #[serde(default)]
    user_id: Option<ClaimId>,
    role: String,
    #[serde(default)]
    usn: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    permissions: Option<Vec<String>>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode `token` into a [`Session`], reporting why it failed
///
/// # Errors
///
/// Returns a [`TokenDecodeError`] if the token is not a JWT with a readable
/// claims payload, lacks a subject, or names an unknown role
pub fn try_decode_session(token: &str) -> Result<Session, TokenDecodeError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenDecodeError::MissingPayload)?;
    let bytes = PAYLOAD_ENGINE.decode(payload)?;
    let claims: AccessClaims = serde_json::from_slice(&bytes)?;

    let id = claims
        .sub
        .or(claims.id)
        .or(claims.user_id)
        .map(ClaimId::into_string)
        .ok_or(TokenDecodeError::MissingSubject)?;
    let role: Role = claims.role.parse()?;
    let token_permissions = claims.permissions.unwrap_or_default();
    let permissions = PermissionSet::for_session(role, &token_permissions);

    Ok(Session {
        id,
        role,
        usn: claims.usn,
        email: claims.email,
        permissions,
        token_permissions,
        expires_at: claims
            .exp
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0)),
    })
}

/// Decode a possibly-absent access token; any failure means "no session"
#[must_use]
pub fn decode_session(token: Option<&str>) -> Option<Session> {
    let token = token.map(str::trim).filter(|t| !t.is_empty())?;
    match try_decode_session(token) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!(error = %e, "access token could not be decoded, treating caller as anonymous");
            None
        }
    }
}
