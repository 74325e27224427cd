//! Account entities
//!
//! The password hash is an opaque blob produced by the authentication
//! collaborator. It is persisted but never printed: the `Debug` impls here
//! redact it, as they do the one-time-password code.

use crate::error::Error;
use crate::slug::Slug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Writes and manages their own posts
    #[default]
    Author,
    /// Manages everything
    Admin,
}

impl Role {
    /// Canonical on-disk name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "Author",
            Role::Admin => "Admin",
        }
    }

    /// Legacy numeric encoding
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Role::Author),
            1 => Some(Role::Admin),
            _ => None,
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "author" => Ok(Role::Author),
            "admin" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("unknown role {:?}", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account
#[derive(Clone, PartialEq)]
pub struct User {
    /// Identifier and directory name
    pub username: Slug,
    /// Contact address
    pub email: String,
    /// Opaque password hash
    pub password_hash: String,
    /// Role
    pub role: Role,
    /// `false` once soft-deleted
    pub active: bool,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Profile text
    pub bio: Option<String>,
    /// Profile picture reference
    pub profile_picture: Option<String>,
}

impl User {
    /// Create an active account
    pub fn new(
        username: Slug,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            username,
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            active: true,
            created_at: now,
            bio: None,
            profile_picture: None,
        }
    }

    /// Check if the account has the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .field("bio", &self.bio)
            .field("profile_picture", &self.profile_picture)
            .finish()
    }
}

/// Short-lived password-reset code, stored in its own file
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimePassword {
    /// The code the user must present
    pub code: String,
    /// Moment after which the code is void
    pub expires_at: DateTime<Utc>,
}

impl OneTimePassword {
    /// Check if the code has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for OneTimePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneTimePassword")
            .field("code", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
