use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::role::Role;

/// Value object representing a hashed password verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Create a new HashedPassword from an already hashed string
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Get the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lowercase an identifier the way stored emails and usernames are
/// normalized. Uniqueness is case-insensitive because every write and
/// every lookup goes through this.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Claim type recorded at registration and surfaced in session claims.
pub const GIVEN_NAME_CLAIM: &str = "given_name";

/// The authenticatable identity record. The password verifier is absent
/// for accounts created through an external login provider.
#[derive(Debug, Clone)]
pub struct Credential {
    id: Uuid,
    user_name: String,
    email: String,
    password_hash: Option<HashedPassword>,
    is_active: bool,
    email_confirmed: bool,
    two_factor_enabled: bool,
    access_failed_count: i32,
    lockout_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Credential {
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: Uuid,
        user_name: String,
        email: String,
        password_hash: Option<HashedPassword>,
        is_active: bool,
        email_confirmed: bool,
        two_factor_enabled: bool,
        access_failed_count: i32,
        lockout_end: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_name,
            email,
            password_hash,
            is_active,
            email_confirmed,
            two_factor_enabled,
            access_failed_count,
            lockout_end,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> Option<&HashedPassword> {
        self.password_hash.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn email_confirmed(&self) -> bool {
        self.email_confirmed
    }

    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor_enabled
    }

    pub fn access_failed_count(&self) -> i32 {
        self.access_failed_count
    }

    pub fn lockout_end(&self) -> Option<DateTime<Utc>> {
        self.lockout_end
    }

    /// Whether the credential is serving a lockout at `at`.
    pub fn is_locked_out(&self, at: DateTime<Utc>) -> bool {
        self.lockout_end.is_some_and(|end| end > at)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Input for creating a credential. The username is always the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub email: String,
    pub is_active: bool,
}

impl NewCredential {
    /// Build the record for a registration submission; the email is
    /// normalized here so duplicate checks are case-insensitive.
    pub fn active(email: &str) -> Self {
        Self {
            email: normalize_identifier(email),
            is_active: true,
        }
    }
}

/// One row of the account listing: a credential joined with its role
/// names.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialWithRoles {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub roles: BTreeSet<Role>,
}
