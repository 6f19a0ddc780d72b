use crate::domain::{error::ServiceError, models::credential::HashedPassword};

/// Service for hashing passwords and verifying sign-in attempts against a
/// stored hash.
pub trait PasswordHasher: Clone {
    /// Hash a plain text password
    fn hash(&self, plain_password: &str) -> Result<HashedPassword, ServiceError>;

    /// Verify a plain text password against a hashed password. A mismatch
    /// is `Ok(false)`; `Err` means the stored hash could not be parsed.
    fn verify(
        &self,
        plain_password: &str,
        hashed_password: &HashedPassword,
    ) -> Result<bool, ServiceError>;
}
