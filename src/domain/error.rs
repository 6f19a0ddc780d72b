use serde::Serialize;
use thiserror::Error;

/// A single field-level validation message, keyed the way the submitted
/// form names the field. An empty field name marks a form-level message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulated structural validation failures for one submission. Every
/// failing field is reported in a single pass, not just the first.
/// Serializes as the bare list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} field(s) failed validation", self.errors.len())
    }
}

/// Rejections raised at the credential-store boundary. All of these are
/// recoverable form errors for the submitting user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("An account with this email address already exists.")]
    DuplicateEmail,

    #[error("{0}")]
    WeakPassword(String),

    #[error("The email address for this account has not been confirmed.")]
    UnconfirmedEmail,

    #[error("The token is invalid or has expired.")]
    InvalidToken,
}

/// Infrastructure-level failures. `Database` is never surfaced as a form
/// error; handlers map it to a generic server failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(String),
}

/// Failures inside supporting services. Never surfaced verbatim; handlers
/// map these to a generic server failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token could not be issued: {0}")]
    TokenIssue(String),

    #[error("token is invalid or expired")]
    TokenInvalid,

    #[error("notification could not be delivered: {0}")]
    Delivery(String),
}

/// Rejections from credential-store write operations (create, reset,
/// update). Converted into the per-operation errors below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    #[error(transparent)]
    Credential(CredentialError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Service(ServiceError),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Credential(CredentialError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Service(ServiceError),
}

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Service(ServiceError),
}

#[derive(Debug, Error)]
pub enum ExternalConfirmError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Credential(CredentialError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Service(ServiceError),
}

#[derive(Debug, Error)]
pub enum EditCredentialError {
    #[error("no credential with that id")]
    NotFound,

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Credential(CredentialError),

    #[error(transparent)]
    Repository(RepositoryError),
}

#[derive(Debug, Error)]
pub enum ResetPasswordError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Credential(CredentialError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Service(ServiceError),
}

impl From<CredentialStoreError> for RegisterError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::Credential(e) => RegisterError::Credential(e),
            CredentialStoreError::Repository(e) => RegisterError::Repository(e),
            CredentialStoreError::Service(e) => RegisterError::Service(e),
        }
    }
}

impl From<CredentialStoreError> for ExternalConfirmError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::Credential(e) => ExternalConfirmError::Credential(e),
            CredentialStoreError::Repository(e) => ExternalConfirmError::Repository(e),
            CredentialStoreError::Service(e) => ExternalConfirmError::Service(e),
        }
    }
}

impl From<CredentialStoreError> for ResetPasswordError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::Credential(e) => ResetPasswordError::Credential(e),
            CredentialStoreError::Repository(e) => ResetPasswordError::Repository(e),
            CredentialStoreError::Service(e) => ResetPasswordError::Service(e),
        }
    }
}

impl From<CredentialStoreError> for EditCredentialError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::Credential(e) => EditCredentialError::Credential(e),
            CredentialStoreError::Repository(RepositoryError::NotFound) => {
                EditCredentialError::NotFound
            }
            CredentialStoreError::Repository(e) => EditCredentialError::Repository(e),
            CredentialStoreError::Service(e) => {
                EditCredentialError::Repository(RepositoryError::Database(e.to_string()))
            }
        }
    }
}
