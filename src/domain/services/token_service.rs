use crate::domain::{
    error::ServiceError,
    models::session::{ExternalAssertion, PendingTwoFactor, RememberedBrowser, SessionClaims},
};

pub type Token = String;

/// Issues and decodes the signed tokens the sign-in flows hand out. Each
/// kind is bound to a single purpose, so a pending token can never pass as
/// a session and vice versa.
pub trait TokenService: Send + Sync {
    /// `remember_me` stretches the token lifetime to match the persistent
    /// cookie it will live in.
    fn issue_session(&self, claims: &SessionClaims, remember_me: bool)
    -> Result<Token, ServiceError>;

    fn decode_session(&self, token: &str) -> Result<SessionClaims, ServiceError>;

    /// Short-lived bridge between a correct password and the second
    /// factor.
    fn issue_pending_two_factor(&self, pending: &PendingTwoFactor) -> Result<Token, ServiceError>;

    fn decode_pending_two_factor(&self, token: &str) -> Result<PendingTwoFactor, ServiceError>;

    /// Long-lived token that lets a device skip the second factor.
    fn issue_remembered_browser(&self, browser: &RememberedBrowser)
    -> Result<Token, ServiceError>;

    fn decode_remembered_browser(&self, token: &str) -> Result<RememberedBrowser, ServiceError>;

    /// Short-lived carrier for an external provider assertion awaiting
    /// account confirmation.
    fn issue_external_pending(&self, assertion: &ExternalAssertion) -> Result<Token, ServiceError>;

    fn decode_external_pending(&self, token: &str) -> Result<ExternalAssertion, ServiceError>;
}
