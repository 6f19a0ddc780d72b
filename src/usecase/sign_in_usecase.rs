use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    error::{CredentialError, ExternalConfirmError, ServiceError, SignInError, ValidationErrors},
    models::{
        credential::{Credential, GIVEN_NAME_CLAIM, NewCredential, normalize_identifier},
        session::{
            ExternalAssertion, ExternalConfirmationForm, ExternalSignInOutcome, IssuedSession,
            PendingTwoFactor, RememberedBrowser, SendCodeForm, SessionClaims, SignInForm,
            SignInOutcome, TwoFactorOutcome, VerifyCodeForm,
        },
    },
    repositories::{
        credential_store::{CredentialStore, LockoutStatus},
        role_directory::RoleDirectory,
    },
    services::{notifier::AccountNotifier, password_service::PasswordHasher, token_service::TokenService},
};

/// Drives every way into a session: password sign-in, the two-factor
/// continuation, and external provider callbacks. Credential-level
/// failures come back as outcomes, never as errors, so handlers cannot
/// accidentally leak which step rejected the attempt.
pub struct SignInUsecase<
    S: CredentialStore,
    P: PasswordHasher,
    R: RoleDirectory,
    T: TokenService,
    N: AccountNotifier,
> {
    credential_store: S,
    password_hasher: P,
    role_directory: R,
    token_service: T,
    notifier: N,
}

impl<S: CredentialStore, P: PasswordHasher, R: RoleDirectory, T: TokenService, N: AccountNotifier>
    SignInUsecase<S, P, R, T, N>
{
    pub fn new(
        credential_store: S,
        password_hasher: P,
        role_directory: R,
        token_service: T,
        notifier: N,
    ) -> Self {
        Self {
            credential_store,
            password_hasher,
            role_directory,
            token_service,
            notifier,
        }
    }

    /// Password sign-in. `remembered_browser` is the device token from the
    /// remember-browser cookie, if the request carried one.
    pub async fn sign_in(
        &self,
        form: SignInForm,
        remembered_browser: Option<&str>,
    ) -> Result<SignInOutcome, SignInError>
    where
        S: Send + Sync,
        P: Send + Sync,
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
    {
        form.validate().map_err(SignInError::Validation)?;

        let identifier = normalize_identifier(&form.email);
        let Some(credential) = self
            .credential_store
            .find_by_identifier(&identifier)
            .await
            .map_err(SignInError::Repository)?
        else {
            return Ok(SignInOutcome::Failure);
        };

        if !credential.is_active() {
            return Ok(SignInOutcome::Failure);
        }
        if credential.is_locked_out(Utc::now()) {
            return Ok(SignInOutcome::LockedOut);
        }

        // An external-only credential has no verifier; the attempt still
        // counts against the lockout threshold.
        let password_matches = match credential.password_hash() {
            Some(hash) => self
                .password_hasher
                .verify(&form.password, hash)
                .map_err(SignInError::Service)?,
            None => false,
        };
        if !password_matches {
            return self.record_failure(credential.id()).await;
        }

        self.credential_store
            .reset_access_failures(credential.id())
            .await
            .map_err(SignInError::Repository)?;

        if let Some(pending) = self
            .pending_second_factor(&credential, form.remember_me, remembered_browser)
            .await?
        {
            return Ok(SignInOutcome::RequiresTwoFactor { pending });
        }

        let session = self.issue_full_session(&credential, form.remember_me).await?;
        Ok(SignInOutcome::Success(session))
    }

    /// The delivery channels the pending sign-in may choose from.
    pub async fn two_factor_providers(&self, pending: &str) -> Result<Vec<String>, SignInError>
    where
        S: Send + Sync,
        P: Send + Sync,
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
    {
        let pending = self
            .token_service
            .decode_pending_two_factor(pending)
            .map_err(SignInError::Service)?;
        self.credential_store
            .two_factor_providers(pending.credential_id)
            .await
            .map_err(SignInError::Repository)
    }

    /// Generate a code for the chosen provider and hand it to the
    /// notifier.
    pub async fn send_code(&self, form: SendCodeForm) -> Result<(), SignInError>
    where
        S: Send + Sync,
        P: Send + Sync,
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
    {
        form.validate().map_err(SignInError::Validation)?;
        let pending = self
            .token_service
            .decode_pending_two_factor(&form.pending)
            .map_err(SignInError::Service)?;
        let credential = self.pending_credential(pending.credential_id).await?;

        let providers = self
            .credential_store
            .two_factor_providers(credential.id())
            .await
            .map_err(SignInError::Repository)?;
        if !providers.iter().any(|p| p == &form.provider) {
            let mut errors = ValidationErrors::new();
            errors.add("provider", "The provider is not valid for this account.");
            return Err(SignInError::Validation(errors));
        }

        let code = self
            .credential_store
            .generate_two_factor_code(credential.id(), &form.provider)
            .await
            .map_err(SignInError::Repository)?;
        self.notifier
            .send_two_factor_code(credential.email(), &form.provider, &code)
            .await
            .map_err(SignInError::Service)?;
        Ok(())
    }

    /// Check the submitted code and finish the sign-in the pending token
    /// started.
    pub async fn verify_code(&self, form: VerifyCodeForm) -> Result<TwoFactorOutcome, SignInError>
    where
        S: Send + Sync,
        P: Send + Sync,
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
    {
        form.validate().map_err(SignInError::Validation)?;
        let pending = self
            .token_service
            .decode_pending_two_factor(&form.pending)
            .map_err(SignInError::Service)?;
        let credential = self.pending_credential(pending.credential_id).await?;

        if credential.is_locked_out(Utc::now()) {
            return Ok(TwoFactorOutcome::LockedOut);
        }

        let code_matches = self
            .credential_store
            .verify_two_factor_code(credential.id(), &form.provider, &form.code)
            .await
            .map_err(SignInError::Repository)?;
        if !code_matches {
            return match self
                .credential_store
                .record_access_failure(credential.id())
                .await
                .map_err(SignInError::Repository)?
            {
                LockoutStatus::LockedOut => Ok(TwoFactorOutcome::LockedOut),
                LockoutStatus::AttemptsRemaining(_) => Ok(TwoFactorOutcome::Failure),
            };
        }

        self.credential_store
            .reset_access_failures(credential.id())
            .await
            .map_err(SignInError::Repository)?;

        let session = self
            .issue_full_session(&credential, pending.remember_me)
            .await?;
        let remember_browser = if form.remember_browser {
            let token = self
                .token_service
                .issue_remembered_browser(&RememberedBrowser {
                    credential_id: credential.id(),
                })
                .map_err(SignInError::Service)?;
            Some(token)
        } else {
            None
        };
        Ok(TwoFactorOutcome::Success {
            session,
            remember_browser,
        })
    }

    /// What to do with an identity the external provider just asserted.
    pub async fn external_callback(
        &self,
        assertion: ExternalAssertion,
        remembered_browser: Option<&str>,
    ) -> Result<ExternalSignInOutcome, SignInError>
    where
        S: Send + Sync,
        P: Send + Sync,
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
    {
        let linked = self
            .credential_store
            .find_by_external_login(&assertion.provider, &assertion.subject)
            .await
            .map_err(SignInError::Repository)?;

        let Some(credential) = linked else {
            let pending = self
                .token_service
                .issue_external_pending(&assertion)
                .map_err(SignInError::Service)?;
            return Ok(ExternalSignInOutcome::NotLinked {
                pending,
                provider: assertion.provider,
                email: assertion.email,
            });
        };

        if !credential.is_active() {
            return Ok(ExternalSignInOutcome::Failure);
        }
        if credential.is_locked_out(Utc::now()) {
            return Ok(ExternalSignInOutcome::LockedOut);
        }

        if let Some(pending) = self
            .pending_second_factor(&credential, false, remembered_browser)
            .await?
        {
            return Ok(ExternalSignInOutcome::RequiresTwoFactor { pending });
        }

        let session = self.issue_full_session(&credential, false).await?;
        Ok(ExternalSignInOutcome::Success(session))
    }

    /// Complete an external sign-in for a visitor with no account yet:
    /// create a passwordless credential, link the provider identity, and
    /// open a session.
    pub async fn confirm_external(
        &self,
        form: ExternalConfirmationForm,
    ) -> Result<IssuedSession, ExternalConfirmError>
    where
        S: Send + Sync,
        P: Send + Sync,
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
    {
        form.validate().map_err(ExternalConfirmError::Validation)?;
        let assertion = self
            .token_service
            .decode_external_pending(&form.pending)
            .map_err(|_| ExternalConfirmError::Credential(CredentialError::InvalidToken))?;

        let credential = self
            .credential_store
            .create_external(NewCredential::active(&form.email), &assertion)
            .await?;

        let roles = self
            .role_directory
            .roles_for(credential.id())
            .await
            .map_err(ExternalConfirmError::Repository)?;
        let claims = SessionClaims {
            credential_id: credential.id(),
            email: credential.email().to_string(),
            roles,
            given_name: None,
        };
        let token = self
            .token_service
            .issue_session(&claims, false)
            .map_err(ExternalConfirmError::Service)?;
        Ok(IssuedSession {
            token,
            remember_me: false,
        })
    }

    async fn record_failure(&self, credential_id: Uuid) -> Result<SignInOutcome, SignInError>
    where
        S: Send + Sync,
    {
        match self
            .credential_store
            .record_access_failure(credential_id)
            .await
            .map_err(SignInError::Repository)?
        {
            LockoutStatus::LockedOut => Ok(SignInOutcome::LockedOut),
            LockoutStatus::AttemptsRemaining(_) => Ok(SignInOutcome::Failure),
        }
    }

    /// A pending token when the credential still owes a second factor,
    /// `None` when it may go straight to a session.
    async fn pending_second_factor(
        &self,
        credential: &Credential,
        remember_me: bool,
        remembered_browser: Option<&str>,
    ) -> Result<Option<String>, SignInError>
    where
        S: Send + Sync,
        T: Send + Sync,
    {
        if !credential.two_factor_enabled() {
            return Ok(None);
        }
        if self.browser_is_remembered(credential, remembered_browser) {
            return Ok(None);
        }
        let providers = self
            .credential_store
            .two_factor_providers(credential.id())
            .await
            .map_err(SignInError::Repository)?;
        if providers.is_empty() {
            return Ok(None);
        }
        let pending = self
            .token_service
            .issue_pending_two_factor(&PendingTwoFactor {
                credential_id: credential.id(),
                remember_me,
            })
            .map_err(SignInError::Service)?;
        Ok(Some(pending))
    }

    fn browser_is_remembered(&self, credential: &Credential, token: Option<&str>) -> bool {
        token
            .and_then(|t| self.token_service.decode_remembered_browser(t).ok())
            .is_some_and(|b| b.credential_id == credential.id())
    }

    async fn pending_credential(&self, credential_id: Uuid) -> Result<Credential, SignInError>
    where
        S: Send + Sync,
    {
        self.credential_store
            .find_by_id(credential_id)
            .await
            .map_err(SignInError::Repository)?
            .ok_or(SignInError::Service(ServiceError::TokenInvalid))
    }

    async fn issue_full_session(
        &self,
        credential: &Credential,
        remember_me: bool,
    ) -> Result<IssuedSession, SignInError>
    where
        S: Send + Sync,
        R: Send + Sync,
    {
        let roles = self
            .role_directory
            .roles_for(credential.id())
            .await
            .map_err(SignInError::Repository)?;
        let given_name = self
            .credential_store
            .claim_value(credential.id(), GIVEN_NAME_CLAIM)
            .await
            .map_err(SignInError::Repository)?;
        let claims = SessionClaims {
            credential_id: credential.id(),
            email: credential.email().to_string(),
            roles,
            given_name,
        };
        let token = self
            .token_service
            .issue_session(&claims, remember_me)
            .map_err(SignInError::Service)?;
        Ok(IssuedSession { token, remember_me })
    }
}
