//! In-memory collaborators for usecase and router tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    error::{
        CredentialError, CredentialStoreError, RepositoryError, ServiceError,
    },
    models::{
        account::{EmailConfirmationGrant, PasswordResetGrant},
        credential::{Credential, CredentialWithRoles, HashedPassword, NewCredential},
        lookup::LookupItem,
        policy::LockoutPolicy,
        profile::{NewProfile, ProfileSummary, RegisteredAccount},
        role::{ProfileKind, Role},
        session::{
            ExternalAssertion, PendingTwoFactor, RememberedBrowser, SessionClaims,
        },
    },
    repositories::{
        credential_store::{CredentialStore, LockoutStatus},
        profile_repository::ProfileRepository,
        reference_data::ReferenceData,
        registration_repository::RegistrationRepository,
        role_directory::RoleDirectory,
    },
    services::{
        notifier::AccountNotifier, password_service::PasswordHasher, token_service::TokenService,
    },
};

/// The recognizable stand-in for a real hash, shared by the fake hasher
/// and the in-memory store.
pub(crate) fn fake_hash(password: &str) -> String {
    format!("hashed::{password}")
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FakePasswordHasher;

impl PasswordHasher for FakePasswordHasher {
    fn hash(&self, plain_password: &str) -> Result<HashedPassword, ServiceError> {
        Ok(HashedPassword::new(fake_hash(plain_password)))
    }

    fn verify(
        &self,
        plain_password: &str,
        hashed_password: &HashedPassword,
    ) -> Result<bool, ServiceError> {
        Ok(hashed_password.as_str() == fake_hash(plain_password))
    }
}

struct CredentialRow {
    email: String,
    password_hash: Option<String>,
    is_active: bool,
    email_confirmed: bool,
    two_factor_enabled: bool,
    access_failed_count: i32,
    lockout_end: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreState {
    rows: HashMap<Uuid, CredentialRow>,
    roles: HashMap<Uuid, Vec<Role>>,
    claims: HashMap<(Uuid, String), String>,
    providers: HashMap<Uuid, Vec<String>>,
    codes: HashMap<(Uuid, String), String>,
    code_counter: u32,
    external: HashMap<(String, String), Uuid>,
    reset_grants: HashMap<Uuid, (Uuid, DateTime<Utc>)>,
    confirmation_grants: HashMap<Uuid, Uuid>,
}

/// A fully working in-memory credential store, including lockout
/// accounting against the policy it is built with. Clones share state.
#[derive(Clone)]
pub(crate) struct InMemoryCredentialStore {
    state: Arc<Mutex<StoreState>>,
    policy: LockoutPolicy,
}

impl InMemoryCredentialStore {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            policy,
        }
    }

    pub fn seed(&self, email: &str, password: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().rows.insert(
            id,
            CredentialRow {
                email: email.to_string(),
                password_hash: password.map(fake_hash),
                is_active: true,
                email_confirmed: true,
                two_factor_enabled: false,
                access_failed_count: 0,
                lockout_end: None,
                last_failure: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn set_active(&self, id: Uuid, is_active: bool) {
        self.state.lock().unwrap().rows.get_mut(&id).unwrap().is_active = is_active;
    }

    pub fn set_confirmed(&self, id: Uuid, confirmed: bool) {
        self.state.lock().unwrap().rows.get_mut(&id).unwrap().email_confirmed = confirmed;
    }

    pub fn set_roles(&self, id: Uuid, roles: &[Role]) {
        self.state.lock().unwrap().roles.insert(id, roles.to_vec());
    }

    pub fn set_claim(&self, id: Uuid, claim_type: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .claims
            .insert((id, claim_type.to_string()), value.to_string());
    }

    pub fn enable_two_factor(&self, id: Uuid, providers: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.rows.get_mut(&id).unwrap().two_factor_enabled = true;
        state
            .providers
            .insert(id, providers.iter().map(|p| p.to_string()).collect());
    }

    pub fn link_external(&self, id: Uuid, provider: &str, subject: &str) {
        self.state
            .lock()
            .unwrap()
            .external
            .insert((provider.to_string(), subject.to_string()), id);
    }

    pub fn seed_reset_grant(&self, id: Uuid, token: Uuid, expires_at: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap()
            .reset_grants
            .insert(id, (token, expires_at));
    }

    pub fn seed_confirmation_grant(&self, id: Uuid) -> Uuid {
        let token = Uuid::new_v4();
        self.state.lock().unwrap().confirmation_grants.insert(id, token);
        token
    }

    pub fn access_failed_count(&self, id: Uuid) -> i32 {
        self.state.lock().unwrap().rows[&id].access_failed_count
    }

    pub fn password_hash(&self, id: Uuid) -> Option<String> {
        self.state.lock().unwrap().rows[&id].password_hash.clone()
    }

    pub fn email(&self, id: Uuid) -> String {
        self.state.lock().unwrap().rows[&id].email.clone()
    }

    pub fn is_active(&self, id: Uuid) -> bool {
        self.state.lock().unwrap().rows[&id].is_active
    }

    pub fn is_confirmed(&self, id: Uuid) -> bool {
        self.state.lock().unwrap().rows[&id].email_confirmed
    }
}

fn credential_from(id: Uuid, row: &CredentialRow) -> Credential {
    Credential::reconstruct(
        id,
        row.email.clone(),
        row.email.clone(),
        row.password_hash.clone().map(HashedPassword::new),
        row.is_active,
        row.email_confirmed,
        row.two_factor_enabled,
        row.access_failed_count,
        row.lockout_end,
        row.created_at,
        row.created_at,
    )
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .find(|(_, row)| row.email == identifier)
            .map(|(id, row)| credential_from(*id, row)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.rows.get(&id).map(|row| credential_from(id, row)))
    }

    async fn find_by_external_login(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let id = state
            .external
            .get(&(provider.to_string(), subject.to_string()))
            .copied();
        Ok(id.and_then(|id| state.rows.get(&id).map(|row| credential_from(id, row))))
    }

    async fn create_external(
        &self,
        credential: NewCredential,
        assertion: &ExternalAssertion,
    ) -> Result<Credential, CredentialStoreError> {
        let mut state = self.state.lock().unwrap();
        if state.rows.values().any(|row| row.email == credential.email) {
            return Err(CredentialStoreError::Credential(
                CredentialError::DuplicateEmail,
            ));
        }
        let id = Uuid::new_v4();
        state.rows.insert(
            id,
            CredentialRow {
                email: credential.email,
                password_hash: None,
                is_active: credential.is_active,
                email_confirmed: false,
                two_factor_enabled: false,
                access_failed_count: 0,
                lockout_end: None,
                last_failure: None,
                created_at: Utc::now(),
            },
        );
        state.external.insert(
            (assertion.provider.clone(), assertion.subject.clone()),
            id,
        );
        let row = &state.rows[&id];
        Ok(credential_from(id, row))
    }

    async fn record_access_failure(
        &self,
        credential_id: Uuid,
    ) -> Result<LockoutStatus, RepositoryError> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let row = state
            .rows
            .get_mut(&credential_id)
            .ok_or(RepositoryError::NotFound)?;
        if row.lockout_end.is_some_and(|end| end > now) {
            return Ok(LockoutStatus::LockedOut);
        }
        let window = Duration::minutes(self.policy.reset_window_minutes);
        match row.last_failure {
            Some(at) if now - at <= window => row.access_failed_count += 1,
            _ => row.access_failed_count = 1,
        }
        row.last_failure = Some(now);
        if row.access_failed_count >= self.policy.max_failed_attempts {
            row.lockout_end = Some(now + Duration::minutes(self.policy.lockout_minutes));
            Ok(LockoutStatus::LockedOut)
        } else {
            Ok(LockoutStatus::AttemptsRemaining(
                self.policy.max_failed_attempts - row.access_failed_count,
            ))
        }
    }

    async fn reset_access_failures(&self, credential_id: Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let row = state
            .rows
            .get_mut(&credential_id)
            .ok_or(RepositoryError::NotFound)?;
        row.access_failed_count = 0;
        row.lockout_end = None;
        row.last_failure = None;
        Ok(())
    }

    async fn two_factor_providers(
        &self,
        credential_id: Uuid,
    ) -> Result<Vec<String>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.providers.get(&credential_id).cloned().unwrap_or_default())
    }

    async fn generate_two_factor_code(
        &self,
        credential_id: Uuid,
        provider: &str,
    ) -> Result<String, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.code_counter += 1;
        let code = format!("{:06}", 100_000 + state.code_counter);
        state
            .codes
            .insert((credential_id, provider.to_string()), code.clone());
        Ok(code)
    }

    async fn verify_two_factor_code(
        &self,
        credential_id: Uuid,
        provider: &str,
        code: &str,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let key = (credential_id, provider.to_string());
        if state.codes.get(&key).is_some_and(|stored| stored == code) {
            state.codes.remove(&key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn claim_value(
        &self,
        credential_id: Uuid,
        claim_type: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.claims.get(&(credential_id, claim_type.to_string())).cloned())
    }

    async fn confirm_email(
        &self,
        credential_id: Uuid,
        token: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state
            .confirmation_grants
            .get(&credential_id)
            .is_some_and(|stored| *stored == token)
        {
            state.confirmation_grants.remove(&credential_id);
            if let Some(row) = state.rows.get_mut(&credential_id) {
                row.email_confirmed = true;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn generate_password_reset_token(
        &self,
        credential_id: Uuid,
    ) -> Result<PasswordResetGrant, RepositoryError> {
        let token = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .reset_grants
            .insert(credential_id, (token, Utc::now() + Duration::minutes(60)));
        Ok(PasswordResetGrant {
            credential_id,
            token,
        })
    }

    async fn reset_password(
        &self,
        credential_id: Uuid,
        token: Uuid,
        new_password: &str,
    ) -> Result<(), CredentialStoreError> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();
        let valid = state
            .reset_grants
            .get(&credential_id)
            .is_some_and(|(stored, expires)| *stored == token && *expires > now);
        if !valid {
            return Err(CredentialStoreError::Credential(
                CredentialError::InvalidToken,
            ));
        }
        state.reset_grants.remove(&credential_id);
        let row = state
            .rows
            .get_mut(&credential_id)
            .ok_or(CredentialStoreError::Repository(RepositoryError::NotFound))?;
        row.password_hash = Some(fake_hash(new_password));
        row.access_failed_count = 0;
        row.lockout_end = None;
        row.last_failure = None;
        Ok(())
    }

    async fn update_email_and_active(
        &self,
        credential_id: Uuid,
        email: &str,
        is_active: bool,
    ) -> Result<(), CredentialStoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.rows.contains_key(&credential_id) {
            return Err(CredentialStoreError::Repository(RepositoryError::NotFound));
        }
        if state
            .rows
            .iter()
            .any(|(id, row)| *id != credential_id && row.email == email)
        {
            return Err(CredentialStoreError::Credential(
                CredentialError::DuplicateEmail,
            ));
        }
        let row = state.rows.get_mut(&credential_id).unwrap();
        row.email = email.to_string();
        row.is_active = is_active;
        Ok(())
    }

    async fn list_with_roles(&self) -> Result<Vec<CredentialWithRoles>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .map(|(id, row)| CredentialWithRoles {
                id: *id,
                email: row.email.clone(),
                is_active: row.is_active,
                roles: state
                    .roles
                    .get(id)
                    .map(|roles| roles.iter().copied().collect::<BTreeSet<_>>())
                    .unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl RoleDirectory for InMemoryCredentialStore {
    async fn roles_for(&self, credential_id: Uuid) -> Result<Vec<Role>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.roles.get(&credential_id).cloned().unwrap_or_default())
    }
}

#[derive(Clone)]
pub(crate) struct RecordedRegistration {
    pub credential: NewCredential,
    pub password: String,
    pub profile: NewProfile,
    pub account: RegisteredAccount,
}

#[derive(Default)]
struct RegistrationState {
    recorded: Vec<RecordedRegistration>,
    existing: HashSet<String>,
}

/// Records what would have been written in the registration transaction
/// and rejects emails seeded as already taken.
#[derive(Clone, Default)]
pub(crate) struct FakeRegistrationRepository {
    state: Arc<Mutex<RegistrationState>>,
}

impl FakeRegistrationRepository {
    pub fn seed_existing(&self, email: &str) {
        self.state.lock().unwrap().existing.insert(email.to_string());
    }

    pub fn recorded(&self) -> Vec<RecordedRegistration> {
        self.state.lock().unwrap().recorded.clone()
    }
}

#[async_trait]
impl RegistrationRepository for FakeRegistrationRepository {
    async fn register(
        &self,
        credential: NewCredential,
        password: &str,
        profile: NewProfile,
    ) -> Result<RegisteredAccount, CredentialStoreError> {
        let mut state = self.state.lock().unwrap();
        if state.existing.contains(&credential.email) {
            return Err(CredentialStoreError::Credential(
                CredentialError::DuplicateEmail,
            ));
        }
        let account = RegisteredAccount {
            credential_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            kind: profile.kind(),
            confirmation_token: Uuid::new_v4(),
        };
        state.existing.insert(credential.email.clone());
        state.recorded.push(RecordedRegistration {
            credential,
            password: password.to_string(),
            profile,
            account,
        });
        Ok(account)
    }
}

/// Tokens as transparent strings; sessions are remembered so tests can
/// inspect the claims that were issued.
#[derive(Clone, Default)]
pub(crate) struct FakeTokenService {
    sessions: Arc<Mutex<Vec<(String, SessionClaims)>>>,
}

impl FakeTokenService {
    pub fn last_session(&self) -> Option<SessionClaims> {
        self.sessions.lock().unwrap().last().map(|(_, claims)| claims.clone())
    }
}

impl TokenService for FakeTokenService {
    fn issue_session(
        &self,
        claims: &SessionClaims,
        _remember_me: bool,
    ) -> Result<String, ServiceError> {
        let mut sessions = self.sessions.lock().unwrap();
        let token = format!("session:{}:{}", claims.credential_id, sessions.len());
        sessions.push((token.clone(), claims.clone()));
        Ok(token)
    }

    fn decode_session(&self, token: &str) -> Result<SessionClaims, ServiceError> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|(issued, _)| issued == token)
            .map(|(_, claims)| claims.clone())
            .ok_or(ServiceError::TokenInvalid)
    }

    fn issue_pending_two_factor(
        &self,
        pending: &PendingTwoFactor,
    ) -> Result<String, ServiceError> {
        Ok(format!(
            "pending:{}:{}",
            pending.credential_id, pending.remember_me
        ))
    }

    fn decode_pending_two_factor(&self, token: &str) -> Result<PendingTwoFactor, ServiceError> {
        let rest = token.strip_prefix("pending:").ok_or(ServiceError::TokenInvalid)?;
        let (id, remember) = rest.split_once(':').ok_or(ServiceError::TokenInvalid)?;
        Ok(PendingTwoFactor {
            credential_id: Uuid::parse_str(id).map_err(|_| ServiceError::TokenInvalid)?,
            remember_me: remember
                .parse()
                .map_err(|_| ServiceError::TokenInvalid)?,
        })
    }

    fn issue_remembered_browser(
        &self,
        browser: &RememberedBrowser,
    ) -> Result<String, ServiceError> {
        Ok(format!("browser:{}", browser.credential_id))
    }

    fn decode_remembered_browser(&self, token: &str) -> Result<RememberedBrowser, ServiceError> {
        let rest = token.strip_prefix("browser:").ok_or(ServiceError::TokenInvalid)?;
        Ok(RememberedBrowser {
            credential_id: Uuid::parse_str(rest).map_err(|_| ServiceError::TokenInvalid)?,
        })
    }

    fn issue_external_pending(
        &self,
        assertion: &ExternalAssertion,
    ) -> Result<String, ServiceError> {
        Ok(format!(
            "external:{}:{}:{}",
            assertion.provider,
            assertion.subject,
            assertion.email.clone().unwrap_or_default()
        ))
    }

    fn decode_external_pending(&self, token: &str) -> Result<ExternalAssertion, ServiceError> {
        let rest = token.strip_prefix("external:").ok_or(ServiceError::TokenInvalid)?;
        let mut parts = rest.splitn(3, ':');
        let provider = parts.next().ok_or(ServiceError::TokenInvalid)?;
        let subject = parts.next().ok_or(ServiceError::TokenInvalid)?;
        let email = parts.next().ok_or(ServiceError::TokenInvalid)?;
        Ok(ExternalAssertion {
            provider: provider.to_string(),
            subject: subject.to_string(),
            email: if email.is_empty() {
                None
            } else {
                Some(email.to_string())
            },
        })
    }
}

#[derive(Default)]
struct SentMessages {
    two_factor: Vec<(String, String, String)>,
    resets: Vec<(String, PasswordResetGrant)>,
    confirmations: Vec<(String, EmailConfirmationGrant)>,
}

/// Captures everything handed to it; `failing()` makes every send error.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    state: Arc<Mutex<SentMessages>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn two_factor_codes(&self) -> Vec<(String, String, String)> {
        self.state.lock().unwrap().two_factor.clone()
    }

    pub fn password_resets(&self) -> Vec<(String, PasswordResetGrant)> {
        self.state.lock().unwrap().resets.clone()
    }

    pub fn email_confirmations(&self) -> Vec<(String, EmailConfirmationGrant)> {
        self.state.lock().unwrap().confirmations.clone()
    }

    fn deliver(&self) -> Result<(), ServiceError> {
        if self.fail {
            Err(ServiceError::Delivery("notifier rigged to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AccountNotifier for RecordingNotifier {
    async fn send_two_factor_code(
        &self,
        email: &str,
        provider: &str,
        code: &str,
    ) -> Result<(), ServiceError> {
        self.deliver()?;
        self.state.lock().unwrap().two_factor.push((
            email.to_string(),
            provider.to_string(),
            code.to_string(),
        ));
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        grant: &PasswordResetGrant,
    ) -> Result<(), ServiceError> {
        self.deliver()?;
        self.state
            .lock()
            .unwrap()
            .resets
            .push((email.to_string(), grant.clone()));
        Ok(())
    }

    async fn send_email_confirmation(
        &self,
        email: &str,
        grant: &EmailConfirmationGrant,
    ) -> Result<(), ServiceError> {
        self.deliver()?;
        self.state
            .lock()
            .unwrap()
            .confirmations
            .push((email.to_string(), grant.clone()));
        Ok(())
    }
}

/// Fixed drop-down data.
#[derive(Clone, Default)]
pub(crate) struct FakeReferenceData;

#[async_trait]
impl ReferenceData for FakeReferenceData {
    async fn specializations(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        Ok(vec![
            LookupItem::new(1, "Cardiology"),
            LookupItem::new(2, "Radiology"),
        ])
    }

    async fn cities(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        Ok(vec![LookupItem::new(1, "Zagreb"), LookupItem::new(2, "Split")])
    }

    async fn faculties(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        Ok(vec![LookupItem::new(3, "FER"), LookupItem::new(4, "FSB")])
    }

    async fn faculty_courses(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        Ok(vec![LookupItem::new(2, "Computing")])
    }

    async fn years_of_study(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        Ok(vec![LookupItem::new(4, "Fourth")])
    }

    async fn firms(&self) -> Result<Vec<LookupItem>, RepositoryError> {
        Ok(vec![LookupItem::new(1, "Ericsson NT")])
    }
}

#[derive(Default)]
struct ProfileState {
    profiles: Vec<ProfileSummary>,
}

#[derive(Clone, Default)]
pub(crate) struct InMemoryProfileRepository {
    state: Arc<Mutex<ProfileState>>,
}

impl InMemoryProfileRepository {
    pub fn seed(&self, summary: ProfileSummary) {
        self.state.lock().unwrap().profiles.push(summary);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn list(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .profiles
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect())
    }
}
