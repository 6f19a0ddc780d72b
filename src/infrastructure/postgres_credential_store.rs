use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use entity::{
    credential_claims, credential_roles, credentials, email_confirmation_tokens, external_logins,
    password_reset_tokens, two_factor_codes,
};
use rand_core::{OsRng, TryRngCore};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    domain::{
        error::{CredentialError, CredentialStoreError, RepositoryError},
        models::{
            account::PasswordResetGrant,
            credential::{
                Credential, CredentialWithRoles, HashedPassword, NewCredential,
                normalize_identifier,
            },
            policy::{LockoutPolicy, PasswordPolicy},
            role::Role,
            session::ExternalAssertion,
        },
        repositories::credential_store::{CredentialStore, LockoutStatus},
        services::password_service::PasswordHasher,
    },
    infrastructure::argon2_password_hasher::Argon2PasswordHasher,
};

/// The only second-factor channel currently wired up.
const EMAIL_PROVIDER: &str = "Email";

#[derive(Clone)]
pub struct PostgresCredentialStore {
    db: DatabaseConnection,
    password_hasher: Argon2PasswordHasher,
    password_policy: PasswordPolicy,
    lockout_policy: LockoutPolicy,
    reset_token_minutes: i64,
    two_factor_code_minutes: i64,
}

impl PostgresCredentialStore {
    pub fn new(db: DatabaseConnection, password_hasher: Argon2PasswordHasher) -> Self {
        Self {
            db,
            password_hasher,
            password_policy: PasswordPolicy::default(),
            lockout_policy: LockoutPolicy::default(),
            reset_token_minutes: 60,
            two_factor_code_minutes: 5,
        }
    }

    pub fn with_policies(
        db: DatabaseConnection,
        password_hasher: Argon2PasswordHasher,
        password_policy: PasswordPolicy,
        lockout_policy: LockoutPolicy,
        reset_token_minutes: i64,
        two_factor_code_minutes: i64,
    ) -> Self {
        Self {
            db,
            password_hasher,
            password_policy,
            lockout_policy,
            reset_token_minutes,
            two_factor_code_minutes,
        }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        let credential = credentials::Entity::find()
            .filter(credentials::Column::Email.eq(normalize_identifier(identifier)))
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(credential.map(to_domain))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, RepositoryError> {
        let credential = credentials::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(credential.map(to_domain))
    }

    async fn find_by_external_login(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        let link = external_logins::Entity::find_by_id((provider.to_string(), subject.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        match link {
            Some(link) => self.find_by_id(link.credential_id).await,
            None => Ok(None),
        }
    }

    async fn create_external(
        &self,
        credential: NewCredential,
        assertion: &ExternalAssertion,
    ) -> Result<Credential, CredentialStoreError> {
        let existing = credentials::Entity::find()
            .filter(credentials::Column::Email.eq(credential.email.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;
        if existing.is_some() {
            return Err(CredentialStoreError::Credential(
                CredentialError::DuplicateEmail,
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        let id = Uuid::new_v4();
        let now = Utc::now().fixed_offset();
        let credential_model = credentials::ActiveModel {
            id: Set(id),
            user_name: Set(credential.email.clone()),
            email: Set(credential.email.clone()),
            password_hash: Set(None),
            is_active: Set(credential.is_active),
            email_confirmed: Set(false),
            two_factor_enabled: Set(false),
            access_failed_count: Set(0),
            last_access_failure: Set(None),
            lockout_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // A racing duplicate gets past the pre-check and lands on the
        // unique email index instead.
        credentials::Entity::insert(credential_model)
            .exec(&txn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    CredentialStoreError::Credential(CredentialError::DuplicateEmail)
                }
                _ => CredentialStoreError::Repository(RepositoryError::Database(e.to_string())),
            })?;

        let link_model = external_logins::ActiveModel {
            provider: Set(assertion.provider.clone()),
            subject: Set(assertion.subject.clone()),
            credential_id: Set(id),
        };
        external_logins::Entity::insert(link_model)
            .exec(&txn)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        txn.commit()
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        Ok(Credential::reconstruct(
            id,
            credential.email.clone(),
            credential.email,
            None,
            credential.is_active,
            false,
            false,
            0,
            None,
            now.naive_utc().and_utc(),
            now.naive_utc().and_utc(),
        ))
    }

    async fn record_access_failure(
        &self,
        credential_id: Uuid,
    ) -> Result<LockoutStatus, RepositoryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        // The row lock serializes racing attempts; every failure lands
        // in the count instead of overwriting a stale read.
        let row = credentials::Entity::find_by_id(credential_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        if row
            .lockout_end
            .is_some_and(|end| end.naive_utc().and_utc() > now)
        {
            return Ok(LockoutStatus::LockedOut);
        }

        // A failure only continues the count while the window is open;
        // otherwise it starts a fresh count of one.
        let window = Duration::minutes(self.lockout_policy.reset_window_minutes);
        let count = match row.last_access_failure {
            Some(at) if now - at.naive_utc().and_utc() <= window => row.access_failed_count + 1,
            _ => 1,
        };
        let locked_out = count >= self.lockout_policy.max_failed_attempts;
        let lockout_end =
            locked_out.then(|| now + Duration::minutes(self.lockout_policy.lockout_minutes));

        let mut active: credentials::ActiveModel = row.into();
        active.access_failed_count = Set(count);
        active.last_access_failure = Set(Some(now.fixed_offset()));
        active.lockout_end = Set(lockout_end.map(|end| end.fixed_offset()));
        active.updated_at = Set(now.fixed_offset());
        active
            .update(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if locked_out {
            Ok(LockoutStatus::LockedOut)
        } else {
            Ok(LockoutStatus::AttemptsRemaining(
                self.lockout_policy.max_failed_attempts - count,
            ))
        }
    }

    async fn reset_access_failures(&self, credential_id: Uuid) -> Result<(), RepositoryError> {
        let row = credentials::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: credentials::ActiveModel = row.into();
        active.access_failed_count = Set(0);
        active.last_access_failure = Set(None);
        active.lockout_end = Set(None);
        active.updated_at = Set(Utc::now().fixed_offset());
        active
            .update(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn two_factor_providers(
        &self,
        credential_id: Uuid,
    ) -> Result<Vec<String>, RepositoryError> {
        let row = credentials::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        // The email channel needs a confirmed address to send to.
        if row.two_factor_enabled && row.email_confirmed {
            Ok(vec![EMAIL_PROVIDER.to_string()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn generate_two_factor_code(
        &self,
        credential_id: Uuid,
        provider: &str,
    ) -> Result<String, RepositoryError> {
        let value = OsRng
            .try_next_u32()
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        let code = format!("{:06}", value % 1_000_000);
        let expires_at = Utc::now() + Duration::minutes(self.two_factor_code_minutes);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        two_factor_codes::Entity::delete_many()
            .filter(two_factor_codes::Column::CredentialId.eq(credential_id))
            .filter(two_factor_codes::Column::Provider.eq(provider))
            .exec(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let model = two_factor_codes::ActiveModel {
            credential_id: Set(credential_id),
            provider: Set(provider.to_string()),
            code: Set(code.clone()),
            expires_at: Set(expires_at.fixed_offset()),
        };
        two_factor_codes::Entity::insert(model)
            .exec(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(code)
    }

    async fn verify_two_factor_code(
        &self,
        credential_id: Uuid,
        provider: &str,
        code: &str,
    ) -> Result<bool, RepositoryError> {
        // The delete doubles as the check: a live matching code row can
        // be spent exactly once, whichever submission gets there first.
        let spent = two_factor_codes::Entity::delete_many()
            .filter(two_factor_codes::Column::CredentialId.eq(credential_id))
            .filter(two_factor_codes::Column::Provider.eq(provider))
            .filter(two_factor_codes::Column::Code.eq(code))
            .filter(two_factor_codes::Column::ExpiresAt.gt(Utc::now().fixed_offset()))
            .exec(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(spent.rows_affected == 1)
    }

    async fn claim_value(
        &self,
        credential_id: Uuid,
        claim_type: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let claim = credential_claims::Entity::find_by_id((credential_id, claim_type.to_string()))
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(claim.map(|c| c.claim_value))
    }

    async fn confirm_email(&self, credential_id: Uuid, token: Uuid) -> Result<bool, RepositoryError> {
        let grant = email_confirmation_tokens::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let Some(grant) = grant else {
            return Ok(false);
        };
        if grant.token != token {
            return Ok(false);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let row = credentials::Entity::find_by_id(credential_id)
            .one(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: credentials::ActiveModel = row.into();
        active.email_confirmed = Set(true);
        active.updated_at = Set(Utc::now().fixed_offset());
        active
            .update(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        email_confirmation_tokens::Entity::delete_by_id(credential_id)
            .exec(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(true)
    }

    async fn generate_password_reset_token(
        &self,
        credential_id: Uuid,
    ) -> Result<PasswordResetGrant, RepositoryError> {
        let token = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(self.reset_token_minutes);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        password_reset_tokens::Entity::delete_by_id(credential_id)
            .exec(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let model = password_reset_tokens::ActiveModel {
            credential_id: Set(credential_id),
            token: Set(token),
            expires_at: Set(expires_at.fixed_offset()),
        };
        password_reset_tokens::Entity::insert(model)
            .exec(&txn)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

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
        self.password_policy
            .check(new_password)
            .map_err(|message| {
                CredentialStoreError::Credential(CredentialError::WeakPassword(message))
            })?;

        let grant = password_reset_tokens::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;
        let valid = grant.as_ref().is_some_and(|g| {
            g.token == token && g.expires_at.naive_utc().and_utc() > Utc::now()
        });
        if !valid {
            return Err(CredentialStoreError::Credential(
                CredentialError::InvalidToken,
            ));
        }

        let password_hash = self
            .password_hasher
            .hash(new_password)
            .map_err(CredentialStoreError::Service)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        let row = credentials::Entity::find_by_id(credential_id)
            .one(&txn)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?
            .ok_or(CredentialStoreError::Repository(RepositoryError::NotFound))?;

        // A fresh verifier also clears any lockout the old one earned.
        let mut active: credentials::ActiveModel = row.into();
        active.password_hash = Set(Some(password_hash.as_str().to_string()));
        active.access_failed_count = Set(0);
        active.last_access_failure = Set(None);
        active.lockout_end = Set(None);
        active.updated_at = Set(Utc::now().fixed_offset());
        active
            .update(&txn)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        password_reset_tokens::Entity::delete_by_id(credential_id)
            .exec(&txn)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        txn.commit()
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        Ok(())
    }

    async fn update_email_and_active(
        &self,
        credential_id: Uuid,
        email: &str,
        is_active: bool,
    ) -> Result<(), CredentialStoreError> {
        let email = normalize_identifier(email);

        let row = credentials::Entity::find_by_id(credential_id)
            .one(&self.db)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?
            .ok_or(CredentialStoreError::Repository(RepositoryError::NotFound))?;

        let taken = credentials::Entity::find()
            .filter(credentials::Column::Email.eq(email.as_str()))
            .filter(credentials::Column::Id.ne(credential_id))
            .one(&self.db)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;
        if taken.is_some() {
            return Err(CredentialStoreError::Credential(
                CredentialError::DuplicateEmail,
            ));
        }

        // The username tracks the email; both are the sign-in identifier.
        let mut active: credentials::ActiveModel = row.into();
        active.user_name = Set(email.clone());
        active.email = Set(email);
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().fixed_offset());
        active
            .update(&self.db)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        Ok(())
    }

    async fn list_with_roles(&self) -> Result<Vec<CredentialWithRoles>, RepositoryError> {
        let rows = credentials::Entity::find()
            .order_by_asc(credentials::Column::Email)
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let grants = credential_roles::Entity::find()
            .all(&self.db)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut roles_by_credential = collect_role_grants(grants);

        Ok(rows
            .into_iter()
            .map(|row| CredentialWithRoles {
                roles: roles_by_credential.remove(&row.id).unwrap_or_default(),
                id: row.id,
                email: row.email,
                is_active: row.is_active,
            })
            .collect())
    }
}

fn to_domain(model: credentials::Model) -> Credential {
    Credential::reconstruct(
        model.id,
        model.user_name,
        model.email,
        model.password_hash.map(HashedPassword::new),
        model.is_active,
        model.email_confirmed,
        model.two_factor_enabled,
        model.access_failed_count,
        model.lockout_end.map(|end| end.naive_utc().and_utc()),
        model.created_at.naive_utc().and_utc(),
        model.updated_at.naive_utc().and_utc(),
    )
}

fn collect_role_grants(grants: Vec<credential_roles::Model>) -> HashMap<Uuid, BTreeSet<Role>> {
    let mut roles_by_credential: HashMap<Uuid, BTreeSet<Role>> = HashMap::new();
    for grant in grants {
        match grant.role.parse::<Role>() {
            Ok(role) => {
                roles_by_credential
                    .entry(grant.credential_id)
                    .or_default()
                    .insert(role);
            }
            Err(_) => {
                tracing::warn!(
                    credential_id = %grant.credential_id,
                    role = %grant.role,
                    "skipping unknown role grant"
                );
            }
        }
    }
    roles_by_credential
}
