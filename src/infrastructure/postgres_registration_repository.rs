use async_trait::async_trait;
use chrono::Utc;
use entity::{
    credential_claims, credential_roles, credentials, email_confirmation_tokens, mentors, persons,
    professors, students,
};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    domain::{
        error::{CredentialError, CredentialStoreError, RepositoryError},
        models::{
            credential::{GIVEN_NAME_CLAIM, NewCredential},
            policy::PasswordPolicy,
            profile::{NewProfile, RegisteredAccount},
        },
        repositories::registration_repository::RegistrationRepository,
        services::password_service::PasswordHasher,
    },
    infrastructure::argon2_password_hasher::Argon2PasswordHasher,
};

#[derive(Clone)]
pub struct PostgresRegistrationRepository {
    db: DatabaseConnection,
    password_hasher: Argon2PasswordHasher,
    password_policy: PasswordPolicy,
}

impl PostgresRegistrationRepository {
    pub fn new(db: DatabaseConnection, password_hasher: Argon2PasswordHasher) -> Self {
        Self {
            db,
            password_hasher,
            password_policy: PasswordPolicy::default(),
        }
    }

    pub fn with_policy(
        db: DatabaseConnection,
        password_hasher: Argon2PasswordHasher,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            db,
            password_hasher,
            password_policy,
        }
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRegistrationRepository {
    async fn register(
        &self,
        credential: NewCredential,
        password: &str,
        profile: NewProfile,
    ) -> Result<RegisteredAccount, CredentialStoreError> {
        self.password_policy.check(password).map_err(|message| {
            CredentialStoreError::Credential(CredentialError::WeakPassword(message))
        })?;

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

        let password_hash = self
            .password_hasher
            .hash(password)
            .map_err(CredentialStoreError::Service)?;

        let kind = profile.kind();
        let given_name = profile.display_name().to_string();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        let credential_id = Uuid::new_v4();
        let now = Utc::now().fixed_offset();
        let credential_model = credentials::ActiveModel {
            id: Set(credential_id),
            user_name: Set(credential.email.clone()),
            email: Set(credential.email),
            password_hash: Set(Some(password_hash.as_str().to_string())),
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

        let role_model = credential_roles::ActiveModel {
            credential_id: Set(credential_id),
            role: Set(kind.role().to_string()),
        };
        credential_roles::Entity::insert(role_model)
            .exec(&txn)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        let profile_id = Uuid::new_v4();
        match profile {
            NewProfile::Professor(p) => {
                let model = professors::ActiveModel {
                    id: Set(profile_id),
                    credential_id: Set(credential_id),
                    name: Set(p.name),
                    phone: Set(p.phone),
                    address: Set(p.address),
                    is_available: Set(true),
                    specialization_id: Set(p.specialization_id),
                };
                professors::Entity::insert(model).exec(&txn).await.map(|_| ())
            }
            NewProfile::Student(s) => {
                let model = students::ActiveModel {
                    id: Set(profile_id),
                    credential_id: Set(credential_id),
                    first_name: Set(s.first_name),
                    last_name: Set(s.last_name),
                    email: Set(s.email),
                    active: Set(s.active),
                    city_id: Set(s.city_id),
                    faculty_id: Set(s.faculty_id),
                    faculty_course_id: Set(s.faculty_course_id),
                    year_of_study_id: Set(s.year_of_study_id),
                    cv: Set(s.cv),
                };
                students::Entity::insert(model).exec(&txn).await.map(|_| ())
            }
            NewProfile::Mentor(m) => {
                let model = mentors::ActiveModel {
                    id: Set(profile_id),
                    credential_id: Set(credential_id),
                    first_name: Set(m.first_name),
                    last_name: Set(m.last_name),
                    title: Set(m.title),
                    occupation: Set(m.occupation),
                    email: Set(m.email),
                    address: Set(m.address),
                    firm_id: Set(m.firm_id),
                    years_of_experience: Set(m.years_of_experience),
                    competence: Set(m.competence),
                    cv: Set(m.cv),
                    activated: Set(true),
                };
                mentors::Entity::insert(model).exec(&txn).await.map(|_| ())
            }
            NewProfile::Person(p) => {
                let model = persons::ActiveModel {
                    id: Set(profile_id),
                    credential_id: Set(credential_id),
                    name: Set(p.name),
                    phone: Set(p.phone),
                    address: Set(p.address),
                    faculty_id: Set(p.faculty_id),
                };
                persons::Entity::insert(model).exec(&txn).await.map(|_| ())
            }
        }
        .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        let claim_model = credential_claims::ActiveModel {
            credential_id: Set(credential_id),
            claim_type: Set(GIVEN_NAME_CLAIM.to_string()),
            claim_value: Set(given_name),
        };
        credential_claims::Entity::insert(claim_model)
            .exec(&txn)
            .await
            .map_err(|e| {
                CredentialStoreError::Repository(RepositoryError::Database(e.to_string()))
            })?;

        // Minted here so a crash after commit still leaves a deliverable
        // token behind.
        let confirmation_token = Uuid::new_v4();
        let token_model = email_confirmation_tokens::ActiveModel {
            credential_id: Set(credential_id),
            token: Set(confirmation_token),
        };
        email_confirmation_tokens::Entity::insert(token_model)
            .exec(&txn)
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        txn.commit()
            .await
            .map_err(|e| CredentialStoreError::Repository(RepositoryError::Database(e.to_string())))?;

        Ok(RegisteredAccount {
            credential_id,
            profile_id,
            kind,
            confirmation_token,
        })
    }
}
