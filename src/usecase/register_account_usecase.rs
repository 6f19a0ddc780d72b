use crate::domain::{
    error::{RegisterError, RepositoryError},
    models::{
        account::EmailConfirmationGrant,
        lookup::RegistrationLookups,
        profile::RegisteredAccount,
        registration::RegistrationForm,
        role::ProfileKind,
        session::{IssuedSession, SessionClaims},
        policy::PasswordPolicy,
    },
    repositories::{reference_data::ReferenceData, registration_repository::RegistrationRepository},
    services::{notifier::AccountNotifier, token_service::TokenService},
};

/// A completed registration: the account that was written and the session
/// opened for it.
#[derive(Debug)]
pub struct RegistrationResult {
    pub session: IssuedSession,
    pub account: RegisteredAccount,
}

/// Registers an account of one of the four kinds. The credential, its
/// single role grant, the profile row, and any profile claims are written
/// in one transaction; the role is fixed by the kind of form submitted.
pub struct RegisterAccountUsecase<R: RegistrationRepository, T: TokenService, N: AccountNotifier, D: ReferenceData>
{
    registration_repository: R,
    token_service: T,
    notifier: N,
    reference_data: D,
    password_policy: PasswordPolicy,
}

impl<R: RegistrationRepository, T: TokenService, N: AccountNotifier, D: ReferenceData>
    RegisterAccountUsecase<R, T, N, D>
{
    pub fn new(
        registration_repository: R,
        token_service: T,
        notifier: N,
        reference_data: D,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            registration_repository,
            token_service,
            notifier,
            reference_data,
            password_policy,
        }
    }

    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationResult, RegisterError>
    where
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
        D: Send + Sync,
    {
        form.validate(&self.password_policy)
            .map_err(RegisterError::Validation)?;

        let kind = form.kind();
        let (credential, password, profile) = form.into_parts();
        let email = credential.email.clone();
        let given_name = Some(profile.display_name().to_string());

        let account = self
            .registration_repository
            .register(credential, &password, profile)
            .await?;

        // Delivery is best effort; the account exists either way and the
        // link can be re-requested.
        let grant = EmailConfirmationGrant {
            credential_id: account.credential_id,
            token: account.confirmation_token,
        };
        if let Err(err) = self.notifier.send_email_confirmation(&email, &grant).await {
            tracing::warn!(email = %email, error = %err, "confirmation mail was not sent");
        }

        let claims = SessionClaims {
            credential_id: account.credential_id,
            email,
            roles: vec![kind.role()],
            given_name,
        };
        let token = self
            .token_service
            .issue_session(&claims, false)
            .map_err(RegisterError::Service)?;
        Ok(RegistrationResult {
            session: IssuedSession {
                token,
                remember_me: false,
            },
            account,
        })
    }

    /// Drop-down data for the registration form of the given kind.
    pub async fn registration_lookups(
        &self,
        kind: ProfileKind,
    ) -> Result<RegistrationLookups, RepositoryError>
    where
        R: Send + Sync,
        T: Send + Sync,
        N: Send + Sync,
        D: Send + Sync,
    {
        Ok(match kind {
            ProfileKind::Professor => RegistrationLookups::Professor {
                specializations: self.reference_data.specializations().await?,
            },
            ProfileKind::Student => RegistrationLookups::Student {
                cities: self.reference_data.cities().await?,
                faculties: self.reference_data.faculties().await?,
                faculty_courses: self.reference_data.faculty_courses().await?,
                years_of_study: self.reference_data.years_of_study().await?,
            },
            ProfileKind::Mentor => RegistrationLookups::Mentor {
                firms: self.reference_data.firms().await?,
            },
            ProfileKind::Person => RegistrationLookups::Person {
                faculties: self.reference_data.faculties().await?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        error::CredentialError,
        models::{
            profile::NewProfile,
            registration::{PersonRegistrationForm, StudentRegistrationForm},
            role::Role,
        },
    };
    use crate::usecase::test_support::{
        FakeReferenceData, FakeRegistrationRepository, FakeTokenService, RecordingNotifier,
    };

    fn usecase(
        repository: FakeRegistrationRepository,
        tokens: FakeTokenService,
        notifier: RecordingNotifier,
    ) -> RegisterAccountUsecase<
        FakeRegistrationRepository,
        FakeTokenService,
        RecordingNotifier,
        FakeReferenceData,
    > {
        RegisterAccountUsecase::new(
            repository,
            tokens,
            notifier,
            FakeReferenceData::default(),
            PasswordPolicy::default(),
        )
    }

    fn student_form() -> RegistrationForm {
        RegistrationForm::Student(StudentRegistrationForm {
            first_name: "Iva".into(),
            last_name: "Kovač".into(),
            active: true,
            city_id: 1,
            faculty_id: 3,
            faculty_course_id: 2,
            year_of_study_id: 4,
            cv: String::new(),
            email: "iva@fer.hr".into(),
            password: "Secret1!".into(),
            confirm_password: "Secret1!".into(),
        })
    }

    fn person_form() -> RegistrationForm {
        RegistrationForm::Person(PersonRegistrationForm {
            name: "Pero Perić".into(),
            phone: "091 555 002".into(),
            address: "Ilica 5".into(),
            faculty_id: 3,
            email: "pero@fer.hr".into(),
            password: "Secret1!".into(),
            confirm_password: "Secret1!".into(),
        })
    }

    #[tokio::test]
    async fn student_registration_writes_profile_and_opens_a_session() {
        let repository = FakeRegistrationRepository::default();
        let tokens = FakeTokenService::default();
        let sut = usecase(repository.clone(), tokens.clone(), RecordingNotifier::default());

        let result = sut.register(student_form()).await.unwrap();
        assert_eq!(result.account.kind, ProfileKind::Student);
        assert!(!result.session.remember_me);

        let recorded = repository.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].credential.email, "iva@fer.hr");
        assert_eq!(recorded[0].password, "Secret1!");
        assert!(matches!(recorded[0].profile, NewProfile::Student(_)));

        let claims = tokens.last_session().unwrap();
        assert_eq!(claims.roles, vec![Role::Student]);
        assert_eq!(claims.given_name.as_deref(), Some("Iva"));
    }

    #[tokio::test]
    async fn person_registration_carries_the_student_role_and_full_name() {
        let repository = FakeRegistrationRepository::default();
        let tokens = FakeTokenService::default();
        let sut = usecase(repository, tokens.clone(), RecordingNotifier::default());

        let result = sut.register(person_form()).await.unwrap();
        assert_eq!(result.account.kind, ProfileKind::Person);

        let claims = tokens.last_session().unwrap();
        assert_eq!(claims.roles, vec![Role::Student]);
        assert_eq!(claims.given_name.as_deref(), Some("Pero Perić"));
    }

    #[tokio::test]
    async fn no_registration_path_grants_administrator() {
        let repository = FakeRegistrationRepository::default();
        let tokens = FakeTokenService::default();
        let sut = usecase(repository, tokens.clone(), RecordingNotifier::default());

        for form in [student_form(), person_form()] {
            sut.register(form).await.unwrap();
            let claims = tokens.last_session().unwrap();
            assert!(!claims.roles.contains(&Role::Administrator));
        }
    }

    #[tokio::test]
    async fn invalid_form_reports_every_field_and_writes_nothing() {
        let repository = FakeRegistrationRepository::default();
        let sut = usecase(repository.clone(), FakeTokenService::default(), RecordingNotifier::default());

        let err = sut
            .register(RegistrationForm::Student(StudentRegistrationForm::default()))
            .await
            .unwrap_err();
        let RegisterError::Validation(errors) = err else {
            panic!("expected validation errors");
        };
        assert!(errors.len() >= 8);
        assert!(repository.recorded().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_reports_a_credential_error() {
        let repository = FakeRegistrationRepository::default();
        repository.seed_existing("iva@fer.hr");
        let sut = usecase(repository, FakeTokenService::default(), RecordingNotifier::default());

        let err = sut.register(student_form()).await.unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Credential(CredentialError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn racing_duplicate_registrations_write_once() {
        let repository = FakeRegistrationRepository::default();
        let tokens = FakeTokenService::default();
        let sut = usecase(repository.clone(), tokens, RecordingNotifier::default());

        let (first, second) = tokio::join!(sut.register(student_form()), sut.register(student_form()));
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|result| matches!(
            result,
            Err(RegisterError::Credential(CredentialError::DuplicateEmail))
        )));
        assert_eq!(repository.recorded().len(), 1);
    }

    #[tokio::test]
    async fn confirmation_mail_is_sent_with_the_minted_token() {
        let repository = FakeRegistrationRepository::default();
        let notifier = RecordingNotifier::default();
        let sut = usecase(repository.clone(), FakeTokenService::default(), notifier.clone());

        let result = sut.register(student_form()).await.unwrap();
        let sent = notifier.email_confirmations();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "iva@fer.hr");
        assert_eq!(sent[0].1.token, result.account.confirmation_token);
    }

    #[tokio::test]
    async fn a_failing_notifier_does_not_fail_the_registration() {
        let repository = FakeRegistrationRepository::default();
        let sut = usecase(repository, FakeTokenService::default(), RecordingNotifier::failing());

        assert!(sut.register(student_form()).await.is_ok());
    }

    #[tokio::test]
    async fn student_lookups_cover_all_four_drop_downs() {
        let sut = usecase(
            FakeRegistrationRepository::default(),
            FakeTokenService::default(),
            RecordingNotifier::default(),
        );

        let lookups = sut.registration_lookups(ProfileKind::Student).await.unwrap();
        let RegistrationLookups::Student {
            cities,
            faculties,
            faculty_courses,
            years_of_study,
        } = lookups
        else {
            panic!("expected student lookups");
        };
        assert!(!cities.is_empty());
        assert!(!faculties.is_empty());
        assert!(!faculty_courses.is_empty());
        assert!(!years_of_study.is_empty());
    }
}
