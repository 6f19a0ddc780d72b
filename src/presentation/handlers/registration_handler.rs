use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
};

use crate::{
    domain::{
        error::RegisterError,
        models::{
            registration::{
                MentorRegistrationForm, PersonRegistrationForm, ProfessorRegistrationForm,
                RegistrationForm, StudentRegistrationForm,
            },
            role::ProfileKind,
        },
        repositories::{
            reference_data::ReferenceData, registration_repository::RegistrationRepository,
        },
        services::{notifier::AccountNotifier, token_service::TokenService},
    },
    presentation::handlers::{credential_errors, server_error, session_cookie, unprocessable},
    usecase::register_account_usecase::RegisterAccountUsecase,
};

/* Router Function and Handler Function */

/// function return Router object for the four registration forms
/// Suppose to be nested by main router under /account

pub fn create_registration_router<
    R: RegistrationRepository + Send + Sync + 'static + Clone,
    T: TokenService + Send + Sync + 'static + Clone,
    N: AccountNotifier + Send + Sync + 'static + Clone,
    D: ReferenceData + Send + Sync + 'static + Clone,
>(
    register_service: RegisterAccountUsecase<R, T, N, D>,
) -> Router {
    let state = AppState {
        register_service: Arc::new(register_service),
    };

    Router::new()
        .route(
            "/register/professor",
            get(professor_lookups::<R, T, N, D>).post(register_professor::<R, T, N, D>),
        )
        .route(
            "/register/student",
            get(student_lookups::<R, T, N, D>).post(register_student::<R, T, N, D>),
        )
        .route(
            "/register/mentor",
            get(mentor_lookups::<R, T, N, D>).post(register_mentor::<R, T, N, D>),
        )
        .route(
            "/register/person",
            get(person_lookups::<R, T, N, D>).post(register_person::<R, T, N, D>),
        )
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState<
    R: RegistrationRepository,
    T: TokenService,
    N: AccountNotifier,
    D: ReferenceData,
> {
    pub register_service: Arc<RegisterAccountUsecase<R, T, N, D>>,
}

// handler function

/// handler function for the drop-down data a registration form needs
async fn lookups<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    state: &AppState<R, T, N, D>,
    kind: ProfileKind,
) -> Response {
    match state.register_service.registration_lookups(kind).await {
        Ok(lookups) => (StatusCode::OK, Json(lookups)).into_response(),
        Err(_) => server_error(),
    }
}

async fn professor_lookups<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
) -> impl IntoResponse {
    lookups(&state, ProfileKind::Professor).await
}

async fn student_lookups<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
) -> impl IntoResponse {
    lookups(&state, ProfileKind::Student).await
}

async fn mentor_lookups<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
) -> impl IntoResponse {
    lookups(&state, ProfileKind::Mentor).await
}

async fn person_lookups<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
) -> impl IntoResponse {
    lookups(&state, ProfileKind::Person).await
}

/// On success the new account is signed in and sent to its kind's listing.
/// A rejected submission echoes the form values (never the passwords) with
/// the field errors.
async fn submit<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    state: &AppState<R, T, N, D>,
    form: RegistrationForm,
) -> Response {
    let values = form.clone();
    match state.register_service.register(form).await {
        Ok(result) => (
            AppendHeaders([(SET_COOKIE, session_cookie(&result.session))]),
            Redirect::to(result.account.kind.listing_path()),
        )
            .into_response(),
        Err(RegisterError::Validation(errors)) => unprocessable(values, errors),
        Err(RegisterError::Credential(err)) => unprocessable(values, credential_errors(&err)),
        Err(RegisterError::Repository(_)) | Err(RegisterError::Service(_)) => server_error(),
    }
}

/// handler function for professor registration
async fn register_professor<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
    Form(form): Form<ProfessorRegistrationForm>,
) -> impl IntoResponse {
    submit(&state, RegistrationForm::Professor(form)).await
}

/// handler function for student registration
async fn register_student<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
    Form(form): Form<StudentRegistrationForm>,
) -> impl IntoResponse {
    submit(&state, RegistrationForm::Student(form)).await
}

/// handler function for mentor registration
async fn register_mentor<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
    Form(form): Form<MentorRegistrationForm>,
) -> impl IntoResponse {
    submit(&state, RegistrationForm::Mentor(form)).await
}

/// handler function for interested-person registration
async fn register_person<
    R: RegistrationRepository + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
    D: ReferenceData + Send + Sync,
>(
    State(state): State<AppState<R, T, N, D>>,
    Form(form): Form<PersonRegistrationForm>,
) -> impl IntoResponse {
    submit(&state, RegistrationForm::Person(form)).await
}
