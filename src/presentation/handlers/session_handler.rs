use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        error::{ExternalConfirmError, ServiceError, SignInError, ValidationErrors},
        models::session::{
            ExternalAssertion, ExternalConfirmationForm, ExternalSignInOutcome, SendCodeForm,
            SignInForm, SignInOutcome, TwoFactorOutcome, VerifyCodeForm,
        },
        repositories::{credential_store::CredentialStore, role_directory::RoleDirectory},
        services::{
            notifier::AccountNotifier, password_service::PasswordHasher,
            token_service::TokenService,
        },
    },
    presentation::handlers::{
        DEVICE_COOKIE, EXTERNAL_COOKIE, FormRejection, PENDING_COOKIE, SESSION_COOKIE,
        clear_cookie, cookie_value, credential_errors, device_cookie, external_cookie,
        locked_out, pending_cookie, resolve_return_url, server_error, session_cookie,
        unprocessable,
    },
    usecase::sign_in_usecase::SignInUsecase,
};

// Request

/// urlencoded form for the external provider callback; the assertion is
/// taken as already verified upstream
#[derive(Serialize, Deserialize)]
pub struct ExternalCallbackRequest {
    pub provider: String,
    pub subject: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub return_url: Option<String>,
}

// Response

/// json for the second-factor channels a pending sign-in may use
#[derive(Serialize, Deserialize)]
pub struct SendCodeOptions {
    pub providers: Vec<String>,
}

/// json prompting the confirmation step for an unlinked external identity
#[derive(Serialize, Deserialize)]
pub struct ExternalConfirmationPrompt {
    pub provider: String,
    pub email: Option<String>,
}

/* Router Function and Handler Function */

/// function return Router object for sign-in, two-factor, and sign-out
/// Suppose to be nested by main router under /account

pub fn create_session_router<
    S: CredentialStore + Send + Sync + 'static + Clone,
    P: PasswordHasher + Send + Sync + 'static + Clone,
    R: RoleDirectory + Send + Sync + 'static + Clone,
    T: TokenService + Send + Sync + 'static + Clone,
    N: AccountNotifier + Send + Sync + 'static + Clone,
>(
    sign_in_service: SignInUsecase<S, P, R, T, N>,
) -> Router {
    let state = AppState {
        sign_in_service: Arc::new(sign_in_service),
    };

    Router::new()
        .route("/login", post(login::<S, P, R, T, N>))
        .route(
            "/send-code",
            get(send_code_options::<S, P, R, T, N>).post(send_code::<S, P, R, T, N>),
        )
        .route("/verify-code", post(verify_code::<S, P, R, T, N>))
        .route("/logout", post(logout))
        .route("/external/callback", post(external_callback::<S, P, R, T, N>))
        .route("/external/confirm", post(confirm_external::<S, P, R, T, N>))
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState<
    S: CredentialStore,
    P: PasswordHasher,
    R: RoleDirectory,
    T: TokenService,
    N: AccountNotifier,
> {
    pub sign_in_service: Arc<SignInUsecase<S, P, R, T, N>>,
}

// handler function

/// handler function for password sign-in
async fn login<
    S: CredentialStore + Send + Sync,
    P: PasswordHasher + Send + Sync,
    R: RoleDirectory + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
>(
    State(state): State<AppState<S, P, R, T, N>>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> impl IntoResponse {
    let values = form.clone();
    let target = resolve_return_url(values.return_url.as_deref()).to_string();
    let device = cookie_value(&headers, DEVICE_COOKIE);

    match state.sign_in_service.sign_in(form, device).await {
        Ok(SignInOutcome::Success(session)) => (
            AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
            Redirect::to(&target),
        )
            .into_response(),
        Ok(SignInOutcome::RequiresTwoFactor { pending }) => (
            AppendHeaders([(SET_COOKIE, pending_cookie(&pending))]),
            Redirect::to("/account/send-code"),
        )
            .into_response(),
        Ok(SignInOutcome::LockedOut) => locked_out(),
        Ok(SignInOutcome::Failure) => invalid_login(values),
        Err(SignInError::Validation(errors)) => unprocessable(values, errors),
        Err(_) => server_error(),
    }
}

/// handler function for listing a pending sign-in's second-factor channels
async fn send_code_options<
    S: CredentialStore + Send + Sync,
    P: PasswordHasher + Send + Sync,
    R: RoleDirectory + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
>(
    State(state): State<AppState<S, P, R, T, N>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(pending) = cookie_value(&headers, PENDING_COOKIE) else {
        return expired_sign_in();
    };
    match state.sign_in_service.two_factor_providers(pending).await {
        Ok(providers) => (StatusCode::OK, Json(SendCodeOptions { providers })).into_response(),
        Err(SignInError::Service(ServiceError::TokenInvalid)) => expired_sign_in(),
        Err(_) => server_error(),
    }
}

/// handler function for dispatching a two-factor code
async fn send_code<
    S: CredentialStore + Send + Sync,
    P: PasswordHasher + Send + Sync,
    R: RoleDirectory + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
>(
    State(state): State<AppState<S, P, R, T, N>>,
    headers: HeaderMap,
    Form(form): Form<SendCodeForm>,
) -> impl IntoResponse {
    let Some(pending) = cookie_value(&headers, PENDING_COOKIE) else {
        return expired_sign_in();
    };
    let mut form = form;
    form.pending = pending.to_string();
    let values = form.clone();

    match state.sign_in_service.send_code(form).await {
        Ok(()) => Redirect::to("/account/verify-code").into_response(),
        Err(SignInError::Validation(errors)) => unprocessable(values, errors),
        Err(SignInError::Service(ServiceError::TokenInvalid)) => expired_sign_in(),
        Err(_) => server_error(),
    }
}

/// handler function for checking a two-factor code
async fn verify_code<
    S: CredentialStore + Send + Sync,
    P: PasswordHasher + Send + Sync,
    R: RoleDirectory + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
>(
    State(state): State<AppState<S, P, R, T, N>>,
    headers: HeaderMap,
    Form(form): Form<VerifyCodeForm>,
) -> impl IntoResponse {
    let Some(pending) = cookie_value(&headers, PENDING_COOKIE) else {
        return expired_sign_in();
    };
    let mut form = form;
    form.pending = pending.to_string();
    let values = form.clone();
    let target = resolve_return_url(values.return_url.as_deref()).to_string();

    match state.sign_in_service.verify_code(form).await {
        Ok(TwoFactorOutcome::Success {
            session,
            remember_browser,
        }) => {
            let mut cookies = vec![
                (SET_COOKIE, session_cookie(&session)),
                (SET_COOKIE, clear_cookie(PENDING_COOKIE)),
            ];
            if let Some(device) = remember_browser {
                cookies.push((SET_COOKIE, device_cookie(&device)));
            }
            (AppendHeaders(cookies), Redirect::to(&target)).into_response()
        }
        Ok(TwoFactorOutcome::LockedOut) => locked_out(),
        Ok(TwoFactorOutcome::Failure) => invalid_code(values),
        Err(SignInError::Validation(errors)) => unprocessable(values, errors),
        Err(SignInError::Service(ServiceError::TokenInvalid)) => expired_sign_in(),
        Err(_) => server_error(),
    }
}

/// handler function for sign-out
async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_cookie(SESSION_COOKIE))]),
        Redirect::to("/"),
    )
}

/// handler function for a verified external identity assertion
async fn external_callback<
    S: CredentialStore + Send + Sync,
    P: PasswordHasher + Send + Sync,
    R: RoleDirectory + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
>(
    State(state): State<AppState<S, P, R, T, N>>,
    headers: HeaderMap,
    Form(payload): Form<ExternalCallbackRequest>,
) -> impl IntoResponse {
    let target = resolve_return_url(payload.return_url.as_deref()).to_string();
    let device = cookie_value(&headers, DEVICE_COOKIE);
    let assertion = ExternalAssertion {
        provider: payload.provider,
        subject: payload.subject,
        email: payload.email,
    };

    match state.sign_in_service.external_callback(assertion, device).await {
        Ok(ExternalSignInOutcome::Success(session)) => (
            AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
            Redirect::to(&target),
        )
            .into_response(),
        Ok(ExternalSignInOutcome::RequiresTwoFactor { pending }) => (
            AppendHeaders([(SET_COOKIE, pending_cookie(&pending))]),
            Redirect::to("/account/send-code"),
        )
            .into_response(),
        Ok(ExternalSignInOutcome::NotLinked {
            pending,
            provider,
            email,
        }) => (
            StatusCode::OK,
            AppendHeaders([(SET_COOKIE, external_cookie(&pending))]),
            Json(ExternalConfirmationPrompt { provider, email }),
        )
            .into_response(),
        Ok(ExternalSignInOutcome::LockedOut) => locked_out(),
        Ok(ExternalSignInOutcome::Failure) => {
            (StatusCode::UNAUTHORIZED, Json("Invalid login attempt.")).into_response()
        }
        Err(_) => server_error(),
    }
}

/// handler function for completing an external sign-in that has no account
async fn confirm_external<
    S: CredentialStore + Send + Sync,
    P: PasswordHasher + Send + Sync,
    R: RoleDirectory + Send + Sync,
    T: TokenService + Send + Sync,
    N: AccountNotifier + Send + Sync,
>(
    State(state): State<AppState<S, P, R, T, N>>,
    headers: HeaderMap,
    Form(form): Form<ExternalConfirmationForm>,
) -> impl IntoResponse {
    let Some(pending) = cookie_value(&headers, EXTERNAL_COOKIE) else {
        return expired_sign_in();
    };
    let mut form = form;
    form.pending = pending.to_string();
    let values = form.clone();
    let target = resolve_return_url(values.return_url.as_deref()).to_string();

    match state.sign_in_service.confirm_external(form).await {
        Ok(session) => (
            AppendHeaders([
                (SET_COOKIE, session_cookie(&session)),
                (SET_COOKIE, clear_cookie(EXTERNAL_COOKIE)),
            ]),
            Redirect::to(&target),
        )
            .into_response(),
        Err(ExternalConfirmError::Validation(errors)) => unprocessable(values, errors),
        Err(ExternalConfirmError::Credential(err)) => {
            unprocessable(values, credential_errors(&err))
        }
        Err(_) => server_error(),
    }
}

/// The one message every failed password attempt gets, whatever actually
/// went wrong.
fn invalid_login<V: Serialize>(values: V) -> Response {
    let mut errors = ValidationErrors::new();
    errors.add("", "Invalid login attempt.");
    (
        StatusCode::UNAUTHORIZED,
        Json(FormRejection { values, errors }),
    )
        .into_response()
}

fn invalid_code<V: Serialize>(values: V) -> Response {
    let mut errors = ValidationErrors::new();
    errors.add("", "Invalid code.");
    (
        StatusCode::UNAUTHORIZED,
        Json(FormRejection { values, errors }),
    )
        .into_response()
}

fn expired_sign_in() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json("The sign-in request has expired. Please sign in again."),
    )
        .into_response()
}
