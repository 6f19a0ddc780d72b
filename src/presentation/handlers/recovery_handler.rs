use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{
        error::ResetPasswordError,
        models::account::{ForgotPasswordForm, ResetPasswordForm},
        repositories::credential_store::CredentialStore,
        services::notifier::AccountNotifier,
    },
    presentation::handlers::{credential_errors, server_error, unprocessable},
    usecase::account_recovery_usecase::AccountRecoveryUsecase,
};

// Request

/// query for the emailed confirmation link
#[derive(Serialize, Deserialize)]
pub struct ConfirmEmailQuery {
    pub credential_id: Uuid,
    pub token: Uuid,
}

/* Router Function and Handler Function */

/// function return Router object for password reset and email confirmation
/// Suppose to be nested by main router under /account

pub fn create_recovery_router<
    S: CredentialStore + Send + Sync + 'static + Clone,
    N: AccountNotifier + Send + Sync + 'static + Clone,
>(
    recovery_service: AccountRecoveryUsecase<S, N>,
) -> Router {
    let state = AppState {
        recovery_service: Arc::new(recovery_service),
    };

    Router::new()
        .route("/forgot-password", post(forgot_password::<S, N>))
        .route("/reset-password", post(reset_password::<S, N>))
        .route("/confirm-email", get(confirm_email::<S, N>))
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState<S: CredentialStore, N: AccountNotifier> {
    pub recovery_service: Arc<AccountRecoveryUsecase<S, N>>,
}

// handler function

/// handler function for requesting a password reset link. The body is the
/// same whether or not the address belongs to a confirmed account.
async fn forgot_password<S: CredentialStore + Send + Sync, N: AccountNotifier + Send + Sync>(
    State(state): State<AppState<S, N>>,
    Form(form): Form<ForgotPasswordForm>,
) -> impl IntoResponse {
    let values = form.clone();
    match state.recovery_service.request_reset(form).await {
        Ok(()) => (
            StatusCode::OK,
            Json("Please check your email to reset your password."),
        )
            .into_response(),
        Err(ResetPasswordError::Validation(errors)) => unprocessable(values, errors),
        Err(_) => server_error(),
    }
}

/// handler function for completing a password reset
async fn reset_password<S: CredentialStore + Send + Sync, N: AccountNotifier + Send + Sync>(
    State(state): State<AppState<S, N>>,
    Form(form): Form<ResetPasswordForm>,
) -> impl IntoResponse {
    let values = form.clone();
    match state.recovery_service.complete_reset(form).await {
        Ok(()) => Redirect::to("/account/reset-password/confirmation").into_response(),
        Err(ResetPasswordError::Validation(errors)) => unprocessable(values, errors),
        Err(ResetPasswordError::Credential(err)) => unprocessable(values, credential_errors(&err)),
        Err(_) => server_error(),
    }
}

/// handler function for the emailed confirmation link
async fn confirm_email<S: CredentialStore + Send + Sync, N: AccountNotifier + Send + Sync>(
    State(state): State<AppState<S, N>>,
    Query(query): Query<ConfirmEmailQuery>,
) -> impl IntoResponse {
    match state
        .recovery_service
        .confirm_email(query.credential_id, query.token)
        .await
    {
        Ok(true) => (StatusCode::OK, Json("Thank you for confirming your email.")).into_response(),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json("The confirmation link is invalid or has expired."),
        )
            .into_response(),
        Err(_) => server_error(),
    }
}
