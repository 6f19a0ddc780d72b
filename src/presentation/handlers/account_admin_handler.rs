use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{
        error::EditCredentialError,
        models::{account::EditCredentialForm, credential::Credential},
        repositories::{
            credential_store::CredentialStore, profile_repository::ProfileRepository,
        },
    },
    presentation::handlers::{credential_errors, server_error, unprocessable},
    usecase::account_admin_usecase::AccountAdminUsecase,
};

// Response

/// json for the credential edit form prefill
#[derive(Serialize, Deserialize)]
pub struct CredentialPrefill {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
}

impl From<Credential> for CredentialPrefill {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id(),
            email: credential.email().to_string(),
            is_active: credential.is_active(),
        }
    }
}

/* Router Function and Handler Function */

/// function return Router object for the account administration pages
/// Suppose to be nested by main router under /account

pub fn create_account_admin_router<
    S: CredentialStore + Send + Sync + 'static + Clone,
    P: ProfileRepository + Send + Sync + 'static + Clone,
>(
    admin_service: AccountAdminUsecase<S, P>,
) -> Router {
    let state = AppState {
        admin_service: Arc::new(admin_service),
    };

    Router::new()
        .route("/users", get(list_users::<S, P>))
        .route(
            "/users/{id}",
            get(edit_user_prefill::<S, P>).post(edit_user::<S, P>),
        )
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState<S: CredentialStore, P: ProfileRepository> {
    pub admin_service: Arc<AccountAdminUsecase<S, P>>,
}

// handler function

/// handler function for the account listing
async fn list_users<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    match state.admin_service.list_accounts().await {
        Ok(accounts) => (StatusCode::OK, Json(accounts)).into_response(),
        Err(_) => server_error(),
    }
}

/// handler function for prefilling the credential edit form
async fn edit_user_prefill<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.admin_service.credential(id).await {
        Ok(credential) => {
            (StatusCode::OK, Json(CredentialPrefill::from(credential))).into_response()
        }
        Err(EditCredentialError::NotFound) => not_found(),
        Err(_) => server_error(),
    }
}

/// handler function for updating a credential's email and active flag
async fn edit_user<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
    Path(id): Path<Uuid>,
    Form(form): Form<EditCredentialForm>,
) -> impl IntoResponse {
    let values = form.clone();
    match state.admin_service.edit_credential(id, form).await {
        Ok(()) => Redirect::to("/account/users").into_response(),
        Err(EditCredentialError::NotFound) => not_found(),
        Err(EditCredentialError::Validation(errors)) => unprocessable(values, errors),
        Err(EditCredentialError::Credential(err)) => unprocessable(values, credential_errors(&err)),
        Err(EditCredentialError::Repository(_)) => server_error(),
    }
}

fn not_found() -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json("No account with that id.")).into_response()
}
