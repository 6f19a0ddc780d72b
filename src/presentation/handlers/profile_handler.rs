use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};

use crate::{
    domain::{
        models::role::ProfileKind,
        repositories::{
            credential_store::CredentialStore, profile_repository::ProfileRepository,
        },
    },
    presentation::handlers::server_error,
    usecase::account_admin_usecase::AccountAdminUsecase,
};

/* Router Function and Handler Function */

/// function return Router object for the public profile listings, the
/// pages a fresh registration is redirected to
/// Suppose to be merged into the main router at the root

pub fn create_profile_router<
    S: CredentialStore + Send + Sync + 'static + Clone,
    P: ProfileRepository + Send + Sync + 'static + Clone,
>(
    admin_service: AccountAdminUsecase<S, P>,
) -> Router {
    let state = AppState {
        admin_service: Arc::new(admin_service),
    };

    Router::new()
        .route("/professors", get(professors::<S, P>))
        .route("/students", get(students::<S, P>))
        .route("/mentors", get(mentors::<S, P>))
        .route("/persons", get(persons::<S, P>))
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState<S: CredentialStore, P: ProfileRepository> {
    pub admin_service: Arc<AccountAdminUsecase<S, P>>,
}

// handler function

async fn listing<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    state: &AppState<S, P>,
    kind: ProfileKind,
) -> axum::response::Response {
    match state.admin_service.profiles(kind).await {
        Ok(profiles) => (StatusCode::OK, Json(profiles)).into_response(),
        Err(_) => server_error(),
    }
}

async fn professors<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    listing(&state, ProfileKind::Professor).await
}

async fn students<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    listing(&state, ProfileKind::Student).await
}

async fn mentors<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    listing(&state, ProfileKind::Mentor).await
}

async fn persons<S: CredentialStore + Send + Sync, P: ProfileRepository + Send + Sync>(
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse {
    listing(&state, ProfileKind::Person).await
}
