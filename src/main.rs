mod config;
mod domain;
mod infrastructure;
mod presentation;
mod usecase;

use axum::{Router, routing::get};
use sea_orm::{ConnectOptions, Database};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::{
    config::AppConfig,
    infrastructure::{
        argon2_password_hasher::Argon2PasswordHasher,
        jwt_token_service::JwtTokenService,
        postgres_credential_store::PostgresCredentialStore,
        postgres_profile_repository::PostgresProfileRepository,
        postgres_reference_data::PostgresReferenceData,
        postgres_registration_repository::PostgresRegistrationRepository,
        postgres_role_directory::PostgresRoleDirectory,
        tracing_notifier::TracingAccountNotifier,
    },
    presentation::handlers::{
        account_admin_handler::create_account_admin_router,
        profile_handler::create_profile_router, recovery_handler::create_recovery_router,
        registration_handler::create_registration_router, session_handler::create_session_router,
    },
    usecase::{
        account_admin_usecase::AccountAdminUsecase,
        account_recovery_usecase::AccountRecoveryUsecase,
        register_account_usecase::RegisterAccountUsecase, sign_in_usecase::SignInUsecase,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env()?;

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10)
        .min_connections(1)
        .sqlx_logging(true);
    let db = Database::connect(opt)
        .await
        .expect("Connection to DB failed");

    let password_hasher = Argon2PasswordHasher::new();
    let token_service = JwtTokenService::with_lifetimes(
        config.token_secret.clone(),
        config.session_minutes,
        config.remembered_session_minutes,
        config.pending_minutes,
        config.remembered_browser_days,
    );
    let notifier = TracingAccountNotifier::new();
    let credential_store = PostgresCredentialStore::with_policies(
        db.clone(),
        password_hasher.clone(),
        config.password_policy.clone(),
        config.lockout_policy.clone(),
        config.reset_token_minutes,
        config.two_factor_code_minutes,
    );
    let registration_repository = PostgresRegistrationRepository::with_policy(
        db.clone(),
        password_hasher.clone(),
        config.password_policy.clone(),
    );
    let role_directory = PostgresRoleDirectory::new(db.clone());
    let profile_repository = PostgresProfileRepository::new(db.clone());
    let reference_data = PostgresReferenceData::new(db.clone());

    let register_service = RegisterAccountUsecase::new(
        registration_repository.clone(),
        token_service.clone(),
        notifier,
        reference_data.clone(),
        config.password_policy.clone(),
    );
    let sign_in_service = SignInUsecase::new(
        credential_store.clone(),
        password_hasher.clone(),
        role_directory.clone(),
        token_service.clone(),
        notifier,
    );
    let recovery_service = AccountRecoveryUsecase::new(
        credential_store.clone(),
        notifier,
        config.password_policy.clone(),
    );
    let admin_service =
        AccountAdminUsecase::new(credential_store.clone(), profile_repository.clone());
    // The public listings run on the same usecase; each router owns a copy.
    let listing_service =
        AccountAdminUsecase::new(credential_store.clone(), profile_repository.clone());

    let account_routes = create_registration_router(register_service)
        .merge(create_session_router(sign_in_service))
        .merge(create_recovery_router(recovery_service))
        .merge(create_account_admin_router(admin_service));

    let app = Router::new()
        .route("/", get(|| async { "Praksa API" }))
        .nest("/account", account_routes)
        .merge(create_profile_router(listing_service));

    tracing::info!(addr = %config.listen_addr, "listening");
    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
