pub mod argon2_password_hasher;
pub mod jwt_token_service;
pub mod postgres_credential_store;
pub mod postgres_profile_repository;
pub mod postgres_reference_data;
pub mod postgres_registration_repository;
pub mod postgres_role_directory;
pub mod tracing_notifier;
