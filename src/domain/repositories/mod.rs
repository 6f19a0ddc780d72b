pub mod credential_store;
pub mod profile_repository;
pub mod reference_data;
pub mod registration_repository;
pub mod role_directory;
