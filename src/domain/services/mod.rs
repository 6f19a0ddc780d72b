pub mod notifier;
pub mod password_service;
pub mod token_service;
