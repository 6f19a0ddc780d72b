pub mod account;
pub mod credential;
pub mod lookup;
pub mod policy;
pub mod profile;
pub mod registration;
pub mod role;
pub mod session;
