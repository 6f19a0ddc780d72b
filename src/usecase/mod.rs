pub mod account_admin_usecase;
pub mod account_recovery_usecase;
pub mod register_account_usecase;
pub mod sign_in_usecase;

#[cfg(test)]
pub(crate) mod test_support;
