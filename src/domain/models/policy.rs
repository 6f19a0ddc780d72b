/// Password strength rules applied when a credential is created or its
/// password replaced.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            return Err(format!(
                "The password must be at least {} characters long.",
                self.min_length
            ));
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("The password must contain at least one digit.".to_string());
        }
        Ok(())
    }
}

/// Failed-sign-in accounting rules. Failures older than `reset_window_minutes`
/// no longer count toward the threshold; reaching the threshold locks the
/// credential out for `lockout_minutes`.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub max_failed_attempts: i32,
    pub lockout_minutes: i64,
    pub reset_window_minutes: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_minutes: 15,
            reset_window_minutes: 5,
        }
    }
}
