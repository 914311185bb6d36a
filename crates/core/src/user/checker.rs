//! Account checks run around authentication

use kimai_domain::{KimaiError, Result, User};

pub const ACCOUNT_DISABLED: &str = "User account is disabled.";

#[derive(Debug, Default, Clone, Copy)]
pub struct UserChecker;

impl UserChecker {
    pub fn check_pre_auth(&self, user: &User) -> Result<()> {
        Self::ensure_enabled(user)
    }

    pub fn check_post_auth(&self, user: &User) -> Result<()> {
        Self::ensure_enabled(user)
    }

    fn ensure_enabled(user: &User) -> Result<()> {
        if user.enabled {
            Ok(())
        } else {
            Err(KimaiError::Auth(ACCOUNT_DISABLED.to_string()))
        }
    }
}
