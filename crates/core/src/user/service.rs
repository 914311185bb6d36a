//! User service - lookup, token authentication and role management

use std::sync::Arc;

use kimai_domain::query::Visibility;
use kimai_domain::{KimaiError, Permission, Result, Role, User};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::checker::UserChecker;
use super::ports::UserRepository;
use crate::access::require;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

/// Hex encoded sha256 digest of an API token, as stored on the user.
pub fn hash_api_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    checker: UserChecker,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users, checker: UserChecker }
    }

    pub async fn list(&self, actor: &User, visibility: Visibility) -> Result<Vec<User>> {
        require(actor, Permission::ViewUser)?;
        self.users.list(visibility).await
    }

    pub async fn get(&self, actor: &User, id: i64) -> Result<User> {
        if actor.id != id {
            require(actor, Permission::ViewUser)?;
        }
        self.users.find(id).await?.ok_or_else(|| KimaiError::not_found("User", id))
    }

    /// Resolve a user from username and plain API token.
    pub async fn authenticate(&self, username: &str, token: &str) -> Result<User> {
        let Some(user) = self.users.find_by_username(username).await? else {
            warn!(username, "authentication for unknown user");
            return Err(KimaiError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        self.checker.check_pre_auth(&user)?;

        let matches = user
            .api_token
            .as_deref()
            .is_some_and(|digest| digest.eq_ignore_ascii_case(&hash_api_token(token)));
        if !matches {
            warn!(username, "authentication with invalid token");
            return Err(KimaiError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        self.checker.check_post_auth(&user)?;
        Ok(user)
    }

    /// Create a user with an optional plain API token.
    pub async fn create(&self, mut user: User, token: Option<&str>) -> Result<User> {
        if user.username.trim().is_empty() {
            return Err(KimaiError::InvalidInput("Username must not be empty".into()));
        }
        if self.users.find_by_username(&user.username).await?.is_some() {
            return Err(KimaiError::Conflict(format!(
                "The username {} is already used",
                user.username
            )));
        }
        user.api_token = token.map(hash_api_token);
        let user = self.users.create(user).await?;
        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Add `role` (or super admin) to a user and describe the outcome.
    pub async fn promote(
        &self,
        username: &str,
        role: Option<Role>,
        super_admin: bool,
    ) -> Result<String> {
        let role = match (role, super_admin) {
            (_, true) => Role::SuperAdmin,
            (Some(role), false) => role,
            (None, false) => {
                return Err(KimaiError::InvalidInput(
                    "Please provide a role or use the super admin flag".into(),
                ))
            }
        };

        let mut user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| KimaiError::not_found("User", username))?;

        if !user.add_role(role) {
            return Ok(format!("User {username} did already have {role} role."));
        }
        self.users.update(&user).await?;
        info!(username, role = %role, "user promoted");

        if super_admin {
            Ok(format!("User {username} has been promoted as a super administrator."))
        } else {
            Ok(format!("Role {role} has been added to user {username}."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_digest_is_sha256_hex() {
        assert_eq!(
            hash_api_token("secret"),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }
}
