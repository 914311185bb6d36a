//! Users and their preferences

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::permissions::{roles_grant, Permission, Role};

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub enabled: bool,
    pub roles: Vec<Role>,
    /// IANA timezone name
    pub timezone: String,
    pub language: String,
    /// Hex encoded sha256 digest of the API token
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// A new enabled user with `ROLE_USER` and default preferences.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: 0,
            username: username.into(),
            email: email.into(),
            alias: None,
            title: None,
            enabled: true,
            roles: vec![Role::User],
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            api_token: None,
            hourly_rate: None,
            internal_rate: None,
            created_at: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.alias.as_deref().filter(|alias| !alias.is_empty()).unwrap_or(&self.username)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(Role::SuperAdmin)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        roles_grant(&self.roles, permission)
    }

    /// Adds `role` unless present. Returns false when nothing changed.
    pub fn add_role(&mut self, role: Role) -> bool {
        if self.has_role(role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// The user's timezone, UTC when the stored name is unknown.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }
}
