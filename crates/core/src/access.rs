//! Permission checks shared by services

use kimai_domain::permissions::own_or_other;
use kimai_domain::{KimaiError, Permission, Result, User};

/// Fail with `AccessDenied` unless `actor` holds `permission`.
pub fn require(actor: &User, permission: Permission) -> Result<()> {
    if actor.has_permission(permission) {
        Ok(())
    } else {
        Err(KimaiError::AccessDenied(format!("Missing permission: {permission}")))
    }
}

/// Check the own/other variant of a permission for a record owned by `owner_id`.
pub fn require_for_owner(
    actor: &User,
    owner_id: i64,
    own: Permission,
    other: Permission,
) -> Result<()> {
    require(actor, own_or_other(actor.id == owner_id, own, other))
}

pub fn allowed_for_owner(actor: &User, owner_id: i64, own: Permission, other: Permission) -> bool {
    actor.has_permission(own_or_other(actor.id == owner_id, own, other))
}
