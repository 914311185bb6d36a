//! User administration subcommands

use std::io::Write;

use kimai_domain::{KimaiError, Result, Role, User};

use super::SURFACE;
use crate::context::AppContext;
use crate::utils::execute_logged;

fn parse_role(role: Option<&str>) -> Result<Option<Role>> {
    role.map(|name| name.parse::<Role>().map_err(KimaiError::InvalidInput)).transpose()
}

/// Add `role` (or super admin) to an existing user and print the result.
pub async fn promote_user(
    ctx: &AppContext,
    username: &str,
    role: Option<&str>,
    super_admin: bool,
    out: &mut dyn Write,
) -> Result<i32> {
    let role = parse_role(role)?;
    let message = execute_logged("user::promote", SURFACE, || {
        ctx.users.promote(username, role, super_admin)
    })
    .await?;
    writeln!(out, "{message}")?;
    Ok(0)
}

pub async fn create_user(
    ctx: &AppContext,
    username: &str,
    email: &str,
    role: Option<&str>,
    token: Option<&str>,
    out: &mut dyn Write,
) -> Result<i32> {
    let mut user = User::new(username, email);
    if let Some(role) = parse_role(role)? {
        user.add_role(role);
    }

    let user =
        execute_logged("user::create", SURFACE, || ctx.users.create(user, token)).await?;
    writeln!(out, "User {} has been created with id {}.", user.username, user.id)?;
    Ok(0)
}
