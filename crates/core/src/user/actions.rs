//! Page actions offered on a user's profile views (`user_views`)

use kimai_domain::{Permission, User};

pub const USER_VIEWS: &str = "user_views";

/// Action ids the actor may perform on `user`, in display order.
///
/// Unsaved users have no actions.
pub fn user_view_actions(actor: &User, user: &User) -> Vec<&'static str> {
    if user.id == 0 {
        return Vec::new();
    }

    let own = actor.id == user.id;
    let manage = actor.has_permission(Permission::ViewUser);
    let mut actions = Vec::new();

    if own || actor.has_permission(Permission::ViewOtherProfile) {
        actions.push("profile-stats");
    }
    if own || manage {
        actions.extend(["edit", "settings", "password", "api-token"]);
    }
    if manage {
        actions.push("teams");
    }
    if actor.has_permission(Permission::SystemConfiguration) {
        actions.push("roles");
    }
    actions
}
