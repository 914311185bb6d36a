//! Roles and the permissions they grant

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Security role assigned to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_TEAMLEAD")]
    Teamlead,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_SUPER_ADMIN")]
    SuperAdmin,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::User, Self::Teamlead, Self::Admin, Self::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Teamlead => "ROLE_TEAMLEAD",
            Self::Admin => "ROLE_ADMIN",
            Self::SuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }

    /// Permissions granted by this role alone (roles are cumulative).
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Self::User => &[
                ViewOwnTimesheet,
                CreateOwnTimesheet,
                EditOwnTimesheet,
                DeleteOwnTimesheet,
            ],
            Self::Teamlead => &[
                ViewOtherTimesheet,
                EditOtherTimesheet,
                EditBillableOwnTimesheet,
                EditExportOwnTimesheet,
                ViewInvoice,
                ViewProject,
                ViewReporting,
            ],
            Self::Admin => &[
                CreateOtherTimesheet,
                DeleteOtherTimesheet,
                EditExportedTimesheet,
                EditExportOtherTimesheet,
                EditBillableOtherTimesheet,
                EditRateOwnTimesheet,
                EditRateOtherTimesheet,
                CreateInvoice,
                ManageInvoiceTemplate,
                CreateProject,
                EditProject,
                DeleteProject,
                ViewUser,
                ViewOtherProfile,
            ],
            Self::SuperAdmin => &[Plugins, SystemConfiguration],
        }
    }

    /// The role and all roles below it.
    pub fn hierarchy(&self) -> &'static [Self] {
        match self {
            Self::User => &[Self::User],
            Self::Teamlead => &[Self::User, Self::Teamlead],
            Self::Admin => &[Self::User, Self::Teamlead, Self::Admin],
            Self::SuperAdmin => &Self::ALL,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let normalized = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match normalized {
            "USER" => Ok(Self::User),
            "TEAMLEAD" => Ok(Self::Teamlead),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            _ => Err(format!("Invalid Role: {s}")),
        }
    }
}

/// Fine-grained permission checked by services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewOwnTimesheet,
    ViewOtherTimesheet,
    CreateOwnTimesheet,
    CreateOtherTimesheet,
    EditOwnTimesheet,
    EditOtherTimesheet,
    DeleteOwnTimesheet,
    DeleteOtherTimesheet,
    EditExportedTimesheet,
    EditExportOwnTimesheet,
    EditExportOtherTimesheet,
    EditBillableOwnTimesheet,
    EditBillableOtherTimesheet,
    EditRateOwnTimesheet,
    EditRateOtherTimesheet,
    ViewInvoice,
    CreateInvoice,
    ManageInvoiceTemplate,
    ViewProject,
    CreateProject,
    EditProject,
    DeleteProject,
    ViewUser,
    ViewOtherProfile,
    ViewReporting,
    Plugins,
    SystemConfiguration,
}

impl_domain_status_conversions!(Permission {
    ViewOwnTimesheet => "view_own_timesheet",
    ViewOtherTimesheet => "view_other_timesheet",
    CreateOwnTimesheet => "create_own_timesheet",
    CreateOtherTimesheet => "create_other_timesheet",
    EditOwnTimesheet => "edit_own_timesheet",
    EditOtherTimesheet => "edit_other_timesheet",
    DeleteOwnTimesheet => "delete_own_timesheet",
    DeleteOtherTimesheet => "delete_other_timesheet",
    EditExportedTimesheet => "edit_exported_timesheet",
    EditExportOwnTimesheet => "edit_export_own_timesheet",
    EditExportOtherTimesheet => "edit_export_other_timesheet",
    EditBillableOwnTimesheet => "edit_billable_own_timesheet",
    EditBillableOtherTimesheet => "edit_billable_other_timesheet",
    EditRateOwnTimesheet => "edit_rate_own_timesheet",
    EditRateOtherTimesheet => "edit_rate_other_timesheet",
    ViewInvoice => "view_invoice",
    CreateInvoice => "create_invoice",
    ManageInvoiceTemplate => "manage_invoice_template",
    ViewProject => "view_project",
    CreateProject => "create_project",
    EditProject => "edit_project",
    DeleteProject => "delete_project",
    ViewUser => "view_user",
    ViewOtherProfile => "view_other_profile",
    ViewReporting => "view_reporting",
    Plugins => "plugins",
    SystemConfiguration => "system_configuration",
});

/// Pick the "own" or "other" variant depending on record ownership.
pub fn own_or_other(own: bool, own_permission: Permission, other: Permission) -> Permission {
    if own {
        own_permission
    } else {
        other
    }
}

/// `true` when any of `roles` (including inherited roles) grants `permission`.
pub fn roles_grant(roles: &[Role], permission: Permission) -> bool {
    if roles.contains(&Role::SuperAdmin) {
        return true;
    }
    roles
        .iter()
        .flat_map(Role::hierarchy)
        .any(|role| role.permissions().contains(&permission))
}
