//! Role to permission mapping.
//!
//! The permission set is a pure function of the role name, recomputed on
//! every check so a role change is effective from the next request onward.

use serde::Serialize;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUkm,
    ManageUsers,
    ManageCategories,
    ViewUkm,
    ViewAdminPanel,
    RegisterToUkm,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageUkm => "manage_ukm",
            Self::ManageUsers => "manage_users",
            Self::ManageCategories => "manage_categories",
            Self::ViewUkm => "view_ukm",
            Self::ViewAdminPanel => "view_admin_panel",
            Self::RegisterToUkm => "register_to_ukm",
        }
    }
}

/// Closed mapping from role name to permission set. Unknown roles get
/// nothing.
#[must_use]
pub fn permissions_for_role(role_name: &str) -> &'static [Permission] {
    match role_name {
        ROLE_ADMIN => &[
            Permission::ManageUkm,
            Permission::ManageUsers,
            Permission::ManageCategories,
            Permission::ViewUkm,
            Permission::ViewAdminPanel,
        ],
        ROLE_USER => &[Permission::ViewUkm, Permission::RegisterToUkm],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_full_set() {
        let perms = permissions_for_role(ROLE_ADMIN);
        assert!(perms.contains(&Permission::ManageUkm));
        assert!(perms.contains(&Permission::ManageUsers));
        assert!(perms.contains(&Permission::ManageCategories));
        assert!(perms.contains(&Permission::ViewAdminPanel));
        assert!(!perms.contains(&Permission::RegisterToUkm));
    }

    #[test]
    fn regular_user_is_read_only() {
        let perms = permissions_for_role(ROLE_USER);
        assert_eq!(perms, &[Permission::ViewUkm, Permission::RegisterToUkm]);
        assert!(!perms.contains(&Permission::ManageUsers));
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        assert!(permissions_for_role("moderator").is_empty());
    }
}
