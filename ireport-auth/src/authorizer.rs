//! Role and permission checks
//!
//! Every check matches exhaustively on [`Role`]. Administrators hold every
//! permission through an explicit rule here, not through their stored set.

use crate::error::{AuthError, AuthResult};
use crate::identity::Identity;
use crate::role::{Permission, Role};
use tracing::debug;

/// Whether `identity` may exercise `permission`
pub fn has_permission(identity: &Identity, permission: Permission) -> bool {
    match identity.role {
        Role::Student => false,
        Role::Admin => true,
        Role::Teacher | Role::Guidance => identity.permissions.contains(&permission),
    }
}

/// Admin and guidance see the full dashboard
pub fn can_access_full_dashboard(role: Role) -> bool {
    role.is_admin() || role.is_guidance()
}

/// Fail with [`AuthError::NotAuthorized`] unless `role` is in `allowed`
pub fn require_role(role: Role, allowed: &[Role]) -> AuthResult<()> {
    if allowed.contains(&role) {
        return Ok(());
    }
    debug!(role = %role, "Role not in allow-list");
    Err(AuthError::NotAuthorized(format!(
        "role '{}' may not perform this action",
        role
    )))
}

pub fn require_permission(identity: &Identity, permission: Permission) -> AuthResult<()> {
    if has_permission(identity, permission) {
        return Ok(());
    }
    debug!(id = %identity.id, permission = %permission, "Permission denied");
    Err(AuthError::NotAuthorized(format!(
        "missing permission '{}'",
        permission
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity::new("X", "x@school.edu", "pw", role).unwrap()
    }

    #[test]
    fn admin_holds_every_permission_without_grants() {
        let admin = identity(Role::Admin);
        assert!(admin.permissions.is_empty());
        for permission in Permission::ALL {
            assert!(has_permission(&admin, permission));
        }
    }

    #[test]
    fn student_holds_nothing_even_if_set_is_forced() {
        let mut student = identity(Role::Student);
        student.permissions = Permission::ALL.into_iter().collect();
        for permission in Permission::ALL {
            assert!(!has_permission(&student, permission));
        }
    }

    #[test]
    fn staff_permissions_come_from_their_set() {
        let mut teacher = identity(Role::Teacher);
        teacher.set_permissions([Permission::ManageReports]).unwrap();
        assert!(has_permission(&teacher, Permission::ManageReports));
        assert!(!has_permission(&teacher, Permission::ManagePermissions));

        let guidance = identity(Role::Guidance);
        assert!(!has_permission(&guidance, Permission::ViewAllReports));
    }

    #[test]
    fn full_dashboard_is_admin_or_guidance() {
        assert!(can_access_full_dashboard(Role::Admin));
        assert!(can_access_full_dashboard(Role::Guidance));
        assert!(!can_access_full_dashboard(Role::Teacher));
        assert!(!can_access_full_dashboard(Role::Student));
    }

    #[test]
    fn require_helpers_report_not_authorized() {
        assert!(require_role(Role::Admin, &[Role::Admin, Role::Guidance]).is_ok());
        assert!(matches!(
            require_role(Role::Teacher, &[Role::Admin]),
            Err(AuthError::NotAuthorized(_))
        ));
        assert!(matches!(
            require_permission(&identity(Role::Guidance), Permission::RemoveStudents),
            Err(AuthError::NotAuthorized(_))
        ));
    }
}
