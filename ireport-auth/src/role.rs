//! Roles and staff permissions

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Coarse access class of an identity.
///
/// Closed on purpose: every authorization site matches on it exhaustively, so a
/// new role forces each site to be revisited.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    /// Guidance office; called `staff` by the backend
    #[serde(alias = "staff")]
    Guidance,
    /// Administrator or principal
    #[serde(alias = "principal")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Teacher, Role::Guidance, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Guidance => "guidance",
            Role::Admin => "admin",
        }
    }

    /// Name used on the backend wire format (`admin|teacher|student|staff`)
    pub fn backend_name(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Guidance => "staff",
            Role::Admin => "admin",
        }
    }

    /// Map the remote identity API's role vocabulary onto local roles.
    ///
    /// Unrecognized roles narrow to [`Role::Student`], the least privileged role,
    /// and are logged so the mismatch gets noticed.
    pub fn from_remote(remote: &str) -> Role {
        match remote.trim().to_lowercase().as_str() {
            "staff" | "guidance" => Role::Guidance,
            "admin" | "principal" => Role::Admin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            other => {
                warn!(remote_role = other, "Unrecognized remote role, treating as student");
                Role::Student
            }
        }
    }

    /// Which credential list an identity with this role lives in
    pub fn account_class(&self) -> AccountClass {
        match self {
            Role::Student => AccountClass::Student,
            Role::Teacher | Role::Guidance | Role::Admin => AccountClass::Staff,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_guidance(&self) -> bool {
        matches!(self, Role::Guidance)
    }

    pub fn is_teacher(&self) -> bool {
        matches!(self, Role::Teacher)
    }

    pub fn is_student(&self) -> bool {
        matches!(self, Role::Student)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "guidance" | "staff" => Ok(Role::Guidance),
            "admin" | "principal" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Staff vs student credential lists
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountClass {
    Staff,
    Student,
}

impl AccountClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountClass::Staff => "staff",
            AccountClass::Student => "student",
        }
    }
}

/// Fine-grained capability held by non-student identities
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    EditStudents,
    AssignGradesSections,
    PromoteTransferStudents,
    EditStaffProfiles,
    ManageReports,
    AccessSensitiveData,
    ManagePermissions,
    ViewAllReports,
    CreateGradesSections,
    RemoveStudents,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::EditStudents,
        Permission::AssignGradesSections,
        Permission::PromoteTransferStudents,
        Permission::EditStaffProfiles,
        Permission::ManageReports,
        Permission::AccessSensitiveData,
        Permission::ManagePermissions,
        Permission::ViewAllReports,
        Permission::CreateGradesSections,
        Permission::RemoveStudents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::EditStudents => "edit_students",
            Permission::AssignGradesSections => "assign_grades_sections",
            Permission::PromoteTransferStudents => "promote_transfer_students",
            Permission::EditStaffProfiles => "edit_staff_profiles",
            Permission::ManageReports => "manage_reports",
            Permission::AccessSensitiveData => "access_sensitive_data",
            Permission::ManagePermissions => "manage_permissions",
            Permission::ViewAllReports => "view_all_reports",
            Permission::CreateGradesSections => "create_grades_sections",
            Permission::RemoveStudents => "remove_students",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_staff_maps_to_guidance() {
        assert_eq!(Role::from_remote("staff"), Role::Guidance);
        assert_eq!(Role::from_remote("Admin"), Role::Admin);
        assert_eq!(Role::from_remote("teacher"), Role::Teacher);
    }

    #[test]
    fn unknown_remote_role_narrows_to_student() {
        assert_eq!(Role::from_remote("janitor"), Role::Student);
        assert_eq!(Role::from_remote(""), Role::Student);
    }

    #[test]
    fn serde_accepts_aliases() {
        let role: Role = serde_json::from_str("\"principal\"").unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(role, Role::Guidance);
        assert_eq!(serde_json::to_string(&Role::Guidance).unwrap(), "\"guidance\"");
    }

    #[test]
    fn backend_names_round_trip_through_from_remote() {
        for role in Role::ALL {
            assert_eq!(Role::from_remote(role.backend_name()), role);
        }
    }

    #[test]
    fn each_role_matches_exactly_one_predicate() {
        for role in Role::ALL {
            let hits = [role.is_admin(), role.is_guidance(), role.is_teacher(), role.is_student()]
                .iter()
                .filter(|hit| **hit)
                .count();
            assert_eq!(hits, 1, "{}", role);
        }
    }

    #[test]
    fn account_class_splits_students_from_staff() {
        assert_eq!(Role::Student.account_class(), AccountClass::Student);
        assert_eq!(Role::Teacher.account_class(), AccountClass::Staff);
        assert_eq!(Role::Admin.account_class(), AccountClass::Staff);
    }

    #[test]
    fn permission_parses_its_display_form() {
        for permission in Permission::ALL {
            assert_eq!(permission.to_string().parse::<Permission>(), Ok(permission));
        }
        assert!("fly_helicopter".parse::<Permission>().is_err());
        let json = serde_json::to_string(&Permission::ViewAllReports).unwrap();
        assert_eq!(json, "\"view_all_reports\"");
    }
}
