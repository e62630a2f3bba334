//! Identity records
//!
//! An [`Identity`] is the stored user record, password hash included. Anything
//! leaving the process goes through [`IdentityInfo`], which never carries the hash.

use crate::error::{AuthError, AuthResult};
use crate::password;
use crate::role::{AccountClass, Permission, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable id of the bootstrap administrator
pub const DEFAULT_ADMIN_ID: &str = "admin_default";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@school.edu";

/// Stored user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(alias = "fullName", alias = "name")]
    pub display_name: String,
    /// Primary login address
    pub email: String,
    /// Secondary login address, accepted for students
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_email: Option<String>,
    pub role: Role,
    /// Argon2 PHC string; empty for identities synthesized from a remote login
    #[serde(default)]
    pub password_hash: String,
    /// Always empty for students
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new active identity, hashing `password`
    pub fn new(display_name: &str, email: &str, password: &str, role: Role) -> AuthResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.trim().to_string(),
            email: email.trim().to_string(),
            school_email: None,
            role,
            password_hash: password::hash_password(password)?,
            permissions: BTreeSet::new(),
            is_active: true,
            phone: None,
            profile_image: None,
            staff_id: None,
            student_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The bootstrap administrator, holding every permission explicitly as well
    pub fn default_admin(password: &str) -> AuthResult<Self> {
        let mut admin = Self::new("System Administrator", DEFAULT_ADMIN_EMAIL, password, Role::Admin)?;
        admin.id = DEFAULT_ADMIN_ID.to_string();
        admin.school_email = Some(DEFAULT_ADMIN_EMAIL.to_string());
        admin.staff_id = Some("ADMIN001".to_string());
        admin.permissions = Permission::ALL.into_iter().collect();
        Ok(admin)
    }

    pub fn with_school_email(mut self, school_email: &str) -> Self {
        self.school_email = Some(school_email.trim().to_string());
        self
    }

    /// Replace the permission set. Students cannot hold permissions.
    pub fn set_permissions(
        &mut self,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> AuthResult<()> {
        match self.role {
            Role::Student => Err(AuthError::Validation(
                "students cannot hold staff permissions".to_string(),
            )),
            Role::Teacher | Role::Guidance | Role::Admin => {
                self.permissions = permissions.into_iter().collect();
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        password::verify_password(password, &self.password_hash)
    }

    pub fn account_class(&self) -> AccountClass {
        self.role.account_class()
    }

    /// Whether `email` is one of this identity's login addresses for `class`.
    ///
    /// Staff log in with their primary email; students with either address.
    /// Comparison is case-insensitive.
    pub fn matches_login(&self, email: &str, class: AccountClass) -> bool {
        if self.account_class() != class {
            return false;
        }
        let wanted = email.trim().to_lowercase();
        match class {
            AccountClass::Staff => self.email.to_lowercase() == wanted,
            AccountClass::Student => {
                self.email.to_lowercase() == wanted
                    || self
                        .school_email
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase() == wanted)
            }
        }
    }

    /// True when any login address of `self` collides with one of `other`'s
    pub fn shares_email_with(&self, other: &Identity) -> bool {
        let mine = self.login_addresses();
        other.login_addresses().iter().any(|addr| mine.contains(addr))
    }

    fn login_addresses(&self) -> Vec<String> {
        std::iter::once(&self.email)
            .chain(self.school_email.as_ref())
            .map(|e| e.to_lowercase())
            .collect()
    }

    /// Merge a profile update; absent fields are left untouched
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(image) = update.profile_image {
            self.profile_image = Some(image);
        }
        self.updated_at = Utc::now();
    }

    pub fn to_info(&self) -> IdentityInfo {
        IdentityInfo {
            id: self.id.clone(),
            name: self.display_name.clone(),
            email: self.email.clone(),
            school_email: self.school_email.clone(),
            role: self.role,
            permissions: self.permissions.iter().copied().collect(),
            is_active: self.is_active,
            phone: self.phone.clone(),
            profile_image: self.profile_image.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public projection of an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_email: Option<String>,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Partial update of the editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, alias = "fullName", alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.phone.is_none() && self.profile_image.is_none()
    }
}
