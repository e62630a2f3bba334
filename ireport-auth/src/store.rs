//! Credential stores
//!
//! A [`CredentialStore`] holds identities (hashed passwords, roles, permission
//! sets) split into a staff list and a student list. Every store guarantees the
//! bootstrap administrator exists once seeded, and never duplicates it.

use crate::error::{AuthError, AuthResult};
use crate::identity::{Identity, DEFAULT_ADMIN_ID};
use crate::role::AccountClass;
use crate::storage::{keys, KeyValueStorage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an identity by login address within one account class.
    ///
    /// Emails are compared case-insensitively; students also match on their
    /// school email.
    async fn find_by_email_and_role(
        &self,
        email: &str,
        class: AccountClass,
    ) -> AuthResult<Option<Identity>>;

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Identity>>;

    /// Insert a new identity. Fails with [`AuthError::EmailTaken`] on any address collision.
    async fn insert(&self, identity: Identity) -> AuthResult<Identity>;

    /// Replace the record with the same id. Fails with [`AuthError::NotFound`] if absent.
    async fn update(&self, identity: Identity) -> AuthResult<Identity>;

    async fn list(&self, class: AccountClass) -> AuthResult<Vec<Identity>>;

    /// Seed the default administrator unless a record with its id already exists.
    ///
    /// Returns whether a record was inserted. Fails with [`AuthError::EmailTaken`]
    /// when another identity already holds the administrator's address.
    async fn ensure_default_admin(&self) -> AuthResult<bool>;

    /// Staff list, seeding the default administrator first
    async fn staff(&self) -> AuthResult<Vec<Identity>> {
        self.ensure_default_admin().await?;
        self.list(AccountClass::Staff).await
    }
}

/// Credential store over key/value blobs: one JSON array per account class.
///
/// Writes are serialized, so each read-modify-write of a list is atomic with
/// respect to other writers in this process.
pub struct BlobCredentialStore<S> {
    storage: Arc<S>,
    bootstrap_admin_password: String,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> BlobCredentialStore<S> {
    pub fn new(storage: Arc<S>, bootstrap_admin_password: impl Into<String>) -> Self {
        Self {
            storage,
            bootstrap_admin_password: bootstrap_admin_password.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn key(class: AccountClass) -> &'static str {
        match class {
            AccountClass::Staff => keys::STAFF,
            AccountClass::Student => keys::STUDENTS,
        }
    }

    async fn load(&self, class: AccountClass) -> AuthResult<Vec<Identity>> {
        match self.storage.get(Self::key(class)).await? {
            Some(blob) => serde_json::from_str(&blob)
                .map_err(|e| AuthError::Storage(ireport_core::IReportError::Serialization(e))),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, class: AccountClass, list: &[Identity]) -> AuthResult<()> {
        let blob = serde_json::to_string(list)
            .map_err(|e| AuthError::Storage(ireport_core::IReportError::Serialization(e)))?;
        self.storage.set(Self::key(class), blob).await?;
        Ok(())
    }

    async fn load_all(&self) -> AuthResult<(Vec<Identity>, Vec<Identity>)> {
        Ok((
            self.load(AccountClass::Staff).await?,
            self.load(AccountClass::Student).await?,
        ))
    }
}

#[async_trait]
impl<S: KeyValueStorage + 'static> CredentialStore for BlobCredentialStore<S> {
    async fn find_by_email_and_role(
        &self,
        email: &str,
        class: AccountClass,
    ) -> AuthResult<Option<Identity>> {
        Ok(self
            .load(class)
            .await?
            .into_iter()
            .find(|identity| identity.matches_login(email, class)))
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Identity>> {
        let (staff, students) = self.load_all().await?;
        Ok(staff
            .into_iter()
            .chain(students)
            .find(|identity| identity.id == id))
    }

    async fn insert(&self, identity: Identity) -> AuthResult<Identity> {
        let _guard = self.write_lock.lock().await;

        let (staff, students) = self.load_all().await?;
        if staff
            .iter()
            .chain(students.iter())
            .any(|existing| existing.id == identity.id || existing.shares_email_with(&identity))
        {
            debug!("Insert rejected: address or id already in use");
            return Err(AuthError::EmailTaken);
        }

        let class = identity.account_class();
        let mut list = match class {
            AccountClass::Staff => staff,
            AccountClass::Student => students,
        };
        list.push(identity.clone());
        self.save(class, &list).await?;

        info!(id = %identity.id, role = %identity.role, "Stored new identity");
        Ok(identity)
    }

    async fn update(&self, identity: Identity) -> AuthResult<Identity> {
        let _guard = self.write_lock.lock().await;

        let (mut staff, mut students) = self.load_all().await?;
        if staff
            .iter()
            .chain(students.iter())
            .any(|existing| existing.id != identity.id && existing.shares_email_with(&identity))
        {
            return Err(AuthError::EmailTaken);
        }

        let target_class = identity.account_class();
        for (class, list) in [
            (AccountClass::Staff, &mut staff),
            (AccountClass::Student, &mut students),
        ] {
            let Some(index) = list.iter().position(|existing| existing.id == identity.id) else {
                continue;
            };

            if class == target_class {
                list[index] = identity.clone();
                self.save(class, list).await?;
            } else {
                // Role change moved the identity to the other list
                list.remove(index);
                self.save(class, list).await?;
                let mut other = self.load(target_class).await?;
                other.push(identity.clone());
                self.save(target_class, &other).await?;
            }

            debug!(id = %identity.id, "Updated identity");
            return Ok(identity);
        }

        Err(AuthError::NotFound(format!("identity {}", identity.id)))
    }

    async fn list(&self, class: AccountClass) -> AuthResult<Vec<Identity>> {
        self.load(class).await
    }

    async fn ensure_default_admin(&self) -> AuthResult<bool> {
        let _guard = self.write_lock.lock().await;

        let (mut staff, students) = self.load_all().await?;
        if staff.iter().any(|s| s.id == DEFAULT_ADMIN_ID) {
            return Ok(false);
        }

        let admin = Identity::default_admin(&self.bootstrap_admin_password)?;
        if staff
            .iter()
            .chain(students.iter())
            .any(|existing| existing.shares_email_with(&admin))
        {
            error!(
                "Cannot seed default administrator: '{}' belongs to another identity",
                admin.email
            );
            return Err(AuthError::EmailTaken);
        }

        staff.push(admin);
        self.save(AccountClass::Staff, &staff).await?;
        info!("Seeded default administrator '{}'", DEFAULT_ADMIN_ID);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::storage::MemoryStorage;

    fn store() -> BlobCredentialStore<MemoryStorage> {
        BlobCredentialStore::new(Arc::new(MemoryStorage::new()), "admin123")
    }

    #[tokio::test]
    async fn seeding_refuses_an_address_held_by_another_identity() {
        let store = store();
        let squatter = Identity::new("Squatter", "ADMIN@school.edu", "pw", Role::Teacher).unwrap();
        store.insert(squatter).await.unwrap();

        assert!(matches!(store.ensure_default_admin().await, Err(AuthError::EmailTaken)));
        assert!(store.find_by_id(DEFAULT_ADMIN_ID).await.unwrap().is_none());
        assert_eq!(store.list(AccountClass::Staff).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn staff_seeds_admin_exactly_once() {
        let store = store();

        let first = store.staff().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, DEFAULT_ADMIN_ID);

        let second = store.staff().await.unwrap();
        assert_eq!(
            second.iter().filter(|s| s.id == DEFAULT_ADMIN_ID).count(),
            1
        );
        assert!(!store.ensure_default_admin().await.unwrap());
    }

    #[tokio::test]
    async fn seed_keeps_existing_staff() {
        let store = store();
        let teacher = Identity::new("T", "t@school.edu", "pw", Role::Teacher).unwrap();
        store.insert(teacher.clone()).await.unwrap();

        let staff = store.staff().await.unwrap();
        assert_eq!(staff.len(), 2);
        assert!(staff.iter().any(|s| s.id == teacher.id));
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive_and_class_scoped() {
        let store = store();
        let student = Identity::new("S", "s@home.com", "pw", Role::Student)
            .unwrap()
            .with_school_email("s@school.edu");
        store.insert(student.clone()).await.unwrap();

        let found = store
            .find_by_email_and_role("S@SCHOOL.EDU", AccountClass::Student)
            .await
            .unwrap();
        assert_eq!(found.map(|f| f.id), Some(student.id.clone()));

        let as_staff = store
            .find_by_email_and_role("s@home.com", AccountClass::Staff)
            .await
            .unwrap();
        assert!(as_staff.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_across_lists() {
        let store = store();
        store
            .insert(Identity::new("A", "dup@school.edu", "pw", Role::Teacher).unwrap())
            .await
            .unwrap();

        let result = store
            .insert(Identity::new("B", "DUP@school.edu", "pw", Role::Student).unwrap())
            .await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn update_replaces_at_matching_id() {
        let store = store();
        let mut student = Identity::new("Old", "s@home.com", "pw", Role::Student).unwrap();
        let other = Identity::new("Other", "o@home.com", "pw", Role::Student).unwrap();
        store.insert(student.clone()).await.unwrap();
        store.insert(other.clone()).await.unwrap();

        student.display_name = "New".to_string();
        store.update(student.clone()).await.unwrap();

        let students = store.list(AccountClass::Student).await.unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].display_name, "New");
        assert_eq!(students[1].id, other.id);
    }

    #[tokio::test]
    async fn update_moves_identity_when_class_changes() {
        let store = store();
        let mut identity = Identity::new("P", "p@school.edu", "pw", Role::Student).unwrap();
        store.insert(identity.clone()).await.unwrap();

        identity.role = Role::Teacher;
        store.update(identity.clone()).await.unwrap();

        assert!(store.list(AccountClass::Student).await.unwrap().is_empty());
        let staff = store.list(AccountClass::Staff).await.unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].role, Role::Teacher);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = store();
        let ghost = Identity::new("G", "g@school.edu", "pw", Role::Teacher).unwrap();
        assert!(matches!(
            store.update(ghost).await,
            Err(AuthError::NotFound(_))
        ));
    }
}
