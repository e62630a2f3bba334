//! SQLite-backed credential store
//!
//! Identities are stored as JSON documents with their lookup keys (lowercased
//! addresses, account class) lifted into indexed columns.

use crate::error::{AuthError, AuthResult};
use crate::identity::{Identity, DEFAULT_ADMIN_ID};
use crate::role::AccountClass;
use crate::store::CredentialStore;
use async_trait::async_trait;
use ireport_core::storage_error;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
    bootstrap_admin_password: String,
}

fn db_error(operation: &str, e: sqlx::Error) -> AuthError {
    error!("Identity store {} failed: {}", operation, e);
    AuthError::Storage(storage_error!(
        format!("identity store {} failed", operation),
        "sqlite_store",
        e
    ))
}

fn decode(document: &str) -> AuthResult<Identity> {
    serde_json::from_str(document)
        .map_err(|e| AuthError::Storage(ireport_core::IReportError::Serialization(e)))
}

fn encode(identity: &Identity) -> AuthResult<String> {
    serde_json::to_string(identity)
        .map_err(|e| AuthError::Storage(ireport_core::IReportError::Serialization(e)))
}

impl SqliteCredentialStore {
    /// Connect to `database_url`, creating the database and schema if needed
    pub async fn connect(
        database_url: &str,
        bootstrap_admin_password: impl Into<String>,
    ) -> AuthResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| db_error("connect", e))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| db_error("connect", e))?;

        Self::new(pool, bootstrap_admin_password).await
    }

    pub async fn new(
        pool: SqlitePool,
        bootstrap_admin_password: impl Into<String>,
    ) -> AuthResult<Self> {
        let store = Self {
            pool,
            bootstrap_admin_password: bootstrap_admin_password.into(),
        };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> AuthResult<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                school_email TEXT,
                account_class TEXT NOT NULL,
                document TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_identities_school_email ON identities(school_email);
            CREATE INDEX IF NOT EXISTS idx_identities_class ON identities(account_class);
        "#;

        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("create_tables", e))?;

        debug!("Identities table ready");
        Ok(())
    }

    async fn address_in_use(&self, identity: &Identity, exclude_id: Option<&str>) -> AuthResult<bool> {
        let mut addresses = vec![identity.email.to_lowercase()];
        if let Some(school) = &identity.school_email {
            addresses.push(school.to_lowercase());
        }

        for address in addresses {
            let row = sqlx::query(
                "SELECT COUNT(*) AS count FROM identities \
                 WHERE (email = ?1 OR school_email = ?1) AND id != ?2",
            )
            .bind(&address)
            .bind(exclude_id.unwrap_or(""))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("address_check", e))?;

            if row.get::<i64, _>("count") > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_email_and_role(
        &self,
        email: &str,
        class: AccountClass,
    ) -> AuthResult<Option<Identity>> {
        let wanted = email.trim().to_lowercase();
        let query = match class {
            AccountClass::Staff => {
                "SELECT document FROM identities WHERE account_class = ?1 AND email = ?2"
            }
            AccountClass::Student => {
                "SELECT document FROM identities \
                 WHERE account_class = ?1 AND (email = ?2 OR school_email = ?2)"
            }
        };

        let row = sqlx::query(query)
            .bind(class.as_str())
            .bind(&wanted)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_by_email", e))?;

        row.map(|r| decode(&r.get::<String, _>("document")))
            .transpose()
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Identity>> {
        let row = sqlx::query("SELECT document FROM identities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find_by_id", e))?;

        row.map(|r| decode(&r.get::<String, _>("document")))
            .transpose()
    }

    async fn insert(&self, identity: Identity) -> AuthResult<Identity> {
        if self.address_in_use(&identity, None).await? {
            return Err(AuthError::EmailTaken);
        }

        let result = sqlx::query(
            "INSERT INTO identities (id, email, school_email, account_class, document) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&identity.id)
        .bind(identity.email.to_lowercase())
        .bind(identity.school_email.as_ref().map(|s| s.to_lowercase()))
        .bind(identity.account_class().as_str())
        .bind(encode(&identity)?)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(id = %identity.id, role = %identity.role, "Stored new identity");
                Ok(identity)
            }
            // Lost a race against a concurrent insert of the same address or id
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AuthError::EmailTaken),
            Err(e) => Err(db_error("insert", e)),
        }
    }

    async fn update(&self, identity: Identity) -> AuthResult<Identity> {
        if self.address_in_use(&identity, Some(&identity.id)).await? {
            return Err(AuthError::EmailTaken);
        }

        let result = sqlx::query(
            "UPDATE identities SET email = ?, school_email = ?, account_class = ?, document = ? \
             WHERE id = ?",
        )
        .bind(identity.email.to_lowercase())
        .bind(identity.school_email.as_ref().map(|s| s.to_lowercase()))
        .bind(identity.account_class().as_str())
        .bind(encode(&identity)?)
        .bind(&identity.id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound(format!("identity {}", identity.id)));
        }

        debug!(id = %identity.id, "Updated identity");
        Ok(identity)
    }

    async fn list(&self, class: AccountClass) -> AuthResult<Vec<Identity>> {
        let rows = sqlx::query("SELECT document FROM identities WHERE account_class = ? ORDER BY rowid")
            .bind(class.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list", e))?;

        rows.iter()
            .map(|r| decode(&r.get::<String, _>("document")))
            .collect()
    }

    async fn ensure_default_admin(&self) -> AuthResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM identities WHERE id = ?")
            .bind(DEFAULT_ADMIN_ID)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("seed_check", e))?;

        if row.get::<i64, _>("count") > 0 {
            debug!("Default administrator already present");
            return Ok(false);
        }

        let admin = Identity::default_admin(&self.bootstrap_admin_password)?;
        let result = sqlx::query(
            "INSERT INTO identities (id, email, school_email, account_class, document) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&admin.id)
        .bind(admin.email.to_lowercase())
        .bind(admin.school_email.as_ref().map(|s| s.to_lowercase()))
        .bind(admin.account_class().as_str())
        .bind(encode(&admin)?)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!("Seeded default administrator '{}'", DEFAULT_ADMIN_ID);
                Ok(true)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                // Another writer seeded it first
                if self.find_by_id(DEFAULT_ADMIN_ID).await?.is_some() {
                    return Ok(false);
                }
                error!(
                    "Cannot seed default administrator: '{}' belongs to another identity",
                    admin.email
                );
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(db_error("seed_insert", e)),
        }
    }
}
