//! Credential Store
//! Mission: Securely store and manage accounts with SQLite

use crate::auth::models::Account;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Failure modes for account creation.
///
/// The UNIQUE constraints in the schema are the true guard against
/// concurrent duplicate signups; the handler-level existence checks are a
/// fast path only, so constraint violations must map back to the same
/// taken-field outcomes.
#[derive(Debug)]
pub enum InsertError {
    UsernameTaken,
    EmailTaken,
    Other(anyhow::Error),
}

impl std::fmt::Display for InsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertError::UsernameTaken => write!(f, "username is already taken"),
            InsertError::EmailTaken => write!(f, "email is already taken"),
            InsertError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for InsertError {}

impl From<anyhow::Error> for InsertError {
    fn from(err: anyhow::Error) -> Self {
        InsertError::Other(err)
    }
}

/// Account storage with SQLite backend
pub struct AccountStore {
    db_path: String,
}

impl AccountStore {
    /// Create a new account store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS account_roles (
                account_id TEXT NOT NULL,
                role TEXT NOT NULL,
                UNIQUE (account_id, role),
                FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
            )",
            [],
        )?;

        Ok(())
    }

    /// Create a new account with a digested password and one initial role.
    ///
    /// The account row and its role row are inserted in one transaction, so
    /// every stored account has at least one role.
    pub fn create_account(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Account, InsertError> {
        let password_hash =
            hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let account = Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            roles: HashSet::from([role.to_string()]),
            created_at: Utc::now().to_rfc3339(),
        };

        let mut conn = self.open()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;

        tx.execute(
            "INSERT INTO accounts (id, name, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.id.to_string(),
                account.name,
                account.username,
                account.email,
                account.password_hash,
                account.created_at,
            ],
        )
        .map_err(map_unique_violation)?;

        tx.execute(
            "INSERT INTO account_roles (account_id, role) VALUES (?1, ?2)",
            params![account.id.to_string(), role],
        )
        .map_err(|e| InsertError::Other(e.into()))?;

        tx.commit().context("Failed to commit account insert")?;

        info!(username = %account.username, role, "Created account");

        Ok(account)
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Look up an account by username.
    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.open()?;
        self.query_account(
            &conn,
            "SELECT id, name, username, email, password_hash, created_at
             FROM accounts WHERE username = ?1",
            username,
        )
    }

    /// Look up an account by username or email, for login.
    pub fn find_by_username_or_email(&self, handle: &str) -> Result<Option<Account>> {
        let conn = self.open()?;
        self.query_account(
            &conn,
            "SELECT id, name, username, email, password_hash, created_at
             FROM accounts WHERE username = ?1 OR email = ?1",
            handle,
        )
    }

    fn query_account(
        &self,
        conn: &Connection,
        sql: &str,
        param: &str,
    ) -> Result<Option<Account>> {
        let mut stmt = conn.prepare(sql)?;
        let row = stmt.query_row(params![param], |row| {
            let id: String = row.get(0)?;
            Ok((
                id,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        });

        let (id, name, username, email, password_hash, created_at) = match row {
            Ok(values) => values,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let id = Uuid::parse_str(&id).context("Corrupt account id in store")?;
        let roles = self.load_roles(conn, &id)?;

        Ok(Some(Account {
            id,
            name,
            username,
            email,
            password_hash,
            roles,
            created_at,
        }))
    }

    fn load_roles(&self, conn: &Connection, account_id: &Uuid) -> Result<HashSet<String>> {
        let mut stmt =
            conn.prepare("SELECT role FROM account_roles WHERE account_id = ?1")?;
        let roles = stmt
            .query_map(params![account_id.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(roles)
    }

    /// Verify a password against the stored digest.
    ///
    /// Returns the account on success and `None` for both a missing account
    /// and a wrong password, so callers cannot distinguish the two.
    pub fn authenticate(&self, handle: &str, password: &str) -> Result<Option<Account>> {
        let Some(account) = self.find_by_username_or_email(handle)? else {
            return Ok(None);
        };

        let valid =
            verify(password, &account.password_hash).context("Failed to verify password")?;

        Ok(valid.then_some(account))
    }

    /// Delete an account by username. Outstanding tokens for the subject
    /// become unusable through resolver lookup failure.
    pub fn delete_by_username(&self, username: &str) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute(
            "DELETE FROM accounts WHERE username = ?1",
            params![username],
        )?;
        Ok(rows > 0)
    }
}

/// Translate a UNIQUE-constraint failure into the matching taken-field error.
fn map_unique_violation(err: rusqlite::Error) -> InsertError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == ErrorCode::ConstraintViolation {
            if msg.contains("accounts.username") {
                return InsertError::UsernameTaken;
            }
            if msg.contains("accounts.email") {
                return InsertError::EmailTaken;
            }
        }
    }
    InsertError::Other(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (AccountStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = AccountStore::new(db_path).unwrap();
        (store, temp_file)
    }

    fn signup(store: &AccountStore, username: &str, email: &str) -> Account {
        store
            .create_account("Test User", username, email, "password123", "ROLE_ADMIN")
            .unwrap()
    }

    #[test]
    fn test_create_and_find_account() {
        let (store, _temp) = create_test_store();

        let created = signup(&store, "alice", "alice@example.com");
        assert!(created.roles.contains("ROLE_ADMIN"));

        let found = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "alice@example.com");
        assert_eq!(found.roles, created.roles);
    }

    #[test]
    fn test_find_by_email_handle() {
        let (store, _temp) = create_test_store();
        signup(&store, "alice", "alice@example.com");

        let by_email = store
            .find_by_username_or_email("alice@example.com")
            .unwrap();
        assert!(by_email.is_some());
        assert_eq!(by_email.unwrap().username, "alice");
    }

    #[test]
    fn test_every_account_has_a_role() {
        let (store, _temp) = create_test_store();
        let account = signup(&store, "alice", "alice@example.com");
        assert!(!account.roles.is_empty());

        let reloaded = store.find_by_username("alice").unwrap().unwrap();
        assert!(!reloaded.roles.is_empty());
    }

    #[test]
    fn test_duplicate_username_maps_to_taken() {
        let (store, _temp) = create_test_store();
        signup(&store, "alice", "alice@example.com");

        let err = store
            .create_account("Other", "alice", "other@example.com", "pw123456", "ROLE_ADMIN")
            .unwrap_err();
        assert!(matches!(err, InsertError::UsernameTaken));
    }

    #[test]
    fn test_duplicate_email_maps_to_taken() {
        let (store, _temp) = create_test_store();
        signup(&store, "alice", "alice@example.com");

        let err = store
            .create_account("Other", "bob", "alice@example.com", "pw123456", "ROLE_ADMIN")
            .unwrap_err();
        assert!(matches!(err, InsertError::EmailTaken));
    }

    #[test]
    fn test_failed_signup_does_not_mutate_store() {
        let (store, _temp) = create_test_store();
        signup(&store, "alice", "alice@example.com");

        let _ = store.create_account(
            "Other",
            "alice",
            "other@example.com",
            "pw123456",
            "ROLE_ADMIN",
        );

        assert!(!store.email_exists("other@example.com").unwrap());
    }

    #[test]
    fn test_concurrent_duplicate_signup_single_winner() {
        let (store, _temp) = create_test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.create_account(
                        "Race",
                        "racer",
                        &format!("racer{i}@example.com"),
                        "password123",
                        "ROLE_ADMIN",
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        let taken = results
            .iter()
            .filter(|r| matches!(r, Err(InsertError::UsernameTaken)))
            .count();

        assert_eq!(winners, 1);
        assert_eq!(taken, 1);
    }

    #[test]
    fn test_authenticate_password() {
        let (store, _temp) = create_test_store();
        signup(&store, "alice", "alice@example.com");

        assert!(store.authenticate("alice", "password123").unwrap().is_some());
        assert!(store.authenticate("alice", "wrongpassword").unwrap().is_none());
        assert!(store.authenticate("nobody", "password123").unwrap().is_none());
    }

    #[test]
    fn test_delete_account() {
        let (store, _temp) = create_test_store();
        signup(&store, "alice", "alice@example.com");

        assert!(store.delete_by_username("alice").unwrap());
        assert!(store.find_by_username("alice").unwrap().is_none());
        assert!(!store.delete_by_username("alice").unwrap());
    }
}
