//! Database access layer with connection pooling and migrations
//!
//! The store holds one JSON document per collection in a single
//! `collections` table. This mirrors a browser key/value store while keeping
//! encryption at rest via SQLCipher.
//!
//! - `collections` - `Storage` implementation (expenses, categories, rules, user)

use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OptionalExtension;
use tempfile::TempDir;

use crate::error::{Error, Result};

mod collections;

pub use collections::{CATEGORIES_KEY, EXPENSES_KEY, RULES_KEY, USER_KEY};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "SPENDWISE_DB_KEY";

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"spendwise-salt-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    encrypted: bool,
    /// Owns the directory of a throwaway database; removed with the last clone
    scratch: Option<Arc<TempDir>>,
}

impl Database {
    /// Open an encrypted database
    ///
    /// Requires `SPENDWISE_DB_KEY` to be set. Use `new_unencrypted()` for
    /// development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases.",
                DB_KEY_ENV
            ))),
        }
    }

    /// Open an unencrypted database
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Open a database with an explicit encryption passphrase
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Key must be set on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(4).build(manager)?
        } else {
            Pool::builder().max_size(4).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
            encrypted: passphrase.is_some(),
            scratch: None,
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a file in a private temporary directory rather than `:memory:`
    /// because every pooled connection to `:memory:` would see its own empty
    /// database. The directory is deleted when the last clone is dropped.
    pub fn in_memory() -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("spendwise_test_").tempdir()?;
        let path = scratch.path().join("spendwise.db");

        let mut db = Self::new_unencrypted(&path.to_string_lossy())?;
        db.scratch = Some(Arc::new(scratch));
        Ok(db)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Whether the database was opened with a SQLCipher key
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Number of collections that have been written at least once
    pub fn collection_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM collections", [], |row| row.get(0))?)
    }

    /// Read the raw JSON stored under `key`
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrite the raw JSON stored under `key`
    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO collections (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            [key, value],
        )?;
        Ok(())
    }

    /// Delete the value stored under `key`
    pub fn remove_raw(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM collections WHERE key = ?1", [key])?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_db_starts_empty() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.collection_count().unwrap(), 0);
        assert!(db.get_raw(EXPENSES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_put_raw_overwrites() {
        let db = Database::in_memory().unwrap();
        db.put_raw("k", "[1]").unwrap();
        db.put_raw("k", "[2]").unwrap();
        assert_eq!(db.get_raw("k").unwrap().as_deref(), Some("[2]"));
        assert_eq!(db.collection_count().unwrap(), 1);
    }

    #[test]
    fn test_in_memory_db_is_removed_with_last_clone() {
        let db = Database::in_memory().unwrap();
        assert!(!db.is_encrypted());

        let path = std::path::PathBuf::from(db.path());
        let clone = db.clone();
        drop(db);
        clone.put_raw("k", "[]").unwrap();
        assert!(path.exists());

        drop(clone);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spendwise.db");
        let path = path.to_str().unwrap();

        {
            let db = Database::new_unencrypted(path).unwrap();
            assert_eq!(db.path(), path);
            db.put_raw(RULES_KEY, "[]").unwrap();
        }

        let db = Database::new_unencrypted(path).unwrap();
        assert_eq!(db.get_raw(RULES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let a = derive_key("correct horse").unwrap();
        let b = derive_key("correct horse").unwrap();
        let c = derive_key("battery staple").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
