//! User storage trait and implementations.
//!
//! The module follows the repository pattern with trait-based abstraction:
//! - `UserStorage` trait: interface for reading and writing `User` rows
//! - `SqlUserStorage`: SQL implementation on top of a [`Database`] handle,
//!   with statements derived from [`USER_SCHEMA`]
//! - `MockUserStorage`: in-memory implementation for testing
//!
//! Updates and deletes are intentionally absent: accounts are created and read.

use crate::database::Database;
use crate::password::is_bcrypt_hash;
use crate::users::model::{User, decode_groups, encode_groups};
use crate::users::schema::USER_SCHEMA;
use sqlx::Row as _;
use sqlx::any::AnyRow;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Error type for user storage operations.
#[derive(Debug, thiserror::Error)]
pub enum UserStorageError {
    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A database or storage error occurred.
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<sqlx::Error> for UserStorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// Checks the invariants a record must hold before it is written.
fn validate_new_user(user: &User) -> Result<(), UserStorageError> {
    if user.name.trim().is_empty() {
        return Err(UserStorageError::InvalidInput(
            "Name cannot be empty".to_owned(),
        ));
    }
    if !is_bcrypt_hash(&user.password) {
        return Err(UserStorageError::InvalidInput(
            "Password must be a bcrypt hash".to_owned(),
        ));
    }
    Ok(())
}

/// Trait for user storage operations.
pub trait UserStorage: Clone + Send + Sync + 'static {
    /// Inserts `user` and returns the stored record.
    ///
    /// The caller's `id` is ignored; the returned record carries the id the
    /// store generated. Fails with `InvalidInput` when `name` is blank or
    /// `password` is not a bcrypt hash.
    fn create_user(
        &self,
        user: &User,
    ) -> impl Future<Output = Result<User, UserStorageError>> + Send;

    /// Retrieves a user by id.
    fn get_user(&self, id: i64)
    -> impl Future<Output = Result<Option<User>, UserStorageError>> + Send;

    /// Retrieves the first user with the given username.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, UserStorageError>> + Send;

    /// Lists all users ordered by id.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, UserStorageError>> + Send;
}

/// In-memory implementation of `UserStorage` for testing.
#[derive(Clone, Default)]
pub struct MockUserStorage {
    users: Arc<RwLock<BTreeMap<i64, User>>>,
}

impl MockUserStorage {
    /// Creates a new empty `MockUserStorage`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of users in the storage.
    pub fn len(&self) -> usize {
        self.users.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserStorage for MockUserStorage {
    async fn create_user(&self, user: &User) -> Result<User, UserStorageError> {
        validate_new_user(user)?;

        let mut users = self.users.write().expect("lock poisoned");
        let id = users.keys().next_back().map_or(1, |last| last + 1);
        let stored = User { id, ..user.clone() };
        users.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, UserStorageError> {
        let users = self.users.read().expect("lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStorageError> {
        let users = self.users.read().expect("lock poisoned");
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, UserStorageError> {
        let users = self.users.read().expect("lock poisoned");
        Ok(users.values().cloned().collect())
    }
}

/// SQL implementation of `UserStorage`.
///
/// Works against any backend [`Database`] can open. Statements are built from
/// [`USER_SCHEMA`] for the handle's dialect.
#[derive(Clone)]
pub struct SqlUserStorage {
    db: Database,
}

impl SqlUserStorage {
    /// Creates a new `SqlUserStorage` on top of an open database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying handle.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    fn select_where(&self, column: &str) -> String {
        let dialect = self.db.dialect();
        format!(
            "{} WHERE {} = {}",
            USER_SCHEMA.select_sql(dialect),
            dialect.quote(column),
            dialect.placeholder(1)
        )
    }
}

/// Maps a row selected with [`crate::users::EntitySchema::select_list`].
///
/// Only the required columns are strict; nullable columns written by other
/// tools decode to their empty value.
fn user_from_row(row: &AnyRow) -> Result<User, sqlx::Error> {
    let groups: Option<String> = row.try_get("groups")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get::<Option<String>, _>("username")?.unwrap_or_default(),
        password: row.try_get::<Option<String>, _>("password")?.unwrap_or_default(),
        otp_id: row.try_get::<Option<String>, _>("otp_id")?.unwrap_or_default(),
        serial: row.try_get::<Option<i64>, _>("serial")?.unwrap_or_default(),
        name: row.try_get("name")?,
        groups: groups.as_deref().map(decode_groups).unwrap_or_default(),
        scenario_id: row.try_get("scenario_id")?,
        role_id: row.try_get("role_id")?,
    })
}

impl UserStorage for SqlUserStorage {
    async fn create_user(&self, user: &User) -> Result<User, UserStorageError> {
        validate_new_user(user)?;

        let dialect = self.db.dialect();
        let sql = USER_SCHEMA.insert_sql(dialect);

        // Bind order follows `USER_SCHEMA.insertable_columns()`.
        let query = sqlx::query(&sql)
            .bind(user.username.clone())
            .bind(user.password.clone())
            .bind(user.otp_id.clone())
            .bind(user.serial)
            .bind(user.name.clone())
            .bind(encode_groups(&user.groups))
            .bind(user.scenario_id)
            .bind(user.role_id);

        let id = if dialect.supports_returning() {
            let row = query.fetch_one(self.db.pool()).await?;
            row.try_get::<i64, _>(0)?
        } else {
            // MySQL
            let result = query.execute(self.db.pool()).await?;
            result.last_insert_id().ok_or_else(|| {
                UserStorageError::StorageError("store did not report the inserted id".to_owned())
            })?
        };

        tracing::debug!(user_id = id, username = %user.username, "User created");

        Ok(User {
            id,
            ..user.clone()
        })
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, UserStorageError> {
        let row = sqlx::query(&self.select_where("id"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStorageError> {
        let dialect = self.db.dialect();
        let sql = format!(
            "{} ORDER BY {}",
            self.select_where("username"),
            dialect.quote("id")
        );
        let row = sqlx::query(&sql)
            .bind(username.to_owned())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserStorageError> {
        let dialect = self.db.dialect();
        let sql = format!(
            "{} ORDER BY {}",
            USER_SCHEMA.select_sql(dialect),
            dialect.quote("id")
        );
        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;

        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = users.len(), "Users listed");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "$2b$10$abcdefghijklmnopqrstuu5Q8j1cUe2PbV2sWlB3lJg7GZr8a1b2C";

    fn sample(username: &str) -> User {
        User::new(
            0,
            username,
            HASH,
            "otp",
            1,
            format!("{username} display"),
            vec!["users".to_owned()],
            1,
            1,
        )
    }

    #[tokio::test]
    async fn test_mock_create_assigns_ids() {
        let storage = MockUserStorage::new();

        let first = storage.create_user(&sample("alice")).await.expect("create alice");
        let second = storage.create_user(&sample("bob")).await.expect("create bob");

        assert_eq!(first.id, 1, "first id should be 1");
        assert_eq!(second.id, 2, "ids should increase");
        assert_eq!(storage.len(), 2, "two users stored");
    }

    #[tokio::test]
    async fn test_mock_lookup() {
        let storage = MockUserStorage::new();
        let alice = storage.create_user(&sample("alice")).await.expect("create alice");

        let by_id = storage.get_user(alice.id).await.expect("get by id");
        assert_eq!(by_id, Some(alice.clone()), "lookup by id");

        let by_name = storage.find_by_username("alice").await.expect("find");
        assert_eq!(by_name, Some(alice), "lookup by username");

        let missing = storage.find_by_username("nobody").await.expect("find");
        assert!(missing.is_none(), "unknown username");
    }

    #[tokio::test]
    async fn test_plaintext_password_is_rejected() {
        let storage = MockUserStorage::new();
        let mut user = sample("alice");
        user.password = "hunter2".to_owned();

        let result = storage.create_user(&user).await;
        assert!(
            matches!(result, Err(UserStorageError::InvalidInput(_))),
            "plaintext password must not be stored"
        );
        assert!(storage.is_empty(), "nothing should be stored");
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let storage = MockUserStorage::new();
        let mut user = sample("alice");
        user.name = "  ".to_owned();

        let result = storage.create_user(&user).await;
        assert!(
            matches!(result, Err(UserStorageError::InvalidInput(_))),
            "name is required"
        );
    }
}
