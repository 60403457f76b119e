//! User management module.
//!
//! This module provides:
//! - The in-memory `User` record
//! - The schema mapping that binds `User` to the `users` table
//! - A storage abstraction for reading and writing user rows

pub mod model;
pub mod schema;
pub mod storage;

pub use model::User;
pub use schema::{ColumnDef, ColumnKind, Dialect, EntitySchema, USER_SCHEMA};
pub use storage::{MockUserStorage, SqlUserStorage, UserStorage, UserStorageError};
