//! Shared test utilities for integration tests.

use webdesk_auth::config::Config;
use webdesk_auth::database::{Database, create_db};
use webdesk_auth::password::PasswordHasher;
use webdesk_auth::users::User;

/// A well formed Yubico OTP whose identity is `ccccccbchvth`.
#[allow(dead_code)]
pub const TEST_OTP: &str = "ccccccbchvthlivuitriujjifivbvtrjkjfirllluurf";

/// Opens a fresh in-memory SQLite database with the users table created.
pub async fn memory_db() -> Database {
    create_db(Config::new_for_test().connection_options())
        .await
        .expect("in-memory sqlite should open")
}

/// Hasher with the cheapest cost bcrypt accepts.
#[allow(dead_code)]
pub fn fast_hasher() -> PasswordHasher {
    Config::new_for_test().password_hasher()
}

/// Builds a user whose password is a real hash of `password`.
#[allow(dead_code)]
pub async fn user_with_password(username: &str, password: &str) -> User {
    let hash = fast_hasher()
        .encrypt(password)
        .await
        .expect("hashing should succeed");
    User::new(
        0,
        username,
        hash,
        "",
        0,
        format!("{username} (test)"),
        vec!["users".to_owned()],
        1,
        2,
    )
}
