//! Command implementations for the account CLI.
//!
//! Each subcommand is implemented in its own module. Commands return
//! `Ok(false)` when they ran but the outcome is a failure the exit status
//! should report (wrong password, rejected OTP).

pub mod add_user;
pub mod check_password;
pub mod hash;
pub mod list_users;
pub mod verify_otp;

pub use add_user::{AddUserArgs, run_add_user};
pub use check_password::run_check_password;
pub use hash::{run_hash_otp, run_hash_password};
pub use list_users::run_list_users;
pub use verify_otp::run_verify_otp;

use anyhow::{Context as _, Result};
use webdesk_auth::config::Config;
use webdesk_auth::database::create_db;
use webdesk_auth::users::SqlUserStorage;

/// Opens the configured database and wraps it in user storage.
pub async fn open_storage(config: &Config) -> Result<SqlUserStorage> {
    let db = create_db(config.connection_options())
        .await
        .context("Failed to open the user database")?;
    Ok(SqlUserStorage::new(db))
}
