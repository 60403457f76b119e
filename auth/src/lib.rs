//! Authentication utilities for the web desktop.
//!
//! The crate is a set of leaf services that only share the [`User`] type:
//!
//! - [`users`]: the user record, its schema mapping and storage
//! - [`password`]: bcrypt hashing, masked password prompts and comparison
//! - [`otp`]: OTP device hashing and offline verification
//! - [`database`]: connection bootstrap with defaults merging and schema sync
//! - [`config`] / [`telemetry`]: environment configuration and tracing setup

pub mod config;
pub mod database;
pub mod otp;
pub mod password;
pub mod telemetry;
pub mod users;

pub use database::{ConnectionError, ConnectionOptions, ConnectionSettings, Database, create_db};
pub use otp::{OtpVerification, VerificationError, create_hash, validate_otp};
pub use password::{
    PasswordError, compare_password, create_password, encrypt_password, prompt_password,
};
pub use users::{USER_SCHEMA, User};
