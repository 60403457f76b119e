//! Password credential handling.
//!
//! Passwords are hashed with bcrypt on the blocking thread pool. Comparison
//! never fails: any internal error is reported as a mismatch so callers cannot
//! tell a wrong password from a broken hash.

mod prompt;

pub use prompt::{MASK_CHAR, MaskedLineReader, PasswordPrompt, TerminalPrompt};

use std::io;
use tokio::task;

/// Text shown by [`create_password`].
pub const PASSWORD_PROMPT: &str = "Password: ";

/// Default bcrypt cost.
pub const DEFAULT_COST: u32 = 10;

/// Error types for password operations.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Failed to read password: {0}")]
    Prompt(#[from] io::Error),
}

/// Bcrypt hasher with a fixed cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// Creates a hasher using `cost`. Out-of-range costs fail at hash time.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Produces a salted bcrypt hash of `plaintext`.
    pub async fn encrypt(&self, plaintext: &str) -> Result<String, PasswordError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();

        task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }
}

/// Hashes `plaintext` with the default cost.
pub async fn encrypt_password(plaintext: &str) -> Result<String, PasswordError> {
    PasswordHasher::default().encrypt(plaintext).await
}

/// Returns `true` only if `plaintext` verifies against `hash`.
pub async fn compare_password(plaintext: &str, hash: &str) -> bool {
    let plaintext = plaintext.to_owned();
    let hash = hash.to_owned();

    match task::spawn_blocking(move || bcrypt::verify(plaintext, &hash)).await {
        Ok(Ok(valid)) => valid,
        Ok(Err(e)) => {
            tracing::warn!("Password comparison failed: {e}");
            false
        }
        Err(e) => {
            tracing::warn!("Password comparison task failed: {e}");
            false
        }
    }
}

/// Reads a password from `prompter`, showing `prompt` first.
pub async fn prompt_password_with<P: PasswordPrompt>(
    mut prompter: P,
    prompt: impl Into<String>,
) -> Result<String, PasswordError> {
    let prompt = prompt.into();

    task::spawn_blocking(move || prompter.read_password(&prompt))
        .await
        .map_err(io::Error::other)?
        .map_err(PasswordError::from)
}

/// Reads a password from the terminal, masking every keystroke.
pub async fn prompt_password(prompt: impl Into<String>) -> Result<String, PasswordError> {
    prompt_password_with(TerminalPrompt::stdout(), prompt).await
}

/// Prompts with [`PASSWORD_PROMPT`] and hashes the answer with `hasher`.
pub async fn create_password_with<P: PasswordPrompt>(
    prompter: P,
    hasher: &PasswordHasher,
) -> Result<String, PasswordError> {
    let plaintext = prompt_password_with(prompter, PASSWORD_PROMPT).await?;
    hasher.encrypt(&plaintext).await
}

/// Prompts on the terminal and returns the bcrypt hash of the answer.
pub async fn create_password() -> Result<String, PasswordError> {
    create_password_with(TerminalPrompt::stdout(), &PasswordHasher::default()).await
}

/// Whether `value` has the shape of a bcrypt hash (`$2?$NN$` + 53 characters).
pub fn is_bcrypt_hash(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 60
        && bytes.starts_with(b"$2")
        && matches!(bytes[2], b'a' | b'b' | b'x' | b'y')
        && bytes[3] == b'$'
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'$'
}
