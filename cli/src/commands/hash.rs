//! Hashing commands.

use anyhow::Result;
use webdesk_auth::otp::create_hash;
use webdesk_auth::password::{PasswordHasher, PasswordPrompt, create_password_with};

use crate::output::Output;

/// Prompts for a password and prints its bcrypt hash.
pub async fn run_hash_password<P: PasswordPrompt>(
    prompter: P,
    hasher: &PasswordHasher,
    out: &Output,
) -> Result<String> {
    let hash = create_password_with(prompter, hasher).await?;
    out.print(&hash);
    Ok(hash)
}

/// Prints the storable digest of an OTP device token.
pub fn run_hash_otp(token: &str, out: &Output) -> String {
    let hash = create_hash(token);
    out.print(&hash);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use webdesk_auth::password::{MaskedLineReader, compare_password};

    #[tokio::test]
    async fn test_hash_password_verifies() {
        let prompter = MaskedLineReader::new(Cursor::new("pw\n"), io::sink());
        let hash = run_hash_password(prompter, &PasswordHasher::with_cost(4), &Output::new())
            .await
            .expect("hash");
        assert!(compare_password("pw", &hash).await, "printed hash verifies");
    }

    #[test]
    fn test_hash_otp_matches_library() {
        assert_eq!(
            run_hash_otp("ccccccbchvth", &Output::new()),
            create_hash("ccccccbchvth"),
            "command prints the library digest"
        );
    }
}
