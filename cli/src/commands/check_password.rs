//! Check password command.

use anyhow::Result;
use tracing::instrument;
use webdesk_auth::password::{
    PASSWORD_PROMPT, PasswordPrompt, compare_password, prompt_password_with,
};
use webdesk_auth::users::UserStorage;

use crate::output::Output;

/// Prompts for `username`'s password and reports whether it matches.
///
/// The prompt is shown even for unknown users and both failures produce the
/// same message.
#[instrument(skip_all, name = "check_password", fields(username = %username))]
pub async fn run_check_password<S, P>(
    storage: &S,
    prompter: P,
    username: &str,
    out: &Output,
) -> Result<bool>
where
    S: UserStorage,
    P: PasswordPrompt,
{
    let password = prompt_password_with(prompter, PASSWORD_PROMPT).await?;

    let matches = match storage.find_by_username(username).await? {
        Some(user) => compare_password(&password, &user.password).await,
        None => false,
    };

    if matches {
        out.success("Password matches");
    } else {
        out.error("Password does not match");
    }
    Ok(matches)
}
