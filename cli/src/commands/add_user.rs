//! Add user command.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use tracing::{info, instrument};
use webdesk_auth::otp::{create_hash, validate_otp};
use webdesk_auth::password::{PasswordHasher, PasswordPrompt, create_password_with};
use webdesk_auth::users::model::parse_group_list;
use webdesk_auth::users::{User, UserStorage};

use crate::output::Output;

#[derive(Debug, Clone, Args)]
pub struct AddUserArgs {
    /// Login name
    #[arg(long, short = 'u')]
    pub username: String,

    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Comma separated group memberships
    #[arg(long, short = 'g', default_value = "")]
    pub groups: String,

    /// Scenario the account belongs to
    #[arg(long)]
    pub scenario_id: i64,

    /// Role of the account
    #[arg(long)]
    pub role_id: i64,

    /// An OTP from the user's hardware token, used to bind the device
    #[arg(long)]
    pub otp: Option<String>,
}

/// Prompts for a password, binds the optional OTP device and stores the user.
#[instrument(skip_all, name = "add_user", fields(username = %args.username))]
pub async fn run_add_user<S, P>(
    storage: &S,
    prompter: P,
    hasher: &PasswordHasher,
    args: AddUserArgs,
    out: &Output,
) -> Result<User>
where
    S: UserStorage,
    P: PasswordPrompt,
{
    if args.username.trim().is_empty() {
        bail!("Username cannot be empty");
    }
    if storage.find_by_username(&args.username).await?.is_some() {
        bail!("User '{}' already exists", args.username);
    }

    let (otp_id, serial) = match args.otp.as_deref() {
        Some(otp) => {
            let verification = validate_otp(otp)
                .await
                .context("OTP verification failed")?;
            let serial = i64::try_from(verification.otp.serial)
                .context("OTP device serial is out of range")?;
            (create_hash(&verification.otp.identity), serial)
        }
        None => (String::new(), 0),
    };

    let password = create_password_with(prompter, hasher)
        .await
        .context("Failed to create password")?;

    let user = User::new(
        0,
        args.username,
        password,
        otp_id,
        serial,
        args.name,
        parse_group_list(&args.groups),
        args.scenario_id,
        args.role_id,
    );
    let stored = storage.create_user(&user).await?;

    info!(user_id = stored.id, "User added");
    out.success(format!(
        "Created user '{}' with id {}",
        stored.username, stored.id
    ));

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use webdesk_auth::password::{MaskedLineReader, compare_password};
    use webdesk_auth::users::MockUserStorage;

    const OTP: &str = "ccccccbchvthlivuitriujjifivbvtrjkjfirllluurf";

    fn args(username: &str, otp: Option<&str>) -> AddUserArgs {
        AddUserArgs {
            username: username.to_owned(),
            name: "Alice A.".to_owned(),
            groups: "admins, users".to_owned(),
            scenario_id: 7,
            role_id: 2,
            otp: otp.map(str::to_owned),
        }
    }

    fn typed(password: &str) -> MaskedLineReader<Cursor<String>, io::Sink> {
        MaskedLineReader::new(Cursor::new(format!("{password}\n")), io::sink())
    }

    #[tokio::test]
    async fn test_add_user_hashes_password() {
        let storage = MockUserStorage::new();
        let user = run_add_user(
            &storage,
            typed("s3cret"),
            &PasswordHasher::with_cost(4),
            args("alice", None),
            &Output::new(),
        )
        .await
        .expect("user should be added");

        assert_eq!(user.id, 1, "first user");
        assert_ne!(user.password, "s3cret", "password is hashed");
        assert!(compare_password("s3cret", &user.password).await, "hash verifies");
        assert_eq!(
            user.groups,
            vec!["admins".to_owned(), "users".to_owned()],
            "groups parsed from the flag"
        );
        assert_eq!(user.otp_id, "", "no device bound");
    }

    #[tokio::test]
    async fn test_add_user_binds_otp_device() {
        let storage = MockUserStorage::new();
        let user = run_add_user(
            &storage,
            typed("s3cret"),
            &PasswordHasher::with_cost(4),
            args("alice", Some(OTP)),
            &Output::new(),
        )
        .await
        .expect("user should be added");

        assert_eq!(user.otp_id, create_hash("ccccccbchvth"), "identity is hashed");
        assert_eq!(user.serial, 0x0010_6fd6, "serial from the identity");
    }

    #[tokio::test]
    async fn test_add_user_rejects_bad_otp_before_prompting() {
        let storage = MockUserStorage::new();
        // No input: reaching the prompt would fail with EOF instead.
        let prompter = MaskedLineReader::new(Cursor::new(String::new()), io::sink());
        let result = run_add_user(
            &storage,
            prompter,
            &PasswordHasher::with_cost(4),
            args("alice", Some("definitely-not-modhex")),
            &Output::new(),
        )
        .await;

        let err = result.expect_err("bad otp should fail");
        assert!(
            err.to_string().contains("OTP verification failed"),
            "unexpected error: {err}"
        );
        assert!(storage.is_empty(), "nothing stored");
    }

    #[tokio::test]
    async fn test_add_user_rejects_duplicates() {
        let storage = MockUserStorage::new();
        let hasher = PasswordHasher::with_cost(4);
        run_add_user(&storage, typed("a"), &hasher, args("alice", None), &Output::new())
            .await
            .expect("first insert");

        let result =
            run_add_user(&storage, typed("b"), &hasher, args("alice", None), &Output::new())
                .await;
        assert!(result.is_err(), "duplicate username should fail");
        assert_eq!(storage.len(), 1, "still one user");
    }
}
