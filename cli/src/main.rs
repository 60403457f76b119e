//! Administration CLI for web desktop accounts.

#![allow(clippy::exit)]

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use webdesk_auth::config::Config;
use webdesk_auth::password::TerminalPrompt;
use webdesk_auth::telemetry;

use crate::commands::{
    AddUserArgs, open_storage, run_add_user, run_check_password, run_hash_otp, run_hash_password,
    run_list_users, run_verify_otp,
};
use crate::output::Output;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "webdesk-auth")]
#[command(about = "Manage web desktop accounts, passwords and OTP devices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user, prompting for the password
    AddUser(AddUserArgs),
    /// List stored users
    ListUsers,
    /// Check a user's password
    CheckPassword {
        /// Login name
        #[arg(long, short = 'u')]
        username: String,
    },
    /// Prompt for a password and print its bcrypt hash
    HashPassword,
    /// Print the storable digest of an OTP device token
    HashOtp {
        /// Device token, usually the OTP identity prefix
        token: String,
    },
    /// Verify an OTP offline and print the decoded fields
    VerifyOtp {
        /// The full OTP as typed by the hardware token
        otp: String,
    },
}

/// Runs the selected command; `Ok(false)` means the command ran but failed.
async fn run(cli: Cli, config: &Config, out: &Output) -> Result<bool> {
    match cli.command {
        Commands::AddUser(args) => {
            let storage = open_storage(config).await?;
            run_add_user(
                &storage,
                TerminalPrompt::stderr(),
                &config.password_hasher(),
                args,
                out,
            )
            .await?;
            storage.inner().close().await;
            Ok(true)
        }
        Commands::ListUsers => {
            let storage = open_storage(config).await?;
            run_list_users(&storage, out).await?;
            storage.inner().close().await;
            Ok(true)
        }
        Commands::CheckPassword { username } => {
            let storage = open_storage(config).await?;
            let matches =
                run_check_password(&storage, TerminalPrompt::stderr(), &username, out).await?;
            storage.inner().close().await;
            Ok(matches)
        }
        Commands::HashPassword => {
            run_hash_password(TerminalPrompt::stderr(), &config.password_hasher(), out).await?;
            Ok(true)
        }
        Commands::HashOtp { token } => {
            run_hash_otp(&token, out);
            Ok(true)
        }
        Commands::VerifyOtp { otp } => run_verify_otp(&otp, out).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::init()?;
    telemetry::init_tracing(&config)?;
    info!(env = %config.environment(), "Configuration loaded");

    let out = Output::new();
    match run(cli, &config, &out).await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!(error = ?e, "Command failed");
            out.error(format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_user() {
        let cli = Cli::try_parse_from([
            "webdesk-auth",
            "add-user",
            "-u",
            "alice",
            "-n",
            "Alice A.",
            "-g",
            "admins,users",
            "--scenario-id",
            "7",
            "--role-id",
            "2",
        ])
        .expect("args should parse");

        let Commands::AddUser(args) = cli.command else {
            panic!("expected add-user");
        };
        assert_eq!(args.username, "alice", "username flag");
        assert_eq!(args.groups, "admins,users", "groups flag");
        assert_eq!(args.scenario_id, 7, "scenario flag");
        assert!(args.otp.is_none(), "otp is optional");
    }

    #[test]
    fn test_add_user_requires_role() {
        let result = Cli::try_parse_from([
            "webdesk-auth",
            "add-user",
            "-u",
            "alice",
            "-n",
            "Alice",
            "--scenario-id",
            "1",
        ]);
        assert!(result.is_err(), "role id is required");
    }

    #[test]
    fn test_parse_verify_otp() {
        let cli = Cli::try_parse_from(["webdesk-auth", "verify-otp", "cccccc"])
            .expect("args should parse");
        assert!(
            matches!(cli.command, Commands::VerifyOtp { ref otp } if otp == "cccccc"),
            "positional otp"
        );
    }

    #[test]
    fn test_check_password_requires_username() {
        assert!(
            Cli::try_parse_from(["webdesk-auth", "check-password"]).is_err(),
            "username is required"
        );
    }
}
