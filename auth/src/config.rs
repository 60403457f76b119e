use crate::database::{ConnectionOptions, DbType};
use crate::password::{DEFAULT_COST, PasswordHasher};
use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;

/// Lowest and highest cost bcrypt accepts.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Env {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "test")]
    Test,
    #[serde(rename = "prod")]
    Prod,
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Test => write!(f, "test"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

// The final, validated configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    connection: ConnectionOptions,
    bcrypt_cost: u32,
}

// An intermediate struct for deserializing environment variables
// where everything but `env` is optional.
#[derive(Deserialize)]
struct RawConfig {
    env: Env,
    db_type: Option<DbType>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_username: Option<String>,
    db_password: Option<String>,
    db_database: Option<String>,
    db_synchronize: Option<bool>,
    bcrypt_cost: Option<u32>,
}

impl Config {
    /// Create a test configuration backed by an in-memory SQLite database.
    ///
    /// This function is available for both unit tests and integration tests.
    /// It should not be used in production code.
    pub fn new_for_test() -> Self {
        Self {
            env: Env::Test,
            connection: ConnectionOptions {
                db_type: Some(DbType::Sqlite),
                database: Some(":memory:".to_owned()),
                ..Default::default()
            },
            bcrypt_cost: 4,
        }
    }

    pub fn environment(&self) -> Env {
        self.env
    }

    pub fn is_local(&self) -> bool {
        matches!(self.env, Env::Local)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self.env, Env::Prod)
    }

    /// Overrides to hand to [`crate::database::create_db`].
    pub fn connection_options(&self) -> ConnectionOptions {
        self.connection.clone()
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Hasher configured with [`Self::bcrypt_cost`].
    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::with_cost(self.bcrypt_cost)
    }

    /// Initializes configuration by reading from environment variables
    /// and applying environment-aware defaults.
    pub fn init() -> anyhow::Result<Self> {
        let raw_config: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw_config)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            env,
            db_type,
            db_host,
            db_port,
            db_username,
            db_password,
            db_database,
            db_synchronize,
            bcrypt_cost,
        } = raw_config;

        if db_type.is_none() && matches!(env, Env::Prod) {
            anyhow::bail!("DB_TYPE must be set for {env} environment");
        }

        // Schema changes in production go through migrations, not synchronize.
        let synchronize = match db_synchronize {
            Some(value) => Some(value),
            None if matches!(env, Env::Prod) => Some(false),
            None => None,
        };

        let bcrypt_cost = match bcrypt_cost {
            Some(cost) if BCRYPT_COST_RANGE.contains(&cost) => cost,
            Some(cost) => anyhow::bail!(
                "BCRYPT_COST must be between {} and {}, got {cost}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            ),
            None => DEFAULT_COST,
        };

        Ok(Self {
            env,
            connection: ConnectionOptions {
                db_type,
                host: db_host,
                port: db_port,
                username: db_username,
                password: db_password,
                database: db_database,
                synchronize,
                entities: None,
            },
            bcrypt_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn local_config_leaves_bootstrap_defaults() {
        let raw: RawConfig =
            from_iter(vec![("ENV", "local")]).expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("local config should build");
        let options = config.connection_options();
        assert_eq!(options, ConnectionOptions::default(), "nothing overridden");
        assert_eq!(config.bcrypt_cost(), DEFAULT_COST, "default cost");
        assert!(config.is_local(), "local env");
    }

    #[test]
    fn database_variables_become_overrides() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "local"),
            ("DB_TYPE", "postgres"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "5433"),
            ("DB_USERNAME", "desk"),
            ("DB_PASSWORD", "pw"),
            ("DB_DATABASE", "desktop"),
            ("DB_SYNCHRONIZE", "true"),
        ])
        .expect("RawConfig should deserialize");

        let options = Config::from_raw(raw)
            .expect("config should build")
            .connection_options();
        assert_eq!(options.db_type, Some(DbType::Postgres), "db type");
        assert_eq!(options.host.as_deref(), Some("db.internal"), "host");
        assert_eq!(options.port, Some(5433), "port");
        assert_eq!(options.username.as_deref(), Some("desk"), "username");
        assert_eq!(options.password.as_deref(), Some("pw"), "password");
        assert_eq!(options.database.as_deref(), Some("desktop"), "database");
        assert_eq!(options.synchronize, Some(true), "synchronize");
        assert!(options.entities.is_none(), "entities keep their default");
    }

    #[test]
    fn prod_requires_db_type() {
        let raw: RawConfig =
            from_iter(vec![("ENV", "prod")]).expect("RawConfig should deserialize");

        let result = Config::from_raw(raw);
        assert!(result.is_err(), "prod without DB_TYPE should fail");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("DB_TYPE must be set for prod environment"),
            "error should name the variable and the environment"
        );
    }

    #[test]
    fn prod_disables_synchronize_by_default() {
        let raw: RawConfig = from_iter(vec![("ENV", "prod"), ("DB_TYPE", "mysql")])
            .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("prod config should build");
        assert_eq!(
            config.connection_options().synchronize,
            Some(false),
            "prod should not synchronize unless asked"
        );
    }

    #[test]
    fn prod_synchronize_can_be_enabled() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "prod"),
            ("DB_TYPE", "mariadb"),
            ("DB_SYNCHRONIZE", "true"),
        ])
        .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("prod config should build");
        assert_eq!(config.connection_options().db_type, Some(DbType::MySql), "mariadb alias");
        assert_eq!(config.connection_options().synchronize, Some(true), "explicit value wins");
    }

    #[test]
    fn bcrypt_cost_is_validated() {
        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("BCRYPT_COST", "3")])
            .expect("RawConfig should deserialize");
        let err = Config::from_raw(raw).expect_err("cost 3 is below bcrypt's minimum");
        assert_eq!(
            err.to_string(),
            "BCRYPT_COST must be between 4 and 31, got 3",
            "error should show the range and the value"
        );

        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("BCRYPT_COST", "12")])
            .expect("RawConfig should deserialize");
        let config = Config::from_raw(raw).expect("cost 12 is fine");
        assert_eq!(config.password_hasher().cost(), 12, "hasher uses the cost");
    }
}
