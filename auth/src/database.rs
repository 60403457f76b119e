//! Database connection bootstrap.
//!
//! Callers pass [`ConnectionOptions`]; every field they set overrides the
//! matching field of [`ConnectionSettings::default`]. The merged settings
//! select a driver, open a pool and, when `synchronize` is on, create any
//! table of the configured entities that does not exist yet.
//!
//! `synchronize` defaults to `true` so a fresh store gets its schema without
//! migrations. Deployments with a managed schema should turn it off.

use crate::users::schema::{Dialect, EntitySchema, USER_SCHEMA};
use sqlx::AnyPool;
use sqlx::any::{AnyPoolOptions, install_default_drivers};

/// Backend driver name as accepted in configuration.
pub type DbType = Dialect;

/// Error types for the database bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("No database type configured")]
    MissingDriver,
    #[error("Failed to connect to {db_type} database: {source}")]
    Connect {
        db_type: DbType,
        #[source]
        source: sqlx::Error,
    },
    #[error("Failed to synchronize table {table}: {source}")]
    Synchronize {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Complete connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub db_type: Option<DbType>,
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    /// Database name, or the file path for SQLite (`:memory:` for an in-memory store).
    pub database: String,
    /// Create missing tables on connect.
    pub synchronize: bool,
    pub entities: Vec<&'static EntitySchema>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            db_type: None,
            host: String::new(),
            port: None,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            synchronize: true,
            entities: vec![&USER_SCHEMA],
        }
    }
}

/// Caller overrides. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub db_type: Option<DbType>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub synchronize: Option<bool>,
    pub entities: Option<Vec<&'static EntitySchema>>,
}

/// Applies every override set in `overrides` on top of `base`.
pub fn merge_defaults(
    base: ConnectionSettings,
    overrides: ConnectionOptions,
) -> ConnectionSettings {
    ConnectionSettings {
        db_type: overrides.db_type.or(base.db_type),
        host: overrides.host.unwrap_or(base.host),
        port: overrides.port.or(base.port),
        username: overrides.username.unwrap_or(base.username),
        password: overrides.password.unwrap_or(base.password),
        database: overrides.database.unwrap_or(base.database),
        synchronize: overrides.synchronize.unwrap_or(base.synchronize),
        entities: overrides.entities.unwrap_or(base.entities),
    }
}

impl ConnectionSettings {
    /// Connection URL for the configured driver.
    pub fn url(&self) -> Result<String, ConnectionError> {
        let scheme = match self.db_type.ok_or(ConnectionError::MissingDriver)? {
            Dialect::Sqlite => return Ok(self.sqlite_url()),
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
        };
        let mut url = format!("{scheme}://");
        if !self.username.is_empty() {
            url.push_str(&urlencoding::encode(&self.username));
            if !self.password.is_empty() {
                url.push(':');
                url.push_str(&urlencoding::encode(&self.password));
            }
            url.push('@');
        }
        url.push_str(if self.host.is_empty() { "localhost" } else { &self.host });
        if let Some(port) = self.port {
            url.push_str(&format!(":{port}"));
        }
        if !self.database.is_empty() {
            url.push('/');
            url.push_str(&urlencoding::encode(&self.database));
        }
        Ok(url)
    }

    /// Each path segment is percent-encoded so `?` and `#` stay in the file name.
    fn sqlite_url(&self) -> String {
        if self.is_in_memory() {
            return "sqlite::memory:".to_owned();
        }
        let path = self
            .database
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        format!("sqlite://{path}?mode=rwc")
    }

    fn is_in_memory(&self) -> bool {
        self.database.is_empty() || self.database == ":memory:"
    }
}

/// Shared handle to an open store.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
    settings: ConnectionSettings,
}

impl Database {
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The merged settings this handle was opened with.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Checks that the store answers a trivial query.
    pub async fn is_connected(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Creates every configured entity table that does not exist yet.
    pub async fn synchronize(&self) -> Result<(), ConnectionError> {
        for entity in &self.settings.entities {
            let sql = entity.create_table_sql(self.dialect);
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|source| ConnectionError::Synchronize {
                    table: entity.name,
                    source,
                })?;
            tracing::info!(table = entity.name, "Schema synchronized");
        }
        Ok(())
    }

    /// Closes every connection of the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Opens a connection using `options` merged over the default settings.
pub async fn create_db(options: ConnectionOptions) -> Result<Database, ConnectionError> {
    connect(merge_defaults(ConnectionSettings::default(), options)).await
}

/// Opens a connection with fully specified settings.
pub async fn connect(settings: ConnectionSettings) -> Result<Database, ConnectionError> {
    let dialect = settings.db_type.ok_or(ConnectionError::MissingDriver)?;
    let url = settings.url()?;

    install_default_drivers();

    let mut pool_options = AnyPoolOptions::new();
    if dialect == Dialect::Sqlite && settings.is_in_memory() {
        // Each in-memory SQLite connection is a separate database.
        pool_options = pool_options.max_connections(1).idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options
        .connect(&url)
        .await
        .map_err(|source| ConnectionError::Connect {
            db_type: dialect,
            source,
        })?;

    tracing::info!(
        db_type = %dialect,
        host = %settings.host,
        database = %settings.database,
        "Database connection pool established"
    );

    let db = Database {
        pool,
        dialect,
        settings,
    };

    if db.settings.synchronize {
        db.synchronize().await?;
    }

    Ok(db)
}
