//! Declarative schema mapping between records and tables.
//!
//! An [`EntitySchema`] names a table and describes its columns. The database
//! bootstrap uses it to synchronize the live schema and the storage layer uses
//! it to build its statements, so both always agree on column names and order.

use serde::Deserialize;
use std::fmt::{Display, Write as _};

/// Column storage kinds supported by the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 64-bit integer.
    Int,
    /// Bounded text.
    Varchar,
    /// A list of strings stored as one delimited text value.
    SimpleArray,
}

/// A single column of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub primary: bool,
    /// Value is generated by the store on insert.
    pub generated: bool,
    pub nullable: bool,
}

impl ColumnDef {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            primary: false,
            generated: false,
            nullable: true,
        }
    }

    const fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    const fn generated_primary(mut self) -> Self {
        self.primary = true;
        self.generated = true;
        self.nullable = false;
        self
    }
}

/// Binds a record type to a table.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    /// Table name.
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

/// Mapping for [`crate::users::User`].
pub static USER_SCHEMA: EntitySchema = EntitySchema {
    name: "users",
    columns: &[
        ColumnDef::new("id", ColumnKind::Int).generated_primary(),
        ColumnDef::new("username", ColumnKind::Varchar),
        ColumnDef::new("password", ColumnKind::Varchar),
        ColumnDef::new("otp_id", ColumnKind::Varchar),
        ColumnDef::new("serial", ColumnKind::Int),
        ColumnDef::new("name", ColumnKind::Varchar).required(),
        ColumnDef::new("groups", ColumnKind::SimpleArray),
        ColumnDef::new("scenario_id", ColumnKind::Int).required(),
        ColumnDef::new("role_id", ColumnKind::Int).required(),
    ],
};

/// SQL flavour of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
    Sqlite,
}

impl Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::MySql => write!(f, "mysql"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl Dialect {
    /// Quotes an identifier. `groups` is reserved in MySQL 8 so every name is quoted.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{ident}`"),
            Self::Postgres | Self::Sqlite => format!("\"{ident}\""),
        }
    }

    /// Bind placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Self::Postgres => format!("${index}"),
            Self::MySql | Self::Sqlite => "?".to_owned(),
        }
    }

    /// Whether `INSERT ... RETURNING` is used to read generated ids.
    ///
    /// SQLite has it since 3.35; the `Any` driver never reports its
    /// `last_insert_id`, so SQLite must read the id from the returned row.
    pub fn supports_returning(self) -> bool {
        matches!(self, Self::Postgres | Self::Sqlite)
    }

    fn column_type(self, column: &ColumnDef) -> &'static str {
        if column.primary && column.generated {
            return match self {
                Self::Postgres => "BIGSERIAL PRIMARY KEY",
                Self::MySql => "BIGINT AUTO_INCREMENT PRIMARY KEY",
                Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            };
        }
        match (self, column.kind) {
            (Self::Sqlite, ColumnKind::Int) => "INTEGER",
            (Self::Sqlite, ColumnKind::Varchar) | (_, ColumnKind::SimpleArray) => "TEXT",
            (_, ColumnKind::Int) => "BIGINT",
            (_, ColumnKind::Varchar) => "VARCHAR(255)",
        }
    }
}

impl EntitySchema {
    /// The generated primary key column, if any.
    pub fn primary_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary)
    }

    /// Columns written on insert, in declaration order.
    pub fn insertable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.generated)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this entity.
    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let mut def = format!(
                    "{} {}",
                    dialect.quote(column.name),
                    dialect.column_type(column)
                );
                if !column.nullable && !column.primary {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({columns})",
            dialect.quote(self.name)
        )
    }

    /// Comma separated, quoted list of every column.
    pub fn select_list(&self, dialect: Dialect) -> String {
        self.columns
            .iter()
            .map(|c| dialect.quote(c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `SELECT <all columns> FROM <table>` without a filter.
    pub fn select_sql(&self, dialect: Dialect) -> String {
        format!(
            "SELECT {} FROM {}",
            self.select_list(dialect),
            dialect.quote(self.name)
        )
    }

    /// `INSERT` statement binding every insertable column in order.
    ///
    /// On dialects with `RETURNING` support the generated primary key is returned.
    pub fn insert_sql(&self, dialect: Dialect) -> String {
        let columns: Vec<&ColumnDef> = self.insertable_columns().collect();
        let names = columns
            .iter()
            .map(|c| dialect.quote(c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let values = (1..=columns.len())
            .map(|i| dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "INSERT INTO {} ({names}) VALUES ({values})",
            dialect.quote(self.name)
        );
        if dialect.supports_returning()
            && let Some(primary) = self.primary_column()
        {
            let _ = write!(sql, " RETURNING {}", dialect.quote(primary.name));
        }
        sql
    }
}
