use crate::backend::mysql::MySqlBackend;
use crate::backend::postgres::PostgresBackend;
use crate::backend::sqlite::SqliteBackend;
use crate::backend::{ColumnRecord, ForeignKeyRecord, SchemaBackend};
use crate::config::DatabaseConfig;
use crate::error::{Result, SeedError};
use crate::generate::value::Value;
use crate::schema::types::{Column, DatabaseType};

/// A connected backend chosen at runtime from the configuration.
pub enum AnyBackend {
    Postgres(PostgresBackend),
    MySql(MySqlBackend),
    Sqlite(SqliteBackend),
}

/// Open a connection for the configured backend.
///
/// SQL Server is a valid discriminator but has no driver in this build, so it
/// fails here as a setup error before any table is touched.
pub async fn connect(config: &DatabaseConfig) -> Result<AnyBackend> {
    let db_type = config.database_type()?;
    let url = config.connection_url()?;
    tracing::info!(
        "Connecting to {} at {}",
        db_type,
        crate::backend::sql::sanitize_url(&url)
    );

    match db_type {
        DatabaseType::PostgreSQL => Ok(AnyBackend::Postgres(
            PostgresBackend::connect(&url, config.schema_name.as_deref()).await?,
        )),
        DatabaseType::MySQL => {
            let database = config
                .database_name
                .clone()
                .or_else(|| database_from_url(&url))
                .ok_or_else(|| SeedError::Config {
                    message: "MySQL needs a database name (database.databaseName or URL path)"
                        .to_string(),
                })?;
            Ok(AnyBackend::MySql(MySqlBackend::connect(&url, database).await?))
        }
        DatabaseType::SQLite => Ok(AnyBackend::Sqlite(SqliteBackend::connect(&url).await?)),
        DatabaseType::SqlServer => Err(SeedError::UnsupportedDatabase {
            backend: "sqlserver (no driver available in this build)".to_string(),
        }),
    }
}

/// Last path segment of a connection URL, without query parameters.
fn database_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let name = parsed.path().trim_start_matches('/');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

macro_rules! delegate {
    ($self:ident, $backend:ident => $call:expr) => {
        match $self {
            AnyBackend::Postgres($backend) => $call,
            AnyBackend::MySql($backend) => $call,
            AnyBackend::Sqlite($backend) => $call,
        }
    };
}

impl SchemaBackend for AnyBackend {
    fn database_type(&self) -> DatabaseType {
        delegate!(self, b => b.database_type())
    }

    fn schema_name(&self) -> &str {
        delegate!(self, b => b.schema_name())
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        delegate!(self, b => b.list_tables().await)
    }

    async fn describe_columns(&mut self) -> Result<Vec<ColumnRecord>> {
        delegate!(self, b => b.describe_columns().await)
    }

    async fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKeyRecord>> {
        delegate!(self, b => b.list_foreign_keys().await)
    }

    async fn set_constraint_enforcement(&mut self, enabled: bool) -> Result<()> {
        delegate!(self, b => b.set_constraint_enforcement(enabled).await)
    }

    async fn sample_values(
        &mut self,
        table: &str,
        column: &Column,
        limit: usize,
    ) -> Result<Vec<Value>> {
        delegate!(self, b => b.sample_values(table, column, limit).await)
    }

    async fn max_primary_key_value(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        delegate!(self, b => b.max_primary_key_value(table, column).await)
    }

    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64> {
        delegate!(self, b => b.execute_batch_insert(table, columns, rows).await)
    }
}
