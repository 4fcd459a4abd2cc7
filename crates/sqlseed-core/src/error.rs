//! # Error Types
//!
//! Defines `SeedError`, the unified error enum for every failure mode in the
//! seeding pipeline. Setup failures (configuration, connection, introspection,
//! dependency cycles) abort a run; everything raised while populating a single
//! table is caught at the table boundary and recorded in the run report.

use thiserror::Error;

/// All errors that can occur in sqlseed operations.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Database connection failed: {message}\n  Connection string: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Schema introspection failed on query '{query}': {source}")]
    Introspection {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Unsupported database backend '{backend}'. Supported: postgresql, mysql, sqlite")]
    UnsupportedDatabase { backend: String },

    #[error("Circular dependency detected involving tables: {tables}\n  Tables in a foreign key cycle cannot be ordered. Exclude one of them or drop a constraint.")]
    CircularDependency { tables: String },

    #[error("Cannot plan batches for {table}: {column_count} columns per row never fits under the {max_parameters} parameter limit")]
    BatchTooWide {
        table: String,
        column_count: usize,
        max_parameters: usize,
    },

    #[error("Foreign key resolution failed: {source_table}.{source_column} references {target_table}.{target_column}, but the referenced column has no values to sample")]
    ForeignKeyResolution {
        source_table: String,
        source_column: String,
        target_table: String,
        target_column: String,
    },

    #[error("Integer key {table}.{column} has no values left after {last}")]
    KeyExhausted {
        table: String,
        column: String,
        last: i64,
    },

    #[error("Insert failed on {table} row {row_index}: {message}\n  SQL: {sql_preview}\n  DB error: {source}")]
    InsertFailed {
        table: String,
        row_index: usize,
        message: String,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to {} referential integrity checks: {source}", toggle_verb(.enabled))]
    ConstraintToggle {
        enabled: bool,
        #[source]
        source: sqlx::Error,
    },

    #[error("{message}: {source}")]
    Query {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl SeedError {
    /// True for errors that end the whole run rather than a single table.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SeedError::Connection { .. }
                | SeedError::Introspection { .. }
                | SeedError::UnsupportedDatabase { .. }
                | SeedError::CircularDependency { .. }
                | SeedError::Config { .. }
        )
    }

    /// Point an insert failure at the first row of the failing batch.
    pub fn at_row(self, offset: usize) -> Self {
        match self {
            SeedError::InsertFailed {
                table,
                row_index,
                message,
                sql_preview,
                source,
            } => SeedError::InsertFailed {
                table,
                row_index: row_index + offset,
                message,
                sql_preview,
                source,
            },
            other => other,
        }
    }
}

fn toggle_verb(enabled: &bool) -> &'static str {
    if *enabled {
        "restore"
    } else {
        "suspend"
    }
}

pub type Result<T> = std::result::Result<T, SeedError>;
