//! # Schema Backends
//!
//! `SchemaBackend` is the capability every supported database provides to the
//! seeding engine: metadata listing, referential-integrity toggling, value
//! sampling, key lookup and batched inserts. The engine is written against the
//! trait only; `factory::connect` picks the concrete implementation from the
//! configured discriminator.
//!
//! Each backend owns a single connection rather than a pool so that session
//! settings (such as disabled foreign key checks) apply to the inserts that
//! follow them.

pub mod factory;
pub mod mysql;
pub mod postgres;
pub mod sql;
pub mod sqlite;

use std::future::Future;

use crate::error::Result;
use crate::generate::value::Value;
use crate::schema::types::{Column, DatabaseType};

/// One row of column metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRecord {
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub max_length: Option<i64>,
    pub nullable: bool,
    pub is_primary_key: bool,
}

/// One single-column foreign key edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyRecord {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Operations the seeding engine needs from a database.
pub trait SchemaBackend: Send {
    fn database_type(&self) -> DatabaseType;

    /// Schema (or database) name being seeded.
    fn schema_name(&self) -> &str;

    /// Maximum bound parameters allowed in one statement.
    fn max_parameters(&self) -> usize {
        self.database_type().max_parameters()
    }

    /// Base table names in discovery order.
    fn list_tables(&mut self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Column metadata for every table, ordered by table then ordinal.
    fn describe_columns(&mut self) -> impl Future<Output = Result<Vec<ColumnRecord>>> + Send;

    fn list_foreign_keys(
        &mut self,
    ) -> impl Future<Output = Result<Vec<ForeignKeyRecord>>> + Send;

    /// Suspend (`false`) or restore (`true`) referential-integrity checks.
    fn set_constraint_enforcement(
        &mut self,
        enabled: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Up to `limit` distinct non-null values of `column`, in random order.
    fn sample_values(
        &mut self,
        table: &str,
        column: &Column,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Largest stored value of an integer key column, `None` for an empty table.
    fn max_primary_key_value(
        &mut self,
        table: &str,
        column: &str,
    ) -> impl Future<Output = Result<Option<i64>>> + Send;

    /// Insert `rows` (each aligned with `columns`) in one statement and return
    /// the number of rows affected.
    fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> impl Future<Output = Result<u64>> + Send;
}
