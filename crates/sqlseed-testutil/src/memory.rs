//! In-memory `SchemaBackend` used by the integration tests.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use sqlseed_core::backend::{ColumnRecord, ForeignKeyRecord, SchemaBackend};
use sqlseed_core::generate::value::Value;
use sqlseed_core::schema::types::{Column, DatabaseSchema, DatabaseType};
use sqlseed_core::{CancelFlag, Result, SeedError};

/// A stored row, keyed by column name.
pub type Row = IndexMap<String, Value>;

/// One executed insert statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
}

/// Backend that keeps rows in memory and records every call the engine makes.
pub struct MemoryBackend {
    schema: DatabaseSchema,
    max_parameters: usize,
    rows: HashMap<String, Vec<Row>>,
    /// Every `set_constraint_enforcement` argument, in call order.
    pub toggles: Vec<bool>,
    pub batches: Vec<BatchRecord>,
    /// Tables whose n-th insert (0-based) fails.
    fail_inserts: HashMap<String, usize>,
    fail_samples: HashSet<String>,
    fail_restore: bool,
    /// Cancel the flag once this many batches have been inserted.
    cancel_after: Option<(CancelFlag, usize)>,
}

impl MemoryBackend {
    pub fn new(schema: DatabaseSchema) -> Self {
        let max_parameters = schema.database_type.max_parameters();
        Self {
            schema,
            max_parameters,
            rows: HashMap::new(),
            toggles: Vec::new(),
            batches: Vec::new(),
            fail_inserts: HashMap::new(),
            fail_samples: HashSet::new(),
            fail_restore: false,
            cancel_after: None,
        }
    }

    pub fn with_max_parameters(mut self, max_parameters: usize) -> Self {
        self.max_parameters = max_parameters;
        self
    }

    /// Store rows as if they existed before the run.
    pub fn with_rows(mut self, table: &str, rows: Vec<Vec<(&str, Value)>>) -> Self {
        let stored = self.rows.entry(table.to_string()).or_default();
        for row in rows {
            stored.push(
                row.into_iter()
                    .map(|(column, value)| (column.to_string(), value))
                    .collect(),
            );
        }
        self
    }

    pub fn fail_insert(mut self, table: &str, nth_batch: usize) -> Self {
        self.fail_inserts.insert(table.to_string(), nth_batch);
        self
    }

    pub fn fail_sample(mut self, table: &str) -> Self {
        self.fail_samples.insert(table.to_string());
        self
    }

    pub fn fail_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn cancel_after(mut self, flag: CancelFlag, batches: usize) -> Self {
        self.cancel_after = Some((flag, batches));
        self
    }

    pub fn rows(&self, table: &str) -> &[Row] {
        self.rows.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// All stored values of one column, in insertion order.
    pub fn column_values(&self, table: &str, column: &str) -> Vec<Value> {
        self.rows(table)
            .iter()
            .filter_map(|row| row.get(column).cloned())
            .collect()
    }

    fn batches_for(&self, table: &str) -> usize {
        self.batches.iter().filter(|b| b.table == table).count()
    }
}

impl SchemaBackend for MemoryBackend {
    fn database_type(&self) -> DatabaseType {
        self.schema.database_type
    }

    fn schema_name(&self) -> &str {
        &self.schema.schema_name
    }

    fn max_parameters(&self) -> usize {
        self.max_parameters
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.schema.tables.keys().cloned().collect())
    }

    async fn describe_columns(&mut self) -> Result<Vec<ColumnRecord>> {
        let mut records = Vec::new();
        for table in self.schema.tables.values() {
            for column in table.columns.values() {
                records.push(ColumnRecord {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    data_type: column.raw_type.clone(),
                    max_length: column.max_length.map(i64::from),
                    nullable: column.nullable,
                    is_primary_key: table.is_primary_key(&column.name),
                });
            }
        }
        Ok(records)
    }

    async fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKeyRecord>> {
        let mut records = Vec::new();
        for table in self.schema.tables.values() {
            for (column, target) in &table.foreign_keys {
                records.push(ForeignKeyRecord {
                    table: table.name.clone(),
                    column: column.clone(),
                    referenced_table: target.table.clone(),
                    referenced_column: target.column.clone(),
                });
            }
        }
        Ok(records)
    }

    async fn set_constraint_enforcement(&mut self, enabled: bool) -> Result<()> {
        self.toggles.push(enabled);
        if enabled && self.fail_restore {
            return Err(SeedError::Other("restore refused".to_string()));
        }
        Ok(())
    }

    async fn sample_values(
        &mut self,
        table: &str,
        column: &Column,
        limit: usize,
    ) -> Result<Vec<Value>> {
        if self.fail_samples.contains(table) {
            return Err(SeedError::Other(format!("sampling {} refused", table)));
        }
        let mut seen = Vec::new();
        for value in self.column_values(table, &column.name) {
            if !value.is_null() && !seen.contains(&value) {
                seen.push(value);
            }
            if seen.len() == limit {
                break;
            }
        }
        Ok(seen)
    }

    async fn max_primary_key_value(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        Ok(self
            .column_values(table, column)
            .iter()
            .filter_map(Value::as_int)
            .max())
    }

    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64> {
        if self.fail_inserts.get(table) == Some(&self.batches_for(table)) {
            return Err(SeedError::Other(format!("insert into {} refused", table)));
        }
        if rows.len() * columns.len() >= self.max_parameters {
            return Err(SeedError::Other(format!(
                "{} parameters exceed the limit of {}",
                rows.len() * columns.len(),
                self.max_parameters
            )));
        }

        let stored = self.rows.entry(table.to_string()).or_default();
        for row in rows {
            stored.push(
                columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(row.iter().cloned())
                    .collect(),
            );
        }
        self.batches.push(BatchRecord {
            table: table.to_string(),
            rows: rows.len(),
            columns: columns.len(),
        });

        if let Some((flag, after)) = &self.cancel_after {
            if self.batches.len() >= *after {
                flag.cancel();
            }
        }
        Ok(rows.len() as u64)
    }
}
