use std::borrow::Cow;

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Connection, Row};

use crate::backend::sql::{build_insert, quote_identifier, sanitize_url, truncate_sql};
use crate::backend::{ColumnRecord, ForeignKeyRecord, SchemaBackend};
use crate::error::{Result, SeedError};
use crate::generate::value::Value;
use crate::schema::types::{Column, DataType, DatabaseType, TypeCategory};

const DB: DatabaseType = DatabaseType::SQLite;

pub struct SqliteBackend {
    conn: SqliteConnection,
    schema_name: String,
}

impl SqliteBackend {
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = SqliteConnection::connect(url)
            .await
            .map_err(|e| SeedError::Connection {
                message: "Failed to open SQLite database".to_string(),
                connection_hint: sanitize_url(url),
                source: e,
            })?;
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: SqliteConnection) -> Self {
        Self {
            conn,
            schema_name: "main".to_string(),
        }
    }

    async fn table_names(&mut self) -> Result<Vec<String>> {
        let query = "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
        let rows = sqlx::query(query)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| SeedError::Introspection {
                query: "fetch tables".to_string(),
                source: e,
            })?;

        rows.iter()
            .map(|row| row.try_get("name"))
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(|e| SeedError::Introspection {
                query: "fetch tables".to_string(),
                source: e,
            })
    }
}

impl SchemaBackend for SqliteBackend {
    fn database_type(&self) -> DatabaseType {
        DB
    }

    fn schema_name(&self) -> &str {
        &self.schema_name
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        self.table_names().await
    }

    async fn describe_columns(&mut self) -> Result<Vec<ColumnRecord>> {
        let mut records = Vec::new();
        for table in self.table_names().await? {
            let query = format!("PRAGMA table_info({})", quote_identifier(&table, &DB));
            let rows = sqlx::query(&query)
                .fetch_all(&mut self.conn)
                .await
                .map_err(|e| SeedError::Introspection {
                    query: format!("PRAGMA table_info({})", table),
                    source: e,
                })?;

            for row in &rows {
                let decoded = (|| -> std::result::Result<ColumnRecord, sqlx::Error> {
                    let type_str: String = row.try_get("type")?;
                    let notnull: i64 = row.try_get("notnull")?;
                    let pk: i64 = row.try_get("pk")?;
                    Ok(ColumnRecord {
                        table: table.clone(),
                        column: row.try_get("name")?,
                        max_length: declared_length(&type_str),
                        data_type: base_type(&type_str),
                        nullable: notnull == 0 && pk == 0,
                        is_primary_key: pk > 0,
                    })
                })();
                records.push(decoded.map_err(|e| SeedError::Introspection {
                    query: format!("PRAGMA table_info({})", table),
                    source: e,
                })?);
            }
        }
        Ok(records)
    }

    async fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKeyRecord>> {
        let mut records = Vec::new();
        for table in self.table_names().await? {
            let query = format!("PRAGMA foreign_key_list({})", quote_identifier(&table, &DB));
            let rows = sqlx::query(&query)
                .fetch_all(&mut self.conn)
                .await
                .map_err(|e| SeedError::Introspection {
                    query: format!("PRAGMA foreign_key_list({})", table),
                    source: e,
                })?;

            for row in &rows {
                let decoded = (|| -> std::result::Result<ForeignKeyRecord, sqlx::Error> {
                    Ok(ForeignKeyRecord {
                        table: table.clone(),
                        column: row.try_get("from")?,
                        referenced_table: row.try_get("table")?,
                        // NULL "to" means the referenced table's primary key;
                        // resolved to "id" which covers the usual rowid alias.
                        referenced_column: row
                            .try_get::<Option<String>, _>("to")?
                            .unwrap_or_else(|| "id".to_string()),
                    })
                })();
                records.push(decoded.map_err(|e| SeedError::Introspection {
                    query: format!("PRAGMA foreign_key_list({})", table),
                    source: e,
                })?);
            }
        }
        Ok(records)
    }

    async fn set_constraint_enforcement(&mut self, enabled: bool) -> Result<()> {
        let sql = if enabled {
            "PRAGMA foreign_keys = ON"
        } else {
            "PRAGMA foreign_keys = OFF"
        };
        sqlx::query(sql)
            .execute(&mut self.conn)
            .await
            .map_err(|e| SeedError::ConstraintToggle { enabled, source: e })?;
        Ok(())
    }

    async fn sample_values(
        &mut self,
        table: &str,
        column: &Column,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let category = column.data_type.category();
        let col = quote_identifier(&column.name, &DB);
        let sql = format!(
            "SELECT DISTINCT {col} AS v FROM {table} WHERE {col} IS NOT NULL ORDER BY RANDOM() LIMIT ?",
            col = col,
            table = quote_identifier(table, &DB),
        );

        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| SeedError::Query {
                message: format!("Failed to sample {}.{}", table, column.name),
                source: e,
            })?;

        rows.iter()
            .map(|row| decode_sample(row, category))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SeedError::Query {
                message: format!("Failed to decode sample of {}.{}", table, column.name),
                source: e,
            })
    }

    async fn max_primary_key_value(&mut self, table: &str, column: &str) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT MAX(CAST({} AS INTEGER)) AS max_id FROM {}",
            quote_identifier(column, &DB),
            quote_identifier(table, &DB)
        );
        sqlx::query(&sql)
            .fetch_one(&mut self.conn)
            .await
            .and_then(|row| row.try_get::<Option<i64>, _>("max_id"))
            .map_err(|e| SeedError::Query {
                message: format!("Failed to read max key of {}.{}", table, column),
                source: e,
            })
    }

    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64> {
        let stmt = build_insert(&DB, &quote_identifier(table, &DB), columns, rows);
        let mut query = sqlx::query(&stmt.sql);
        for value in &stmt.params {
            query = bind_value(query, value);
        }
        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| SeedError::InsertFailed {
                table: table.to_string(),
                row_index: 0,
                message: "Batched INSERT failed".to_string(),
                sql_preview: truncate_sql(&stmt.sql, 200),
                source: e,
            })?;
        Ok(result.rows_affected())
    }
}

/// Strip a length suffix: `VARCHAR(40)` -> `VARCHAR`.
fn base_type(declared: &str) -> String {
    declared
        .split('(')
        .next()
        .unwrap_or(declared)
        .trim()
        .to_string()
}

/// Length from a declared type such as `VARCHAR(40)`.
fn declared_length(declared: &str) -> Option<i64> {
    let (_, rest) = declared.split_once('(')?;
    let inner = rest.split([')', ',']).next()?;
    inner.trim().parse().ok()
}

fn decode_sample(row: &SqliteRow, category: TypeCategory) -> std::result::Result<Value, sqlx::Error> {
    Ok(match category {
        TypeCategory::Integer => Value::Int(row.try_get("v")?),
        TypeCategory::Boolean => Value::Bool(row.try_get("v")?),
        TypeCategory::Decimal => Value::Float(row.try_get("v")?),
        TypeCategory::Date => {
            Value::String(Cow::Owned(row.try_get("v")?)).coerce_for(&DataType::Date)
        }
        TypeCategory::Time => {
            Value::String(Cow::Owned(row.try_get("v")?)).coerce_for(&DataType::Time)
        }
        TypeCategory::Timestamp => {
            Value::String(Cow::Owned(row.try_get("v")?)).coerce_for(&DataType::Timestamp)
        }
        TypeCategory::Uuid => {
            Value::String(Cow::Owned(row.try_get("v")?)).coerce_for(&DataType::Uuid)
        }
        TypeCategory::Text | TypeCategory::Json | TypeCategory::Unsupported => {
            Value::String(Cow::Owned(row.try_get("v")?))
        }
    })
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_ref()),
        Value::Timestamp(ts) => query.bind(*ts),
        Value::Date(d) => query.bind(*d),
        Value::Time(t) => query.bind(*t),
        Value::Uuid(u) => query.bind(u.hyphenated().to_string()),
        Value::Json(j) => query.bind(j.to_string()),
    }
}
