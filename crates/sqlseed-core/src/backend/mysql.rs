use std::borrow::Cow;

use sqlx::mysql::{MySql, MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Connection, Row};

use crate::backend::sql::{build_insert, quote_identifier, sanitize_url, truncate_sql};
use crate::backend::{ColumnRecord, ForeignKeyRecord, SchemaBackend};
use crate::error::{Result, SeedError};
use crate::generate::value::Value;
use crate::schema::types::{Column, DataType, DatabaseType, TypeCategory};

const DB: DatabaseType = DatabaseType::MySQL;

/// MySQL / MariaDB backend. The "schema" is the connected database.
pub struct MySqlBackend {
    conn: MySqlConnection,
    database_name: String,
}

impl MySqlBackend {
    pub async fn connect(url: &str, database_name: String) -> Result<Self> {
        let conn = MySqlConnection::connect(url)
            .await
            .map_err(|e| SeedError::Connection {
                message: "Failed to connect to MySQL".to_string(),
                connection_hint: sanitize_url(url),
                source: e,
            })?;
        Ok(Self::with_connection(conn, database_name))
    }

    pub fn with_connection(conn: MySqlConnection, database_name: String) -> Self {
        Self {
            conn,
            database_name,
        }
    }
}

fn introspection_err(query: &str) -> impl FnOnce(sqlx::Error) -> SeedError + '_ {
    move |e| SeedError::Introspection {
        query: query.to_string(),
        source: e,
    }
}

impl SchemaBackend for MySqlBackend {
    fn database_type(&self) -> DatabaseType {
        DB
    }

    fn schema_name(&self) -> &str {
        &self.database_name
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let query = "SELECT CAST(TABLE_NAME AS CHAR) AS table_name FROM information_schema.TABLES WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";
        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(introspection_err("fetch tables"))?;

        rows.iter()
            .map(|row| row.try_get("table_name"))
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(introspection_err("fetch tables"))
    }

    async fn describe_columns(&mut self) -> Result<Vec<ColumnRecord>> {
        let query = r#"
            SELECT
                CAST(TABLE_NAME AS CHAR) AS table_name,
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(DATA_TYPE AS CHAR) AS data_type,
                CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS max_length,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable,
                CAST(COLUMN_KEY AS CHAR) AS column_key
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = ?
            ORDER BY TABLE_NAME, ORDINAL_POSITION
        "#;

        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(introspection_err("fetch columns"))?;

        rows.iter()
            .map(|row| {
                let is_nullable: String = row.try_get("is_nullable")?;
                let column_key: String = row.try_get("column_key")?;
                Ok(ColumnRecord {
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    max_length: row.try_get("max_length")?,
                    nullable: is_nullable == "YES",
                    is_primary_key: column_key == "PRI",
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(introspection_err("fetch columns"))
    }

    async fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKeyRecord>> {
        let query = r#"
            SELECT
                CAST(TABLE_NAME AS CHAR) AS table_name,
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(REFERENCED_TABLE_NAME AS CHAR) AS referenced_table,
                CAST(REFERENCED_COLUMN_NAME AS CHAR) AS referenced_column
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = ?
                AND REFERENCED_TABLE_NAME IS NOT NULL
                AND CONSTRAINT_NAME <> 'PRIMARY'
            ORDER BY TABLE_NAME, CONSTRAINT_NAME, ORDINAL_POSITION
        "#;

        let rows = sqlx::query(query)
            .bind(&self.database_name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(introspection_err("fetch foreign keys"))?;

        rows.iter()
            .map(|row| {
                Ok(ForeignKeyRecord {
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    referenced_table: row.try_get("referenced_table")?,
                    referenced_column: row.try_get("referenced_column")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(introspection_err("fetch foreign keys"))
    }

    async fn set_constraint_enforcement(&mut self, enabled: bool) -> Result<()> {
        let sql = if enabled {
            "SET FOREIGN_KEY_CHECKS = 1"
        } else {
            "SET FOREIGN_KEY_CHECKS = 0"
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
            "SELECT {expr} AS v FROM (SELECT DISTINCT {col} AS v FROM {table} WHERE {col} IS NOT NULL) d ORDER BY RAND() LIMIT ?",
            expr = sample_expression(category),
            col = col,
            table = quote_identifier(table, &DB),
        );

        let rows = sqlx::query(&sql)
            .bind(limit as u64)
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
            "SELECT CAST(MAX({}) AS SIGNED) AS max_id FROM {}",
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

fn sample_expression(category: TypeCategory) -> &'static str {
    match category {
        TypeCategory::Integer | TypeCategory::Boolean => "CAST(v AS SIGNED)",
        TypeCategory::Decimal => "CAST(v AS DOUBLE)",
        TypeCategory::Date => "CAST(v AS DATE)",
        TypeCategory::Time => "CAST(v AS TIME)",
        TypeCategory::Timestamp => "CAST(v AS DATETIME)",
        TypeCategory::Text | TypeCategory::Uuid | TypeCategory::Json | TypeCategory::Unsupported => {
            "CAST(v AS CHAR)"
        }
    }
}

fn decode_sample(row: &MySqlRow, category: TypeCategory) -> std::result::Result<Value, sqlx::Error> {
    Ok(match category {
        TypeCategory::Integer => Value::Int(row.try_get("v")?),
        TypeCategory::Boolean => Value::Bool(row.try_get::<i64, _>("v")? != 0),
        TypeCategory::Decimal => Value::Float(row.try_get("v")?),
        TypeCategory::Date => Value::Date(row.try_get("v")?),
        TypeCategory::Time => Value::Time(row.try_get("v")?),
        TypeCategory::Timestamp => Value::Timestamp(row.try_get("v")?),
        TypeCategory::Uuid => {
            Value::String(Cow::Owned(row.try_get("v")?)).coerce_for(&DataType::Uuid)
        }
        TypeCategory::Text | TypeCategory::Json | TypeCategory::Unsupported => {
            Value::String(Cow::Owned(row.try_get("v")?))
        }
    })
}

/// MySQL has no native UUID or JSON wire type; both are bound as text.
fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
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
