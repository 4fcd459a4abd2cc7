use std::borrow::Cow;

use sqlx::postgres::{PgArguments, PgConnection, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Connection, Row};

use crate::backend::sql::{build_insert, qualified_table, quote_identifier, sanitize_url, truncate_sql};
use crate::backend::{ColumnRecord, ForeignKeyRecord, SchemaBackend};
use crate::error::{Result, SeedError};
use crate::generate::value::Value;
use crate::schema::types::{Column, DatabaseType, TypeCategory};

const DB: DatabaseType = DatabaseType::PostgreSQL;

pub struct PostgresBackend {
    conn: PgConnection,
    schema_name: String,
}

impl PostgresBackend {
    pub async fn connect(url: &str, schema_name: Option<&str>) -> Result<Self> {
        let conn = PgConnection::connect(url)
            .await
            .map_err(|e| SeedError::Connection {
                message: "Failed to connect to PostgreSQL".to_string(),
                connection_hint: sanitize_url(url),
                source: e,
            })?;
        Ok(Self::with_connection(
            conn,
            schema_name.unwrap_or("public").to_string(),
        ))
    }

    pub fn with_connection(conn: PgConnection, schema_name: String) -> Self {
        Self { conn, schema_name }
    }

    fn table_ref(&self, table: &str) -> String {
        qualified_table(Some(&self.schema_name), table, &DB)
    }
}

fn introspection_err(query: &str) -> impl FnOnce(sqlx::Error) -> SeedError + '_ {
    move |e| SeedError::Introspection {
        query: query.to_string(),
        source: e,
    }
}

impl SchemaBackend for PostgresBackend {
    fn database_type(&self) -> DatabaseType {
        DB
    }

    fn schema_name(&self) -> &str {
        &self.schema_name
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let query = "SELECT table_name::text AS table_name FROM information_schema.tables WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name";
        let rows = sqlx::query(query)
            .bind(&self.schema_name)
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
                c.table_name::text AS table_name,
                c.column_name::text AS column_name,
                c.data_type::text AS data_type,
                c.character_maximum_length::int8 AS max_length,
                c.is_nullable::text AS is_nullable,
                EXISTS (
                    SELECT 1
                    FROM information_schema.table_constraints tc
                    JOIN information_schema.key_column_usage kcu
                        ON tc.constraint_name = kcu.constraint_name
                        AND tc.table_schema = kcu.table_schema
                        AND tc.table_name = kcu.table_name
                    WHERE tc.constraint_type = 'PRIMARY KEY'
                        AND tc.table_schema = c.table_schema
                        AND tc.table_name = c.table_name
                        AND kcu.column_name = c.column_name
                ) AS is_primary_key
            FROM information_schema.columns c
            WHERE c.table_schema = $1
            ORDER BY c.table_name, c.ordinal_position
        "#;

        let rows = sqlx::query(query)
            .bind(&self.schema_name)
            .fetch_all(&mut self.conn)
            .await
            .map_err(introspection_err("fetch columns"))?;

        rows.iter()
            .map(|row| {
                let is_nullable: String = row.try_get("is_nullable")?;
                Ok(ColumnRecord {
                    table: row.try_get("table_name")?,
                    column: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    max_length: row.try_get("max_length")?,
                    nullable: is_nullable == "YES",
                    is_primary_key: row.try_get("is_primary_key")?,
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(introspection_err("fetch columns"))
    }

    async fn list_foreign_keys(&mut self) -> Result<Vec<ForeignKeyRecord>> {
        // pg_constraint keeps column pairs aligned; information_schema does not
        // for multi-column keys.
        let query = r#"
            SELECT
                src.relname::text AS table_name,
                sa.attname::text AS column_name,
                tgt.relname::text AS referenced_table,
                ta.attname::text AS referenced_column
            FROM pg_constraint con
            JOIN pg_class src ON src.oid = con.conrelid
            JOIN pg_namespace ns ON ns.oid = src.relnamespace
            JOIN pg_class tgt ON tgt.oid = con.confrelid
            CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(src_attnum, tgt_attnum)
            JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_attnum
            JOIN pg_attribute ta ON ta.attrelid = con.confrelid AND ta.attnum = k.tgt_attnum
            WHERE con.contype = 'f' AND ns.nspname = $1
            ORDER BY src.relname, con.conname
        "#;

        let rows = sqlx::query(query)
            .bind(&self.schema_name)
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
        // Replica mode skips FK triggers for this session; needs superuser.
        let sql = if enabled {
            "SET session_replication_role = 'origin'"
        } else {
            "SET session_replication_role = 'replica'"
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
            "SELECT v FROM (SELECT DISTINCT {col}{cast} AS v FROM {table} WHERE {col} IS NOT NULL) d ORDER BY RANDOM() LIMIT $1",
            col = col,
            cast = sample_cast(category),
            table = self.table_ref(table),
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
            "SELECT MAX({})::int8 AS max_id FROM {}",
            quote_identifier(column, &DB),
            self.table_ref(table)
        );
        let row = sqlx::query(&sql)
            .fetch_one(&mut self.conn)
            .await
            .and_then(|row| row.try_get::<Option<i64>, _>("max_id"))
            .map_err(|e| SeedError::Query {
                message: format!("Failed to read max key of {}.{}", table, column),
                source: e,
            })?;
        Ok(row)
    }

    async fn execute_batch_insert(
        &mut self,
        table: &str,
        columns: &[Column],
        rows: &[Vec<Value>],
    ) -> Result<u64> {
        let stmt = build_insert(&DB, &self.table_ref(table), columns, rows);
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

fn sample_cast(category: TypeCategory) -> &'static str {
    match category {
        TypeCategory::Integer => "::int8",
        TypeCategory::Decimal => "::float8",
        TypeCategory::Boolean => "::boolean",
        TypeCategory::Date => "::date",
        TypeCategory::Time => "::time",
        TypeCategory::Timestamp => "::timestamp",
        TypeCategory::Uuid => "::uuid",
        TypeCategory::Text | TypeCategory::Json | TypeCategory::Unsupported => "::text",
    }
}

fn decode_sample(row: &PgRow, category: TypeCategory) -> std::result::Result<Value, sqlx::Error> {
    Ok(match category {
        TypeCategory::Integer => Value::Int(row.try_get("v")?),
        TypeCategory::Decimal => Value::Float(row.try_get("v")?),
        TypeCategory::Boolean => Value::Bool(row.try_get("v")?),
        TypeCategory::Date => Value::Date(row.try_get("v")?),
        TypeCategory::Time => Value::Time(row.try_get("v")?),
        TypeCategory::Timestamp => Value::Timestamp(row.try_get("v")?),
        TypeCategory::Uuid => Value::Uuid(row.try_get("v")?),
        TypeCategory::Text | TypeCategory::Json | TypeCategory::Unsupported => {
            Value::String(Cow::Owned(row.try_get("v")?))
        }
    })
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_ref()),
        Value::Timestamp(ts) => query.bind(*ts),
        Value::Date(d) => query.bind(*d),
        Value::Time(t) => query.bind(*t),
        Value::Uuid(u) => query.bind(*u),
        Value::Json(j) => query.bind(sqlx::types::Json(j)),
    }
}
