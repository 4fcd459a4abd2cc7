use crate::backend::SchemaBackend;
use crate::error::Result;
use crate::schema::types::{Column, DataType, DatabaseSchema, ForeignKeyRef, Table};

/// Assemble a `DatabaseSchema` from a backend's metadata listings.
///
/// Columns and foreign keys that point at tables outside the listed set are
/// skipped with a warning; the seeding engine can only order and populate
/// tables it knows about.
pub async fn introspect<B: SchemaBackend>(backend: &mut B) -> Result<DatabaseSchema> {
    let mut schema = DatabaseSchema::new(backend.database_type(), backend.schema_name().to_string());

    for name in backend.list_tables().await? {
        schema.tables.insert(name.clone(), Table::new(name));
    }

    for record in backend.describe_columns().await? {
        let Some(table) = schema.tables.get_mut(&record.table) else {
            continue;
        };
        let mut column = Column::new(
            record.column.clone(),
            DataType::from_raw(&record.data_type),
            record.data_type.clone(),
        );
        column.nullable = record.nullable;
        column.max_length = record
            .max_length
            .filter(|len| *len > 0)
            .map(|len| len.min(u32::MAX as i64) as u32);
        column.ordinal_position = table.columns.len() as u32 + 1;

        if record.is_primary_key {
            table.primary_key.push(record.column.clone());
        }
        table.columns.insert(record.column, column);
    }

    for fk in backend.list_foreign_keys().await? {
        let target_known = schema
            .tables
            .get(&fk.referenced_table)
            .is_some_and(|t| t.columns.contains_key(&fk.referenced_column));
        if !target_known {
            tracing::warn!(
                "Ignoring foreign key {}.{} -> {}.{}: referenced column is not in schema '{}'",
                fk.table,
                fk.column,
                fk.referenced_table,
                fk.referenced_column,
                schema.schema_name
            );
            continue;
        }
        let Some(table) = schema.tables.get_mut(&fk.table) else {
            continue;
        };
        if !table.columns.contains_key(&fk.column) {
            tracing::warn!(
                "Ignoring foreign key on unknown column {}.{}",
                fk.table,
                fk.column
            );
            continue;
        }
        table.foreign_keys.insert(
            fk.column,
            ForeignKeyRef {
                table: fk.referenced_table,
                column: fk.referenced_column,
            },
        );
    }

    tracing::debug!(
        "Introspected {} tables, {} columns, {} foreign keys",
        schema.table_count(),
        schema.column_count(),
        schema.foreign_key_count()
    );

    Ok(schema)
}
