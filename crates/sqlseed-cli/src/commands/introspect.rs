use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};

use sqlseed_core::classify::classify_text_column;
use sqlseed_core::schema::introspect::introspect;
use sqlseed_core::schema::types::{DatabaseSchema, Table, TypeCategory};

use crate::args::{IntrospectArgs, IntrospectFormat};

pub async fn run(args: &IntrospectArgs) -> Result<()> {
    let config = super::load_config(&args.connection)?;
    let mut backend = super::connect(&config).await?;
    let schema = introspect(&mut backend).await?;

    match args.format {
        IntrospectFormat::Json => {
            let json = serde_json::to_string_pretty(&schema)?;
            println!("{}", json);
        }
        IntrospectFormat::Table => print_tables(&schema),
    }

    Ok(())
}

fn print_tables(schema: &DatabaseSchema) {
    println!(
        "Database: {} (schema {})",
        schema.database_type, schema.schema_name
    );
    println!(
        "Tables: {}  Columns: {}  Foreign Keys: {}",
        schema.table_count(),
        schema.column_count(),
        schema.foreign_key_count()
    );
    println!();

    for (table_name, table) in &schema.tables {
        println!("━━━ {} ━━━", table_name);
        println!("{}", column_table(table));
        println!();
    }
}

fn column_table(table: &Table) -> ComfyTable {
    let mut t = ComfyTable::new();
    t.set_header(vec!["Column", "Type", "Nullable", "PK", "FK", "Generator"]);

    for (col_name, column) in &table.columns {
        let is_pk = table.is_primary_key(col_name);
        let fk = table.foreign_key(col_name);
        let generator = match (fk, column.data_type.category()) {
            (Some(_), _) => "reference".to_string(),
            (None, _) if is_pk => "key".to_string(),
            (None, TypeCategory::Text) => format!("{:?}", classify_text_column(col_name)),
            (None, TypeCategory::Unsupported) => "null".to_string(),
            (None, category) => format!("{:?}", category),
        };
        let length = column
            .max_length
            .map(|len| format!("({})", len))
            .unwrap_or_default();

        t.add_row(vec![
            Cell::new(col_name),
            Cell::new(format!("{}{}", column.data_type, length)),
            Cell::new(if column.nullable { "YES" } else { "NO" }),
            Cell::new(if is_pk { "PK" } else { "" }),
            Cell::new(fk.map(|r| format!("→ {}", r)).unwrap_or_default()),
            Cell::new(generator),
        ]);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlseed_testutil::customers_orders_schema;

    #[test]
    fn test_column_table_marks_keys_and_generators() {
        let schema = customers_orders_schema();
        let rendered = column_table(&schema.tables["orders"]).to_string();
        assert!(rendered.contains("→ customers.id"));
        assert!(rendered.contains("reference"));
        assert!(rendered.contains("PK"));

        let rendered = column_table(&schema.tables["customers"]).to_string();
        assert!(rendered.contains("Email"));
        assert!(rendered.contains("FullName"));
    }
}
