pub mod memory;

pub use memory::{BatchRecord, MemoryBackend, Row};

use sqlseed_core::schema::types::*;

/// Build a column from its raw SQL type, the way introspection would.
pub fn column(name: &str, raw_type: &str) -> Column {
    Column::new(
        name.to_string(),
        DataType::from_raw(raw_type),
        raw_type.to_string(),
    )
}

/// A NOT NULL column.
pub fn required(name: &str, raw_type: &str) -> Column {
    let mut c = column(name, raw_type);
    c.nullable = false;
    c
}

/// A text column with a declared maximum length.
pub fn varchar(name: &str, max_length: u32) -> Column {
    let mut c = column(name, "character varying");
    c.max_length = Some(max_length);
    c
}

fn table(name: &str, columns: Vec<Column>) -> Table {
    let mut t = Table::new(name.to_string());
    for c in columns {
        t.columns.insert(c.name.clone(), c);
    }
    t
}

fn with_fk(mut table: Table, column: &str, target_table: &str, target_column: &str) -> Table {
    table.foreign_keys.insert(
        column.to_string(),
        ForeignKeyRef {
            table: target_table.to_string(),
            column: target_column.to_string(),
        },
    );
    table
}

fn with_pk(mut table: Table, column: &str) -> Table {
    table.primary_key.push(column.to_string());
    table
}

fn schema(tables: Vec<Table>) -> DatabaseSchema {
    let mut s = DatabaseSchema::new(DatabaseType::PostgreSQL, "public".to_string());
    for t in tables {
        s.tables.insert(t.name.clone(), t);
    }
    s
}

/// customers(id, name, email, age, tier) ← orders(id, customer_id, total, note, created_at).
///
/// `orders` is listed first so ordering has to come from the foreign key.
pub fn customers_orders_schema() -> DatabaseSchema {
    let customers = with_pk(
        table(
            "customers",
            vec![
                required("id", "integer"),
                varchar("name", 40),
                varchar("email", 100),
                column("age", "integer"),
                varchar("tier", 10),
            ],
        ),
        "id",
    );

    let orders = with_fk(
        with_pk(
            table(
                "orders",
                vec![
                    required("id", "integer"),
                    required("customer_id", "integer"),
                    column("total", "numeric"),
                    varchar("note", 10),
                    column("created_at", "timestamp without time zone"),
                ],
            ),
            "id",
        ),
        "customer_id",
        "customers",
        "id",
    );

    schema(vec![orders, customers])
}

/// A six-table store: users, categories, products, orders, order_items, reviews.
pub fn ecommerce_schema() -> DatabaseSchema {
    let users = with_pk(
        table(
            "users",
            vec![
                required("id", "bigint"),
                required("email", "character varying"),
                varchar("full_name", 100),
                column("is_active", "boolean"),
                column("created_at", "timestamp with time zone"),
            ],
        ),
        "id",
    );
    let categories = with_fk(
        with_pk(
            table(
                "categories",
                vec![
                    required("id", "integer"),
                    varchar("name", 50),
                    column("parent_id", "integer"),
                ],
            ),
            "id",
        ),
        "parent_id",
        "categories",
        "id",
    );
    let products = with_fk(
        with_pk(
            table(
                "products",
                vec![
                    required("id", "integer"),
                    required("category_id", "integer"),
                    varchar("description", 255),
                    column("price", "numeric"),
                    column("attributes", "jsonb"),
                ],
            ),
            "id",
        ),
        "category_id",
        "categories",
        "id",
    );
    let orders = with_fk(
        with_pk(
            table(
                "orders",
                vec![
                    required("id", "integer"),
                    required("user_id", "bigint"),
                    column("ordered_on", "date"),
                    varchar("shipping_address", 200),
                ],
            ),
            "id",
        ),
        "user_id",
        "users",
        "id",
    );
    let order_items = with_fk(
        with_fk(
            with_pk(
                table(
                    "order_items",
                    vec![
                        required("id", "uuid"),
                        required("order_id", "integer"),
                        required("product_id", "integer"),
                        column("quantity", "smallint"),
                    ],
                ),
                "id",
            ),
            "order_id",
            "orders",
            "id",
        ),
        "product_id",
        "products",
        "id",
    );
    let reviews = with_fk(
        with_fk(
            with_pk(
                table(
                    "reviews",
                    vec![
                        required("id", "integer"),
                        required("user_id", "bigint"),
                        required("product_id", "integer"),
                        column("review", "text"),
                        column("posted_at", "time"),
                    ],
                ),
                "id",
            ),
            "user_id",
            "users",
            "id",
        ),
        "product_id",
        "products",
        "id",
    );

    schema(vec![reviews, order_items, orders, products, categories, users])
}

/// employees.manager_id → employees.id, nullable.
pub fn self_referencing_schema() -> DatabaseSchema {
    let employees = with_fk(
        with_pk(
            table(
                "employees",
                vec![
                    required("id", "integer"),
                    varchar("name", 80),
                    column("manager_id", "integer"),
                ],
            ),
            "id",
        ),
        "manager_id",
        "employees",
        "id",
    );
    schema(vec![employees])
}

/// categories(id, name, parent_id → categories.id) ← products(id, category_id, name).
///
/// `products` is listed first; its parent references itself.
pub fn category_tree_schema() -> DatabaseSchema {
    let categories = with_fk(
        with_pk(
            table(
                "categories",
                vec![
                    required("id", "integer"),
                    varchar("name", 50),
                    column("parent_id", "integer"),
                ],
            ),
            "id",
        ),
        "parent_id",
        "categories",
        "id",
    );
    let products = with_fk(
        with_pk(
            table(
                "products",
                vec![
                    required("id", "integer"),
                    required("category_id", "integer"),
                    varchar("name", 80),
                ],
            ),
            "id",
        ),
        "category_id",
        "categories",
        "id",
    );
    schema(vec![products, categories])
}

/// authors.featured_book_id → books.id and books.author_id → authors.id.
pub fn circular_schema() -> DatabaseSchema {
    let authors = with_fk(
        with_pk(
            table(
                "authors",
                vec![
                    required("id", "integer"),
                    varchar("name", 80),
                    column("featured_book_id", "integer"),
                ],
            ),
            "id",
        ),
        "featured_book_id",
        "books",
        "id",
    );
    let books = with_fk(
        with_pk(
            table(
                "books",
                vec![
                    required("id", "integer"),
                    required("author_id", "integer"),
                    varchar("title", 120),
                ],
            ),
            "id",
        ),
        "author_id",
        "authors",
        "id",
    );
    schema(vec![authors, books])
}

/// One table with `columns` integer columns, for batch-width tests.
pub fn wide_schema(columns: usize) -> DatabaseSchema {
    let cols = (0..columns)
        .map(|i| column(&format!("c{}", i), "integer"))
        .collect();
    schema(vec![table("wide", cols)])
}
