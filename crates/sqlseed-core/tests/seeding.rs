//! End-to-end seeding runs against the in-memory backend.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use indexmap::IndexMap;
use sqlseed_core::config::{RunConfig, TableFilter, TableOverride};
use sqlseed_core::generate::value::Value;
use sqlseed_core::{run, CancelFlag, SeedError, TableStatus};
use sqlseed_testutil::*;

fn overrides(entries: Vec<(&str, TableOverride)>) -> HashMap<String, TableOverride> {
    entries
        .into_iter()
        .map(|(name, o)| (name.to_string(), o))
        .collect()
}

fn rows(n: usize) -> TableOverride {
    TableOverride {
        rows: Some(n),
        values: IndexMap::new(),
    }
}

fn seeded(config: RunConfig) -> RunConfig {
    RunConfig {
        seed: Some(42),
        ..config
    }
}

fn ints(values: &[Value]) -> Vec<i64> {
    values.iter().map(|v| v.as_int().expect("integer")).collect()
}

#[tokio::test]
async fn test_customers_and_orders() {
    let mut backend = MemoryBackend::new(customers_orders_schema());
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(10)), ("orders", rows(5))]),
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    let order: Vec<&str> = report.tables.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["customers", "orders"]);
    assert!(report.is_success());
    assert_eq!(report.tables["customers"].rows_inserted, 10);
    assert_eq!(report.tables["orders"].rows_inserted, 5);

    let customer_ids = ints(&backend.column_values("customers", "id"));
    assert_eq!(customer_ids, (1..=10).collect::<Vec<_>>());

    for id in ints(&backend.column_values("orders", "customer_id")) {
        assert!((1..=10).contains(&id), "customer_id {} out of range", id);
    }
}

#[tokio::test]
async fn test_default_row_count_applies_to_every_table() {
    let mut backend = MemoryBackend::new(customers_orders_schema());
    let config = seeded(RunConfig {
        default_rows: 7,
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    assert_eq!(backend.rows("customers").len(), 7);
    assert_eq!(backend.rows("orders").len(), 7);
    assert_eq!(report.total_rows_inserted(), 14);
}

#[tokio::test]
async fn test_every_parent_populated_before_child() {
    let schema = ecommerce_schema();
    let mut backend = MemoryBackend::new(schema.clone());
    let config = seeded(RunConfig {
        default_rows: 20,
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();
    assert!(report.is_success(), "{}", report.summary());

    let position: HashMap<&str, usize> = report
        .tables
        .keys()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();
    for (name, table) in &schema.tables {
        for target in table.foreign_keys.values() {
            if target.table != *name {
                assert!(position[target.table.as_str()] < position[name.as_str()]);
            }
        }
    }
}

#[tokio::test]
async fn test_foreign_keys_come_from_referenced_values() {
    let mut backend = MemoryBackend::new(ecommerce_schema());
    let config = seeded(RunConfig {
        default_rows: 30,
        ..Default::default()
    });
    run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    let user_ids: HashSet<i64> = ints(&backend.column_values("users", "id")).into_iter().collect();
    let order_ids: HashSet<i64> = ints(&backend.column_values("orders", "id")).into_iter().collect();
    let product_ids: HashSet<i64> =
        ints(&backend.column_values("products", "id")).into_iter().collect();

    for id in ints(&backend.column_values("orders", "user_id")) {
        assert!(user_ids.contains(&id));
    }
    for id in ints(&backend.column_values("order_items", "order_id")) {
        assert!(order_ids.contains(&id));
    }
    for id in ints(&backend.column_values("reviews", "product_id")) {
        assert!(product_ids.contains(&id));
    }
    for value in backend.column_values("order_items", "id") {
        assert!(matches!(value, Value::Uuid(_)));
    }
}

#[tokio::test]
async fn test_self_reference_on_empty_table_is_null() {
    let mut backend = MemoryBackend::new(self_referencing_schema());
    let config = seeded(RunConfig {
        default_rows: 5,
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(backend
        .column_values("employees", "manager_id")
        .iter()
        .all(Value::is_null));
}

#[tokio::test]
async fn test_self_reference_draws_from_existing_rows() {
    let mut backend = MemoryBackend::new(self_referencing_schema()).with_rows(
        "employees",
        vec![
            vec![("id", Value::Int(1)), ("manager_id", Value::Null)],
            vec![("id", Value::Int(2)), ("manager_id", Value::Int(1))],
        ],
    );
    let config = seeded(RunConfig {
        default_rows: 10,
        ..Default::default()
    });
    run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    let managers = backend.column_values("employees", "manager_id");
    for manager in &managers[2..] {
        let id = manager.as_int().expect("sampled manager");
        assert!(id == 1 || id == 2);
    }
}

#[tokio::test]
async fn test_self_referencing_parent_feeds_its_children() {
    let mut backend = MemoryBackend::new(category_tree_schema());
    let config = seeded(RunConfig {
        default_rows: 10,
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(report.tables["products"].rows_inserted, 10);

    let category_ids: HashSet<i64> = ints(&backend.column_values("categories", "id"))
        .into_iter()
        .collect();
    assert_eq!(category_ids, (1..=10).collect());
    for id in ints(&backend.column_values("products", "category_id")) {
        assert!(category_ids.contains(&id), "category_id {} was never inserted", id);
    }
}

#[tokio::test]
async fn test_self_referencing_parent_with_existing_rows() {
    let mut backend = MemoryBackend::new(category_tree_schema()).with_rows(
        "categories",
        vec![
            vec![("id", Value::Int(1)), ("parent_id", Value::Null)],
            vec![("id", Value::Int(2)), ("parent_id", Value::Int(1))],
        ],
    );
    let config = seeded(RunConfig {
        overrides: overrides(vec![("categories", rows(10)), ("products", rows(60))]),
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();
    assert!(report.is_success(), "{}", report.summary());

    // New categories can only point at rows stored before the table was seeded.
    let parents = backend.column_values("categories", "parent_id");
    for parent in &parents[2..] {
        let id = parent.as_int().expect("sampled parent");
        assert!(id == 1 || id == 2);
    }

    // Products see every category, including the ten just inserted.
    let category_ids: HashSet<i64> = ints(&backend.column_values("categories", "id"))
        .into_iter()
        .collect();
    assert_eq!(category_ids, (1..=12).collect());
    let product_refs = ints(&backend.column_values("products", "category_id"));
    assert_eq!(product_refs.len(), 60);
    assert!(product_refs.iter().all(|id| category_ids.contains(id)));
    assert!(product_refs.iter().any(|id| *id > 2));
}

#[tokio::test]
async fn test_include_and_exclude_filters() {
    let mut backend = MemoryBackend::new(ecommerce_schema());
    let include = seeded(RunConfig {
        default_rows: 3,
        filter: TableFilter::Include(["users", "orders"].iter().map(|s| s.to_string()).collect()),
        ..Default::default()
    });
    let report = run(&mut backend, &include, &CancelFlag::new(), None)
        .await
        .unwrap();
    let seeded_tables: Vec<&str> = report.tables.keys().map(String::as_str).collect();
    assert_eq!(seeded_tables, vec!["users", "orders"]);

    let mut backend = MemoryBackend::new(ecommerce_schema());
    let exclude = seeded(RunConfig {
        default_rows: 3,
        filter: TableFilter::Exclude(["reviews", "order_items"].iter().map(|s| s.to_string()).collect()),
        ..Default::default()
    });
    let report = run(&mut backend, &exclude, &CancelFlag::new(), None)
        .await
        .unwrap();
    assert_eq!(report.tables.len(), 4);
    assert!(!report.tables.contains_key("reviews"));
    assert!(backend.rows("order_items").is_empty());
}

#[tokio::test]
async fn test_primary_keys_continue_after_existing_rows() {
    let mut backend = MemoryBackend::new(customers_orders_schema()).with_rows(
        "customers",
        vec![
            vec![("id", Value::Int(3))],
            vec![("id", Value::Int(17))],
        ],
    );
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(4)), ("orders", rows(0))]),
        ..Default::default()
    });
    run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    let ids = ints(&backend.column_values("customers", "id"));
    assert_eq!(ids, vec![3, 17, 18, 19, 20, 21]);
}

#[tokio::test]
async fn test_range_override_bounds_values() {
    let mut backend = MemoryBackend::new(customers_orders_schema());
    let mut customers = rows(50);
    customers.values.insert(
        "age".to_string(),
        (18..=25).map(Value::Int).collect(),
    );
    customers.values.insert(
        "tier".to_string(),
        vec![Value::String("gold".into()), Value::String("silver".into())],
    );
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", customers), ("orders", rows(0))]),
        ..Default::default()
    });
    run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    for age in ints(&backend.column_values("customers", "age")) {
        assert!((18..=25).contains(&age));
    }
    for tier in backend.column_values("customers", "tier") {
        assert!(matches!(tier.as_str(), Some("gold") | Some("silver")));
    }
}

#[tokio::test]
async fn test_text_truncated_to_max_length() {
    let mut backend = MemoryBackend::new(customers_orders_schema());
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(5)), ("orders", rows(20))]),
        ..Default::default()
    });
    run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    for note in backend.column_values("orders", "note") {
        assert!(note.as_str().unwrap().chars().count() <= 10);
    }
    for name in backend.column_values("customers", "name") {
        assert!(name.as_str().unwrap().chars().count() <= 40);
    }
}

#[tokio::test]
async fn test_batches_stay_under_parameter_limit() {
    let mut backend = MemoryBackend::new(customers_orders_schema()).with_max_parameters(2100);
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(1000)), ("orders", rows(0))]),
        ..Default::default()
    });
    run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    // 5 columns: 400 * 5 = 2000 < 2100
    let sizes: Vec<usize> = backend.batches.iter().map(|b| b.rows).collect();
    assert_eq!(sizes, vec![400, 400, 200]);
    assert!(backend.batches.iter().all(|b| b.rows * b.columns < 2100));
}

#[tokio::test]
async fn test_too_wide_table_fails_alone() {
    let mut backend = MemoryBackend::new(wide_schema(50)).with_max_parameters(2100);
    let config = seeded(RunConfig {
        default_rows: 10,
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();
    assert!(matches!(
        report.tables["wide"].status,
        TableStatus::Failed { .. }
    ));
    assert_eq!(backend.toggles, vec![false, true]);
}

#[tokio::test]
async fn test_cycle_is_fatal_before_any_insert() {
    let mut backend = MemoryBackend::new(circular_schema());
    let err = run(&mut backend, &RunConfig::default(), &CancelFlag::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SeedError::CircularDependency { .. }));
    assert!(err.is_fatal());
    assert!(backend.batches.is_empty());
    assert!(backend.toggles.is_empty());
}

#[tokio::test]
async fn test_insert_failure_restores_checks_and_continues() {
    // A ceiling of 300 gives every ecommerce table batches of 50 rows.
    let mut backend = MemoryBackend::new(ecommerce_schema())
        .with_max_parameters(300)
        .fail_insert("products", 1);
    let config = seeded(RunConfig {
        default_rows: 120,
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    let products = &report.tables["products"];
    assert!(matches!(products.status, TableStatus::Failed { .. }));
    assert_eq!(products.rows_inserted, 50);
    assert_eq!(report.failed_tables(), vec!["products"]);
    assert_eq!(report.tables.len(), 6, "run continued past the failure");
    assert_eq!(report.tables["reviews"].rows_inserted, 120);
    assert_eq!(backend.toggles.len(), 12);
    assert!(backend.toggles.chunks(2).all(|pair| pair == [false, true]));
}

#[tokio::test]
async fn test_empty_reference_sample_fails_dependent_table() {
    let mut backend = MemoryBackend::new(customers_orders_schema());
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(0)), ("orders", rows(5))]),
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();

    match &report.tables["orders"].status {
        TableStatus::Failed { reason } => assert!(reason.contains("customers.id")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.tables["orders"].rows_inserted, 0);
    assert_eq!(backend.toggles, vec![false, true, false, true]);
}

#[tokio::test]
async fn test_restore_failure_is_reported() {
    let mut backend = MemoryBackend::new(customers_orders_schema()).fail_restore();
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(3)), ("orders", rows(0))]),
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();
    match &report.tables["customers"].status {
        TableStatus::Failed { reason } => assert!(reason.contains("restore refused")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.tables["customers"].rows_inserted, 3);
}

#[tokio::test]
async fn test_cancellation_stops_between_batches() {
    let cancel = CancelFlag::new();
    let mut backend = MemoryBackend::new(customers_orders_schema())
        .with_max_parameters(2100)
        .cancel_after(cancel.clone(), 1);
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(1000)), ("orders", rows(10))]),
        ..Default::default()
    });

    let report = run(&mut backend, &config, &cancel, None).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.tables["customers"].status, TableStatus::Cancelled);
    assert_eq!(report.tables["customers"].rows_inserted, 400);
    assert!(!report.tables.contains_key("orders"));
    assert_eq!(backend.toggles, vec![false, true]);
}

#[tokio::test]
async fn test_progress_reports_every_batch() {
    let mut backend = MemoryBackend::new(customers_orders_schema()).with_max_parameters(2100);
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(900)), ("orders", rows(0))]),
        ..Default::default()
    });
    let seen = Mutex::new(Vec::new());
    let progress = |table: &str, done: usize, total: usize| {
        seen.lock().unwrap().push((table.to_string(), done, total));
    };

    run(&mut backend, &config, &CancelFlag::new(), Some(&progress))
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(
        seen,
        vec![
            ("customers".to_string(), 400, 900),
            ("customers".to_string(), 800, 900),
            ("customers".to_string(), 900, 900),
        ]
    );
}

#[tokio::test]
async fn test_same_seed_same_rows() {
    let config = seeded(RunConfig {
        overrides: overrides(vec![("customers", rows(10)), ("orders", rows(10))]),
        ..Default::default()
    });

    let mut a = MemoryBackend::new(customers_orders_schema());
    let mut b = MemoryBackend::new(customers_orders_schema());
    run(&mut a, &config, &CancelFlag::new(), None).await.unwrap();
    run(&mut b, &config, &CancelFlag::new(), None).await.unwrap();

    assert_eq!(
        a.column_values("orders", "customer_id"),
        b.column_values("orders", "customer_id")
    );
    assert_eq!(a.column_values("customers", "email"), b.column_values("customers", "email"));
}

#[tokio::test]
async fn test_unknown_override_names_become_warnings() {
    let mut backend = MemoryBackend::new(customers_orders_schema());
    let mut customers = rows(1);
    customers
        .values
        .insert("shoe_size".to_string(), vec![Value::Int(42)]);
    let config = seeded(RunConfig {
        overrides: overrides(vec![
            ("customers", customers),
            ("orders", rows(1)),
            ("invoices", rows(3)),
        ]),
        ..Default::default()
    });

    let report = run(&mut backend, &config, &CancelFlag::new(), None)
        .await
        .unwrap();
    assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);
    assert!(report.is_success());
}
