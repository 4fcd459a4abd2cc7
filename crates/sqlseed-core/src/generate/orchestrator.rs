//! # Orchestrator
//!
//! Drives one seeding run end to end:
//! introspect → dependency graph → generation order → filter → per-table
//! population. Setup failures (introspection, dependency cycles) abort the run
//! before anything is written; table failures are recorded and the run
//! continues with the next table.

use std::time::Instant;

use tracing::{info, warn};

use crate::backend::SchemaBackend;
use crate::cancel::CancelFlag;
use crate::config::RunConfig;
use crate::error::Result;
use crate::generate::engine::{InsertionEngine, ProgressCallback};
use crate::generate::synth::ValueSynthesizer;
use crate::graph::dag::DependencyGraph;
use crate::graph::topo::{topological_sort, GenerationOrder};
use crate::report::{RunReport, TableStatus};
use crate::schema::introspect::introspect;
use crate::schema::types::DatabaseSchema;

/// Tables to populate, in generation order, after applying the filter.
pub fn tables_to_seed(order: &GenerationOrder, config: &RunConfig) -> Vec<String> {
    order
        .tables
        .iter()
        .filter(|t| config.filter.allows(t))
        .cloned()
        .collect()
}

/// Introspect the backend and seed every selected table.
pub async fn run<B: SchemaBackend>(
    backend: &mut B,
    config: &RunConfig,
    cancel: &CancelFlag,
    progress: Option<ProgressCallback<'_>>,
) -> Result<RunReport> {
    let schema = introspect(backend).await?;
    seed_schema(backend, &schema, config, cancel, progress).await
}

/// Seed an already introspected schema.
pub async fn seed_schema<B: SchemaBackend>(
    backend: &mut B,
    schema: &DatabaseSchema,
    config: &RunConfig,
    cancel: &CancelFlag,
    progress: Option<ProgressCallback<'_>>,
) -> Result<RunReport> {
    let started = Instant::now();
    let graph = DependencyGraph::from_schema(schema);
    let order = topological_sort(&graph)?;
    let selected = tables_to_seed(&order, config);
    info!(
        "Seeding {} of {} tables: {}",
        selected.len(),
        order.tables.len(),
        selected.join(", ")
    );

    let mut report = RunReport {
        warnings: config.validate_against_schema(schema),
        ..Default::default()
    };
    for warning in &report.warnings {
        warn!("{}", warning);
    }

    let synth = ValueSynthesizer::new(config.seed);
    let mut engine = InsertionEngine::new(backend, synth, cancel.clone()).with_progress(progress);

    for name in &selected {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        let Some(table) = schema.tables.get(name) else {
            continue;
        };

        let table_report = engine.populate(schema, table, config).await;
        let was_cancelled = table_report.status == TableStatus::Cancelled;
        report.record(name, table_report);
        if was_cancelled {
            report.cancelled = true;
            break;
        }
    }

    report.elapsed = started.elapsed();
    info!(
        "Run finished: {} rows in {:.2}s",
        report.total_rows_inserted(),
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}
