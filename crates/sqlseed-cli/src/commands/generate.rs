use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};
use indicatif::{ProgressBar, ProgressStyle};

use sqlseed_core::generate::orchestrator::{seed_schema, tables_to_seed};
use sqlseed_core::graph::dag::DependencyGraph;
use sqlseed_core::graph::topo::topological_sort;
use sqlseed_core::schema::introspect::introspect;
use sqlseed_core::{CancelFlag, RunReport, TableStatus};

use crate::args::GenerateArgs;

pub async fn run(args: &GenerateArgs, cancel: &CancelFlag) -> Result<()> {
    let mut config = super::load_config(&args.connection)?;
    if args.rows.is_some() {
        config.common_settings.number_of_rows = args.rows;
    }
    if args.seed.is_some() {
        config.common_settings.seed = args.seed;
    }
    let run_config = config.to_run_config()?;

    let mut backend = super::connect(&config).await?;

    // Phase 1: Introspect
    let pb = spinner("1/3", "Introspecting schema...")?;
    let schema = introspect(&mut backend).await?;
    pb.finish_with_message(format!(
        "Introspecting schema... ✓ {} tables, {} foreign keys",
        schema.table_count(),
        schema.foreign_key_count()
    ));

    // Phase 2: Order tables. A cycle ends the run here.
    let pb2 = spinner("2/3", "Ordering tables...")?;
    let order = topological_sort(&DependencyGraph::from_schema(&schema))?;
    let selected = tables_to_seed(&order, &run_config);
    pb2.finish_with_message(format!(
        "Ordering tables... ✓ {} of {} tables selected",
        selected.len(),
        order.tables.len()
    ));

    // Phase 3: Insert
    let total_rows: usize = selected.iter().map(|t| run_config.rows_for(t)).sum();
    let pb3 = ProgressBar::new(total_rows as u64);
    pb3.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.cyan} [3/3] Inserting rows... {bar:40.cyan/dim} {pos}/{len} ({eta}) {msg}",
            )?
            .progress_chars("█▓░"),
    );

    // (table in progress, rows finished in earlier tables, rows finished in this one)
    let position: Mutex<(String, u64, u64)> = Mutex::new((String::new(), 0, 0));
    let report = seed_schema(
        &mut backend,
        &schema,
        &run_config,
        cancel,
        Some(&|table, inserted, _total| {
            if let Ok(mut state) = position.lock() {
                if state.0 != table {
                    state.1 += state.2;
                    state.2 = 0;
                    state.0 = table.to_string();
                    pb3.set_message(table.to_string());
                }
                state.2 = inserted as u64;
                pb3.set_position(state.1 + state.2);
            }
        }),
    )
    .await?;

    pb3.finish_with_message(format!("✓ ({} rows)", report.total_rows_inserted()));

    for warning in &report.warnings {
        eprintln!("⚠ {}", warning);
    }
    println!("{}", summary_table(&report));
    eprintln!("\n{}", report.summary());

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        eprintln!("Report written to {}", path.display());
    }

    Ok(())
}

fn spinner(prefix: &'static str, message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} [{prefix}] {msg}")?);
    pb.set_prefix(prefix);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn summary_table(report: &RunReport) -> ComfyTable {
    let mut t = ComfyTable::new();
    t.set_header(vec!["Table", "Requested", "Inserted", "Status", "Time"]);
    for (name, table) in &report.tables {
        let status = match &table.status {
            TableStatus::Failed { reason } => format!("failed: {}", first_line(reason)),
            other => other.label().to_string(),
        };
        t.add_row(vec![
            Cell::new(name),
            Cell::new(table.rows_requested),
            Cell::new(table.rows_inserted),
            Cell::new(status),
            Cell::new(format!("{:.2}s", table.elapsed.as_secs_f64())),
        ]);
    }
    t
}

fn first_line(reason: &str) -> &str {
    reason.lines().next().unwrap_or(reason)
}
