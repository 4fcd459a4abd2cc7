//! # Insertion Engine
//!
//! Populates one table at a time. For each table the engine suspends
//! referential-integrity checks, builds the table plan, loads reference
//! samples and key cursors, then generates and inserts rows batch by batch.
//! Checks are restored on every path, including failures and cancellation.
//!
//! A failure is contained to the table it happened in: the returned
//! `TableReport` carries the partial row count and the reason, and the
//! caller moves on to the next table.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::backend::SchemaBackend;
use crate::cancel::CancelFlag;
use crate::config::RunConfig;
use crate::error::{Result, SeedError};
use crate::generate::batch::plan_batches;
use crate::generate::context::RunContext;
use crate::generate::plan::TablePlan;
use crate::generate::synth::ValueSynthesizer;
use crate::report::{TableReport, TableStatus};
use crate::schema::types::{DatabaseSchema, ForeignKeyRef, Table};

/// Receives (table, rows inserted so far, rows requested) after every batch.
pub type ProgressCallback<'a> = &'a (dyn Fn(&str, usize, usize) + Send + Sync);

pub struct InsertionEngine<'a, B: SchemaBackend> {
    backend: &'a mut B,
    synth: ValueSynthesizer,
    ctx: RunContext,
    cancel: CancelFlag,
    progress: Option<ProgressCallback<'a>>,
}

impl<'a, B: SchemaBackend> InsertionEngine<'a, B> {
    pub fn new(backend: &'a mut B, synth: ValueSynthesizer, cancel: CancelFlag) -> Self {
        Self {
            backend,
            synth,
            ctx: RunContext::new(),
            cancel,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback<'a>>) -> Self {
        self.progress = progress;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Populate `table` and report what happened. Never fails as a whole.
    pub async fn populate(
        &mut self,
        schema: &DatabaseSchema,
        table: &Table,
        config: &RunConfig,
    ) -> TableReport {
        let started = Instant::now();
        let plan = TablePlan::build(table, config);
        info!("Populating {} with {} rows", plan.table, plan.rows);

        for column in plan.unsupported_columns() {
            if self.ctx.first_warning(&plan.table, &column.name) {
                warn!(
                    "Unsupported type '{}' for {}.{}; inserting NULL",
                    column.raw_type, plan.table, column.name
                );
            }
        }

        let mut inserted = 0u64;
        let result = self.guarded_insert(schema, &plan, &mut inserted).await;

        // Samples of this table taken before its rows existed are stale now.
        let evicted = self.ctx.references.evict_table(&plan.table);
        if evicted > 0 {
            debug!("{}: dropped {} stale reference samples", plan.table, evicted);
        }

        let status = match result {
            Ok(()) => {
                info!("Finished {}: {} rows inserted", plan.table, inserted);
                TableStatus::Completed
            }
            Err(SeedError::Cancelled) => {
                warn!("Cancelled while populating {} after {} rows", plan.table, inserted);
                TableStatus::Cancelled
            }
            Err(err) => {
                error!("Failed to populate {}: {}", plan.table, err);
                TableStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };

        TableReport {
            rows_requested: plan.rows,
            rows_inserted: inserted,
            elapsed: started.elapsed(),
            status,
        }
    }

    /// Suspend checks, insert, and restore checks whatever the outcome.
    async fn guarded_insert(
        &mut self,
        schema: &DatabaseSchema,
        plan: &TablePlan,
        inserted: &mut u64,
    ) -> Result<()> {
        self.backend.set_constraint_enforcement(false).await?;

        let result = self.insert_rows(schema, plan, inserted).await;
        let restored = self.backend.set_constraint_enforcement(true).await;

        match (result, restored) {
            (result, Ok(())) => result,
            (Ok(()), Err(restore_err)) => {
                error!("Could not restore constraint checks after {}: {}", plan.table, restore_err);
                Err(restore_err)
            }
            (Err(err), Err(restore_err)) => {
                error!("Could not restore constraint checks after {}: {}", plan.table, restore_err);
                Err(SeedError::Other(format!("{}; additionally: {}", err, restore_err)))
            }
        }
    }

    async fn insert_rows(
        &mut self,
        schema: &DatabaseSchema,
        plan: &TablePlan,
        inserted: &mut u64,
    ) -> Result<()> {
        let columns = plan.insert_columns();
        let batches = plan_batches(
            &plan.table,
            columns.len(),
            plan.rows,
            self.backend.max_parameters(),
        )?;
        debug!(
            "{}: {} batches of up to {} rows",
            plan.table, batches.batch_count, batches.batch_size
        );

        self.load_references(schema, plan).await?;
        self.load_cursors(plan).await?;

        for range in batches.batches() {
            if self.cancel.is_cancelled() {
                return Err(SeedError::Cancelled);
            }

            let start = range.start;
            let rows = range
                .map(|_| plan.generate_row(&mut self.synth, &mut self.ctx))
                .collect::<Result<Vec<_>>>()?;

            let affected = self
                .backend
                .execute_batch_insert(&plan.table, &columns, &rows)
                .await
                .map_err(|e| e.at_row(start))?;
            *inserted += affected;
            debug!("{}: inserted batch of {} rows at {}", plan.table, rows.len(), start);

            if let Some(progress) = self.progress {
                progress(&plan.table, *inserted as usize, plan.rows);
            }
        }

        Ok(())
    }

    /// Sample every referenced column this table draws from.
    async fn load_references(&mut self, schema: &DatabaseSchema, plan: &TablePlan) -> Result<()> {
        let targets: Vec<ForeignKeyRef> = plan.references().cloned().collect();
        for target in targets {
            if self.ctx.references.is_cached(&target) {
                continue;
            }
            let column = schema.column(&target.table, &target.column).ok_or_else(|| {
                SeedError::Other(format!("Referenced column {} is not in the schema", target))
            })?;
            self.ctx
                .references
                .load(&mut *self.backend, &target, column)
                .await?;
        }
        Ok(())
    }

    /// Start integer key cursors at the stored maximum.
    async fn load_cursors(&mut self, plan: &TablePlan) -> Result<()> {
        for column in plan.integer_keys() {
            if self.ctx.has_cursor(&plan.table, &column.name) {
                continue;
            }
            let current = self
                .backend
                .max_primary_key_value(&plan.table, &column.name)
                .await?
                .unwrap_or(0);
            debug!("{}.{}: keys continue after {}", plan.table, column.name, current);
            self.ctx.seed_cursor(&plan.table, &column.name, current);
        }
        Ok(())
    }
}
