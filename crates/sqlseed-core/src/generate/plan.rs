//! # Table Plans
//!
//! A `TablePlan` decides once, per column, how values are produced. Rows are
//! then drawn from the plan. Resolution order for a column:
//!
//! 1. configured override values
//! 2. foreign key reference sample
//! 3. primary key (integer cursor, or a fresh UUID)
//! 4. type category, with column-name heuristics for text

use crate::classify::{classify_text_column, TextKind};
use crate::config::RunConfig;
use crate::error::{Result, SeedError};
use crate::generate::context::RunContext;
use crate::generate::synth::ValueSynthesizer;
use crate::generate::value::Value;
use crate::schema::types::{Column, ForeignKeyRef, Table, TypeCategory};

/// How a column's value is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStrategy {
    /// Uniform draw from configured values, already coerced to the column type.
    Override(Vec<Value>),
    /// Uniform draw from the referenced column's sample.
    ForeignKey {
        target: ForeignKeyRef,
        self_reference: bool,
    },
    /// Next value of the table's integer key cursor.
    IntegerKey,
    /// Fresh native UUID.
    UuidKey,
    /// Fresh UUID rendered as text.
    TextKey,
    Text(TextKind),
    Typed(TypeCategory),
    /// No generator for this type; always `NULL`.
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct ColumnPlan {
    pub column: Column,
    pub strategy: ColumnStrategy,
}

#[derive(Debug, Clone)]
pub struct TablePlan {
    pub table: String,
    pub rows: usize,
    pub columns: Vec<ColumnPlan>,
}

impl TablePlan {
    pub fn build(table: &Table, config: &RunConfig) -> Self {
        let table_override = config.table_override(&table.name);
        let columns = table
            .columns
            .values()
            .map(|column| {
                let values = table_override.and_then(|o| o.values_for(&column.name));
                ColumnPlan {
                    column: column.clone(),
                    strategy: resolve_strategy(table, column, values),
                }
            })
            .collect();

        Self {
            table: table.name.clone(),
            rows: config.rows_for(&table.name),
            columns,
        }
    }

    /// Column metadata in insert order.
    pub fn insert_columns(&self) -> Vec<Column> {
        self.columns.iter().map(|c| c.column.clone()).collect()
    }

    /// Foreign key targets this table draws from.
    pub fn references(&self) -> impl Iterator<Item = &ForeignKeyRef> {
        self.columns.iter().filter_map(|c| match &c.strategy {
            ColumnStrategy::ForeignKey { target, .. } => Some(target),
            _ => None,
        })
    }

    /// Columns filled from the integer key cursor.
    pub fn integer_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.strategy == ColumnStrategy::IntegerKey)
            .map(|c| &c.column)
    }

    /// Columns that will always be `NULL` because their type is unsupported.
    pub fn unsupported_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.strategy == ColumnStrategy::Unsupported)
            .map(|c| &c.column)
    }

    /// Produce one row aligned with `insert_columns()`.
    ///
    /// Reference samples and key cursors must already be loaded into `ctx`.
    pub fn generate_row(
        &self,
        synth: &mut ValueSynthesizer,
        ctx: &mut RunContext,
    ) -> Result<Vec<Value>> {
        self.columns
            .iter()
            .map(|plan| self.generate_value(plan, synth, ctx))
            .collect()
    }

    fn generate_value(
        &self,
        plan: &ColumnPlan,
        synth: &mut ValueSynthesizer,
        ctx: &mut RunContext,
    ) -> Result<Value> {
        let column = &plan.column;
        let value = match &plan.strategy {
            ColumnStrategy::Override(values) => synth.pick(values).cloned().unwrap_or(Value::Null),
            ColumnStrategy::ForeignKey {
                target,
                self_reference,
            } => {
                let sample = ctx.references.get(target).unwrap_or_default();
                match synth.pick(sample) {
                    Some(value) => value.clone(),
                    None if *self_reference && column.nullable => Value::Null,
                    None => {
                        return Err(SeedError::ForeignKeyResolution {
                            source_table: self.table.clone(),
                            source_column: column.name.clone(),
                            target_table: target.table.clone(),
                            target_column: target.column.clone(),
                        })
                    }
                }
            }
            ColumnStrategy::IntegerKey => Value::Int(ctx.next_key(&self.table, &column.name)?),
            ColumnStrategy::UuidKey => Value::Uuid(synth.uuid()),
            ColumnStrategy::TextKey => synth.uuid_text(column.max_length),
            ColumnStrategy::Text(kind) => synth.text(*kind, column.max_length),
            ColumnStrategy::Typed(category) => synth.typed(*category).unwrap_or(Value::Null),
            ColumnStrategy::Unsupported => Value::Null,
        };
        Ok(value)
    }
}

fn resolve_strategy(table: &Table, column: &Column, overrides: Option<&[Value]>) -> ColumnStrategy {
    if let Some(values) = overrides.filter(|v| !v.is_empty()) {
        let coerced = values
            .iter()
            .cloned()
            .map(|v| v.coerce_for(&column.data_type))
            .collect();
        return ColumnStrategy::Override(coerced);
    }

    if let Some(target) = table.foreign_key(&column.name) {
        return ColumnStrategy::ForeignKey {
            target: target.clone(),
            self_reference: target.table == table.name,
        };
    }

    let category = column.data_type.category();
    if table.is_primary_key(&column.name) {
        match category {
            TypeCategory::Integer => return ColumnStrategy::IntegerKey,
            TypeCategory::Uuid => return ColumnStrategy::UuidKey,
            TypeCategory::Text => return ColumnStrategy::TextKey,
            _ => {}
        }
    }

    match category {
        TypeCategory::Text => ColumnStrategy::Text(classify_text_column(&column.name)),
        TypeCategory::Unsupported => ColumnStrategy::Unsupported,
        other => ColumnStrategy::Typed(other),
    }
}
