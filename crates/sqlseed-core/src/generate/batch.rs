//! # Batch Planner
//!
//! Splits a table's row target into multi-row INSERT statements that stay
//! under the backend's bound-parameter ceiling. Starting from the desired
//! batch size, the size shrinks by a fixed step until
//! `batch_size * column_count < max_parameters`.

use std::ops::Range;

use crate::error::{Result, SeedError};

/// Rows per statement tried first.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Amount the batch size shrinks by on each attempt.
pub const BATCH_SIZE_STEP: usize = 50;

/// How one table's rows are split into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub batch_count: usize,
    pub total_rows: usize,
}

impl BatchPlan {
    /// Row index ranges, one per batch. The last one may be short.
    pub fn batches(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.batch_count).map(move |i| {
            let start = i * self.batch_size;
            start..(start + self.batch_size).min(self.total_rows)
        })
    }
}

/// Plan batches for `table` using the default size and step.
pub fn plan_batches(
    table: &str,
    column_count: usize,
    total_rows: usize,
    max_parameters: usize,
) -> Result<BatchPlan> {
    plan_batches_with(
        table,
        column_count,
        total_rows,
        max_parameters,
        DEFAULT_BATCH_SIZE,
        BATCH_SIZE_STEP,
    )
}

/// Plan batches with an explicit desired size and step.
///
/// The chosen size is the largest `desired - k * step` (k >= 0, result > 0)
/// with `size * column_count < max_parameters`. Fails when the table has no
/// columns or when no such size exists.
pub fn plan_batches_with(
    table: &str,
    column_count: usize,
    total_rows: usize,
    max_parameters: usize,
    desired: usize,
    step: usize,
) -> Result<BatchPlan> {
    let too_wide = || SeedError::BatchTooWide {
        table: table.to_string(),
        column_count,
        max_parameters,
    };

    if column_count == 0 {
        return Err(too_wide());
    }

    let mut batch_size = desired;
    loop {
        if batch_size == 0 {
            return Err(too_wide());
        }
        if batch_size.saturating_mul(column_count) < max_parameters {
            break;
        }
        if step == 0 {
            return Err(too_wide());
        }
        batch_size = batch_size.saturating_sub(step);
    }

    Ok(BatchPlan {
        batch_size,
        batch_count: total_rows.div_ceil(batch_size),
        total_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_size_fits() {
        let plan = plan_batches("users", 10, 1200, 65535).unwrap();
        assert_eq!(plan.batch_size, 500);
        assert_eq!(plan.batch_count, 3);
    }

    #[test]
    fn test_sql_server_ceiling_shrinks_batch() {
        // 500*5 = 2500 >= 2100, 450*5 = 2250 >= 2100, 400*5 = 2000 < 2100
        let plan = plan_batches("orders", 5, 1000, 2100).unwrap();
        assert_eq!(plan.batch_size, 400);
        assert_eq!(plan.batch_count, 3);
    }

    #[test]
    fn test_bound_is_strict() {
        // 100 * 21 = 2100 is not < 2100, so the next step down wins.
        let plan = plan_batches_with("t", 21, 10, 2100, 100, 50).unwrap();
        assert_eq!(plan.batch_size, 50);
    }

    #[test]
    fn test_chosen_size_is_largest_fitting_step() {
        for columns in 1..42 {
            let plan = plan_batches("t", columns, 10_000, 2100).unwrap();
            assert!(plan.batch_size * columns < 2100);
            let larger = plan.batch_size + BATCH_SIZE_STEP;
            assert!(
                larger > DEFAULT_BATCH_SIZE || larger * columns >= 2100,
                "{} columns: {} should not fit",
                columns,
                larger
            );
        }
    }

    #[test]
    fn test_too_many_columns_fails() {
        // Even 50 rows * 50 columns = 2500 exceeds 2100.
        let err = plan_batches("wide", 50, 10, 2100).unwrap_err();
        assert!(matches!(err, SeedError::BatchTooWide { column_count: 50, .. }));
    }

    #[test]
    fn test_zero_columns_fails() {
        assert!(plan_batches("empty", 0, 10, 2100).is_err());
    }

    #[test]
    fn test_zero_rows_means_zero_batches() {
        let plan = plan_batches("t", 3, 0, 65535).unwrap();
        assert_eq!(plan.batch_count, 0);
        assert_eq!(plan.batches().count(), 0);
    }

    #[test]
    fn test_batches_cover_exactly_total_rows() {
        let plan = plan_batches("t", 3, 1234, 65535).unwrap();
        let ranges: Vec<_> = plan.batches().collect();
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[0], 0..500);
        assert_eq!(ranges[2], 1000..1234);
        assert_eq!(ranges.iter().map(|r| r.len()).sum::<usize>(), 1234);
    }
}
