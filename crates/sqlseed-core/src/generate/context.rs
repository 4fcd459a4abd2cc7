use std::collections::{HashMap, HashSet};

use crate::error::{Result, SeedError};
use crate::generate::reference::ReferenceCache;

/// State shared across tables for the duration of one run.
///
/// Created by the orchestrator and dropped when the run ends; nothing here
/// outlives a run.
#[derive(Debug, Default)]
pub struct RunContext {
    pub references: ReferenceCache,
    /// Last integer key handed out, keyed by `"table.column"`.
    cursors: HashMap<String, i64>,
    /// (table, column) pairs already warned about.
    warned: HashSet<(String, String)>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_cursor(&self, table: &str, column: &str) -> bool {
        self.cursors.contains_key(&cursor_key(table, column))
    }

    /// Start the cursor at the stored maximum (0 for an empty table).
    /// Only the first call for a column has any effect.
    pub fn seed_cursor(&mut self, table: &str, column: &str, current_max: i64) {
        self.cursors
            .entry(cursor_key(table, column))
            .or_insert(current_max);
    }

    /// Next integer key for `table.column`, strictly greater than the last.
    pub fn next_key(&mut self, table: &str, column: &str) -> Result<i64> {
        let cursor = self.cursors.entry(cursor_key(table, column)).or_insert(0);
        let last = *cursor;
        let next = last.checked_add(1).ok_or_else(|| SeedError::KeyExhausted {
            table: table.to_string(),
            column: column.to_string(),
            last,
        })?;
        *cursor = next;
        Ok(next)
    }

    /// Returns true the first time it is called for a (table, column) pair.
    pub fn first_warning(&mut self, table: &str, column: &str) -> bool {
        self.warned.insert((table.to_string(), column.to_string()))
    }
}

fn cursor_key(table: &str, column: &str) -> String {
    format!("{}.{}", table, column)
}
