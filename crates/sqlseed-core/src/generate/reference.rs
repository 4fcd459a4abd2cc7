//! # Reference Sampler
//!
//! Foreign key columns draw their values from a sample of the referenced
//! column's stored values. Each `table.column` target is sampled once per run
//! (up to `SAMPLE_LIMIT` distinct non-null values, random order) and the
//! sample is reused by every dependent table after that.
//!
//! A self-referencing table samples itself before its own rows exist, so the
//! engine evicts a table's entries once that table has been populated.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::backend::SchemaBackend;
use crate::error::Result;
use crate::generate::value::Value;
use crate::schema::types::{Column, ForeignKeyRef};

/// Maximum number of candidate values kept per referenced column.
pub const SAMPLE_LIMIT: usize = 100;

/// Run-scoped cache of sampled referenced values, keyed by (table, column).
#[derive(Debug, Default)]
pub struct ReferenceCache {
    samples: HashMap<(String, String), Vec<Value>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(target: &ForeignKeyRef) -> (String, String) {
        (target.table.clone(), target.column.clone())
    }

    /// Return the sample for `target`, querying the backend on first use.
    /// `column` is the referenced column's metadata.
    pub async fn load<B: SchemaBackend>(
        &mut self,
        backend: &mut B,
        target: &ForeignKeyRef,
        column: &Column,
    ) -> Result<&[Value]> {
        let key = Self::key(target);
        if !self.samples.contains_key(&key) {
            let values = backend
                .sample_values(&target.table, column, SAMPLE_LIMIT)
                .await?;
            tracing::debug!("Sampled {} candidate values for {}", values.len(), target);
            self.samples.insert(key.clone(), values);
        }
        Ok(self.samples.get(&key).map(Vec::as_slice).unwrap_or_default())
    }

    /// Cached sample for `target`, if it has been loaded.
    pub fn get(&self, target: &ForeignKeyRef) -> Option<&[Value]> {
        self.samples.get(&Self::key(target)).map(Vec::as_slice)
    }

    /// Uniform draw from the cached sample for `target`.
    pub fn pick(&self, target: &ForeignKeyRef, rng: &mut impl Rng) -> Option<&Value> {
        self.get(target).and_then(|values| values.choose(rng))
    }

    pub fn is_cached(&self, target: &ForeignKeyRef) -> bool {
        self.samples.contains_key(&Self::key(target))
    }

    /// Drop every sample taken from `table`. Returns how many were dropped.
    pub fn evict_table(&mut self, table: &str) -> usize {
        let before = self.samples.len();
        self.samples.retain(|(sampled, _), _| sampled != table);
        before - self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
