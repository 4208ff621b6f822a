//! A small cache for first-pass rewrites of frequently reused templates.

use crate::bind::Options;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::rewrite::{self, Rewritten};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Caches `(template, dialect)` → first-pass rewrite.
///
/// Read-mostly: lookups take a read lock, misses upgrade to a write lock.
/// Eviction is generational — when the table reaches capacity it is cleared
/// and repopulated by subsequent traffic. Capacity zero disables insertion.
pub struct StatementCache {
    capacity: usize,
    inner: RwLock<HashMap<(String, Dialect), Arc<Rewritten>>>,
}

impl StatementCache {
    /// A cache holding up to `capacity` rewritten templates.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// A cache sized by [`Options::statement_cache_capacity`].
    pub fn from_options(opts: &Options) -> Self {
        Self::new(opts.statement_cache_capacity)
    }

    /// Returns the cached rewrite of `template`, computing and storing it on
    /// a miss.
    pub fn rewrite(&self, template: &str, dialect: Dialect) -> Result<Arc<Rewritten>> {
        if let Ok(table) = self.inner.read() {
            if let Some(hit) = table.get(&(template.to_string(), dialect)) {
                tracing::trace!(template, "statement cache hit");
                return Ok(hit.clone());
            }
        }

        let rewritten = Arc::new(rewrite::rewrite(template, dialect)?);
        if self.capacity > 0 {
            if let Ok(mut table) = self.inner.write() {
                if table.len() >= self.capacity {
                    table.clear();
                }
                table.insert((template.to_string(), dialect), rewritten.clone());
            }
        }
        Ok(rewritten)
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.inner.read().map(|table| table.len()).unwrap_or(0)
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}
