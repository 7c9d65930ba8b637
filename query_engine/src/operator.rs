//! The operator base contract (spec.md §4.G): a lazily-evaluated DAG node
//! that runs its own logic exactly once and memoizes the result behind
//! `get_output()`.
//!
//! The source expresses this as an abstract base class whose `execute()`
//! is non-virtual and calls the pure-virtual `_on_execute()` once,
//! stashing the result in a protected `_output` member. Rust has no
//! template method pattern via inheritance, so the memoization lives in an
//! [`ExecutionState`] every `Operator` implementor embeds and exposes
//! through `execution_state()`; the trait's default `execute()` method
//! plays the role of the non-virtual base method.

use std::sync::Arc;

use columnar_storage::Table;
use once_cell::sync::OnceCell;

use crate::error::Result;

/// Holds the memoized output of one operator node. Embedded by value in
/// every `Operator` implementor (`GetTable`, `TableScan`).
#[derive(Debug, Default)]
pub struct ExecutionState {
    output: OnceCell<Arc<Table>>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self {
            output: OnceCell::new(),
        }
    }
}

/// A pull-based, lazily-evaluated pipeline node that produces a `Table`.
///
/// `execute()` is the public entry point: it runs `on_execute()` the first
/// time it is called and caches the resulting table, so a DAG where one
/// operator feeds two downstream consumers still runs its own logic once
/// (spec.md §4.G, §5's "synchronous, single-threaded per query"
/// scheduling model). A failed `on_execute()` is *not* memoized — spec.md
/// §7 says errors are surfaced, not retried, but also promises no partial
/// success; since there is no partial output to cache on failure, the
/// simplest safe reading is that only successful completions are
/// memoized, and a second `execute()` call after a failure simply tries
/// again.
pub trait Operator {
    /// This node's own evaluation logic, given its already-executed
    /// upstream inputs (an implementor pulls those via their own
    /// `execute()` calls).
    fn on_execute(&self) -> Result<Arc<Table>>;

    /// Accessor for the memoization cell every implementor embeds.
    fn execution_state(&self) -> &ExecutionState;

    /// Runs this node, returning its (possibly cached) output table.
    fn execute(&self) -> Result<Arc<Table>> {
        if let Some(output) = self.execution_state().output.get() {
            return Ok(Arc::clone(output));
        }
        let output = self.on_execute()?;
        // Another caller may have raced us to populate the cell (the cell
        // is `Sync`-safe); either way, some table is now memoized, and we
        // return the one we just computed so callers see the same value
        // they'd get from `get_output()` immediately afterward.
        let _ = self.execution_state().output.set(Arc::clone(&output));
        Ok(output)
    }

    /// Returns the memoized output, or `None` if `execute()` has not yet
    /// completed successfully.
    fn get_output(&self) -> Option<Arc<Table>> {
        self.execution_state().output.get().cloned()
    }
}
