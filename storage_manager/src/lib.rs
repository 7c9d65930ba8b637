//! The process-wide named-table registry (spec.md §4.F): a map from table
//! name to [`Table`], plus the lifecycle operations every operator and
//! test in this workspace drives tables through (`add_table`, `get_table`,
//! `drop_table`, `reset`).
//!
//! Registry mutations (`add_table`/`drop_table`/`reset`) are assumed
//! externally serialized by the caller (spec.md §5); `get_table` may run
//! concurrently with other `get_table` calls. A table's own internal
//! concurrency (its chunk read/write lock) is unrelated to and unguarded
//! by this registry's lock.

pub mod error;

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use columnar_storage::Table;
use observability_deps::tracing::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use snafu::OptionExt;

pub use error::{Error, Result};
use error::TableNotFound;

/// A registry of named, shared tables.
///
/// Tables are reference-counted (`Arc<Table>`) because [`ReferenceSegment`]
/// (columnar_storage) and every operator output hold a shared, non-owning
/// handle to the table they scanned — the registry is the one place a
/// table is ever owned outright.
///
/// [`ReferenceSegment`]: columnar_storage::ReferenceSegment
#[derive(Debug, Default)]
pub struct StorageManager {
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `table` under `name`, replacing any previously registered
    /// table of the same name (the source's `StorageManager::add_table`
    /// has no "already exists" guard; schema validation happens while the
    /// table is still being built via `Table::add_column`, before it ever
    /// reaches the registry).
    pub fn add_table(&self, name: impl Into<String>, table: Table) {
        let name = name.into();
        debug!(table_name = %name, "registering table");
        self.tables.write().insert(name, Arc::new(table));
    }

    /// Drops the named table. Errors if no table of that name is
    /// registered (spec.md §4.F).
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.tables
            .write()
            .remove(name)
            .map(|_| ())
            .context(TableNotFound { name })
    }

    /// Resolves a table by name, handing back a shared handle. Errors if
    /// no table of that name is registered.
    pub fn get_table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .context(TableNotFound { name })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// All registered table names, in unspecified order (spec.md §4.F).
    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Writes one summary line per registered table to `sink`:
    /// `"<name> <column_count> <row_count> <chunk_count>\n"` (spec.md §6).
    /// Table order is unspecified.
    pub fn print(&self, sink: &mut impl Write) -> io::Result<()> {
        for (name, table) in self.tables.read().iter() {
            writeln!(
                sink,
                "{} {} {} {}",
                name,
                table.column_count(),
                table.row_count(),
                table.chunk_count().get(),
            )?;
        }
        Ok(())
    }

    /// Clears every registered table.
    pub fn reset(&self) {
        self.tables.write().clear();
    }
}

/// The lazily-initialized, process-wide singleton the source's
/// `StorageManager::get()` Meyers singleton always assumed (spec.md's
/// Design Notes §9). Kept alongside the explicit, constructible
/// `StorageManager` above rather than in place of it, so tests can build
/// their own isolated registry instead of sharing — and stepping on —
/// global state.
pub static GLOBAL: Lazy<StorageManager> = Lazy::new(StorageManager::new);

/// Returns the process-wide [`StorageManager`] instance.
pub fn global() -> &'static StorageManager {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnar_types::Variant;

    fn sample_table() -> Table {
        let mut table = Table::new(10);
        table.add_column("a", "int").unwrap();
        table.append(&[Variant::Int32(1)]).unwrap();
        table
    }

    #[test]
    fn get_table_errors_when_absent() {
        let manager = StorageManager::new();
        assert!(manager.get_table("missing").is_err());
        assert!(!manager.has_table("missing"));
    }

    #[test]
    fn add_then_get_round_trips() {
        let manager = StorageManager::new();
        manager.add_table("t", sample_table());
        assert!(manager.has_table("t"));
        let table = manager.get_table("t").unwrap();
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn drop_table_errors_when_absent() {
        let manager = StorageManager::new();
        assert!(manager.drop_table("missing").is_err());
        manager.add_table("t", sample_table());
        assert!(manager.drop_table("t").is_ok());
        assert!(!manager.has_table("t"));
    }

    #[test]
    fn reset_clears_registry() {
        let manager = StorageManager::new();
        manager.add_table("t", sample_table());
        manager.reset();
        assert!(manager.table_names().is_empty());
    }

    #[test]
    fn print_emits_one_summary_line_per_table() {
        let manager = StorageManager::new();
        manager.add_table("t", sample_table());
        let mut out = Vec::new();
        manager.print(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "t 1 1 1\n");
    }

    #[test]
    fn global_singleton_is_reachable_and_resettable() {
        global().reset();
        global().add_table("global_t", sample_table());
        assert!(global().has_table("global_t"));
        global().reset();
        assert!(!global().has_table("global_t"));
    }
}
