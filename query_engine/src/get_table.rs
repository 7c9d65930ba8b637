//! `GetTable` (spec.md §4.H): the DAG's leaf operator, resolving a
//! registered table by name through a [`StorageManager`].

use std::sync::Arc;

use columnar_storage::Table;
use observability_deps::tracing::debug;
use storage_manager::StorageManager;

use crate::error::Result;
use crate::operator::{ExecutionState, Operator};

#[derive(Debug)]
pub struct GetTable {
    storage_manager: Arc<StorageManager>,
    table_name: String,
    state: ExecutionState,
}

impl GetTable {
    pub fn new(storage_manager: Arc<StorageManager>, table_name: impl Into<String>) -> Self {
        Self {
            storage_manager,
            table_name: table_name.into(),
            state: ExecutionState::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl Operator for GetTable {
    fn on_execute(&self) -> Result<Arc<Table>> {
        debug!(table_name = %self.table_name, "resolving table through storage manager");
        Ok(self.storage_manager.get_table(&self.table_name)?)
    }

    fn execution_state(&self) -> &ExecutionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnar_types::Variant;

    #[test]
    fn resolves_a_registered_table() {
        let manager = Arc::new(StorageManager::new());
        let mut table = Table::new(10);
        table.add_column("a", "int").unwrap();
        table.append(&[Variant::Int32(1)]).unwrap();
        manager.add_table("t", table);

        let op = GetTable::new(Arc::clone(&manager), "t");
        assert!(op.get_output().is_none());
        let output = op.execute().unwrap();
        assert_eq!(output.row_count(), 1);
        assert!(op.get_output().is_some());
    }

    #[test]
    fn unknown_table_is_an_error() {
        let manager = Arc::new(StorageManager::new());
        let op = GetTable::new(manager, "missing");
        assert!(op.execute().is_err());
    }

    #[test]
    fn execute_memoizes_across_calls() {
        let manager = Arc::new(StorageManager::new());
        let mut table = Table::new(10);
        table.add_column("a", "int").unwrap();
        manager.add_table("t", table);

        let op = GetTable::new(manager, "t");
        let first = op.execute().unwrap();
        let second = op.execute().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
