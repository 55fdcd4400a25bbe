use crate::store::item::WriteItem;
use crate::store::traits::{StoreError, TableWriter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Accepts every batch in full and keeps the items in memory. Backs `--dry-run`.
#[derive(Debug, Default)]
pub struct MemoryTable {
    tables: Mutex<HashMap<String, Vec<WriteItem>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items written to `table`, in arrival order
    pub fn items(&self, table: &str) -> Vec<WriteItem> {
        self.tables
            .lock()
            .map(|tables| tables.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TableWriter for MemoryTable {
    async fn batch_write(
        &self,
        table: &str,
        items: &[WriteItem],
    ) -> Result<Vec<WriteItem>, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Other("memory table lock poisoned".to_string()))?;
        tables
            .entry(table.to_string())
            .or_default()
            .extend_from_slice(items);
        Ok(Vec::new())
    }
}
