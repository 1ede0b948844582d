use std::sync::Arc;

use crate::columns::TableSchema;
use crate::entry::Entry;

/// Working table: rows sharing one schema.
///
/// Every pipeline stage consumes a table and returns a new one.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: Arc<TableSchema>,
    pub rows: Vec<Entry>,
}

impl Table {
    pub fn new(schema: Arc<TableSchema>, rows: Vec<Entry>) -> Self {
        Self { schema, rows }
    }

    /// New table with the same schema and different rows.
    pub fn with_rows(&self, rows: Vec<Entry>) -> Self {
        Self::new(Arc::clone(&self.schema), rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
