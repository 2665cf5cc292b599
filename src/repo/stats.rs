use redb::{Database, ReadableDatabase, ReadableTableMetadata, TableHandle};
use serde::Serialize;

use crate::db::tables::ALL_TABLES;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub records: u64,
}

/// Record count for every table, in creation order
pub fn table_counts(db: &Database) -> Result<Vec<TableCount>> {
    let read_txn = db.begin_read()?;
    ALL_TABLES
        .iter()
        .map(|definition| -> Result<TableCount> {
            let table = read_txn.open_table(*definition)?;
            Ok(TableCount {
                table: definition.name().to_string(),
                records: table.len()?,
            })
        })
        .collect()
}
