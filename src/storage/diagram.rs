//! Diagram persistence, one redb table keyed by diagram id.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::models::Diagram;

const DIAGRAM_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("diagrams");

pub struct DiagramStorage {
    db: Arc<Database>,
}

impl DiagramStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DIAGRAM_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Write the full record under its id, replacing any previous version.
    pub fn put(&self, diagram: &Diagram) -> Result<()> {
        let data = serde_json::to_vec(diagram)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DIAGRAM_TABLE)?;
            table.insert(diagram.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Diagram>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DIAGRAM_TABLE)?;
        match table.get(id)? {
            Some(data) => {
                let diagram: Diagram = serde_json::from_slice(data.value())?;
                if !diagram.is_valid() {
                    anyhow::bail!("diagram record {} failed validation", id);
                }
                Ok(Some(diagram))
            }
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Diagram>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DIAGRAM_TABLE)?;

        let mut diagrams = Vec::new();
        for entry in table.iter()? {
            let (_, data) = entry?;
            let diagram: Diagram = serde_json::from_slice(data.value())?;
            diagrams.push(diagram);
        }
        Ok(diagrams)
    }

    /// Returns whether a record was actually removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(DIAGRAM_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
