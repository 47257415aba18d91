//! SQLite-backed catalog table.

use crate::error::Result;
use crate::types::{BlockKey, BlockRecord, VariantSpec};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS blocks (
    blockId    TEXT NOT NULL,
    modId      TEXT NOT NULL,
    blockName  TEXT,
    jarSlug    TEXT NOT NULL,
    texture64  TEXT,
    entryName  TEXT NOT NULL,
    variants   TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (blockId, modId)
);
";

const COLUMNS: &str = "blockId, modId, blockName, jarSlug, texture64, entryName, variants";

/// The persistent catalog of block records.
///
/// Records are only ever written by [`CatalogStore::replace_all`], which swaps
/// the whole table in one transaction.
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open (or create) a catalog database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory catalog.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Atomically replace every record in the catalog.
    ///
    /// Every row goes through one prepared statement inside a single
    /// transaction; `chunk_size` only groups rows for progress logging. On
    /// any failure the transaction is rolled back and the previous catalog
    /// is left as it was.
    pub fn replace_all(&mut self, records: &[BlockRecord], chunk_size: usize) -> Result<usize> {
        let encoded = records
            .iter()
            .map(|r| serde_json::to_string(&r.variants))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM blocks", params![])?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO blocks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                COLUMNS
            ))?;

            let chunk_size = chunk_size.max(1);
            for (chunk_index, chunk) in records.chunks(chunk_size).enumerate() {
                let offset = chunk_index * chunk_size;
                for (i, record) in chunk.iter().enumerate() {
                    stmt.execute(params![
                        record.block_id,
                        record.mod_id,
                        record.block_name,
                        record.jar_slug,
                        record.texture64,
                        record.entry_name,
                        encoded[offset + i],
                    ])?;
                }
                debug!(chunk = chunk_index, rows = chunk.len(), "inserted chunk");
            }
        }

        tx.commit()?;
        debug!(removed, inserted = records.len(), "replaced catalog");
        Ok(records.len())
    }

    /// Point lookup by composite key.
    pub fn get(&self, key: &BlockKey) -> Result<Option<BlockRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM blocks WHERE blockId = ?1 AND modId = ?2", COLUMNS),
                params![key.block_id, key.mod_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// First record (in insertion order) with the given block ID.
    pub fn find_by_block_id(&self, block_id: &str) -> Result<Option<BlockRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM blocks WHERE blockId = ?1 ORDER BY rowid LIMIT 1",
                    COLUMNS
                ),
                params![block_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Records whose block ID starts with `prefix`, case-insensitively.
    ///
    /// `%` and `_` in the prefix match literally.
    pub fn find_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<BlockRecord>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        self.query(
            &format!(
                "SELECT {} FROM blocks WHERE lower(blockId) LIKE ?1 ESCAPE '\\' \
                 ORDER BY blockId, modId LIMIT ?2",
                COLUMNS
            ),
            params![pattern, sql_limit(Some(limit))],
        )
    }

    /// Records with a texture, in insertion order. `None` means no limit.
    pub fn textured(&self, limit: Option<usize>) -> Result<Vec<BlockRecord>> {
        self.query(
            &format!(
                "SELECT {} FROM blocks WHERE texture64 IS NOT NULL ORDER BY rowid LIMIT ?1",
                COLUMNS
            ),
            params![sql_limit(limit)],
        )
    }

    /// Every record, in insertion order.
    pub fn all(&self) -> Result<Vec<BlockRecord>> {
        self.query(&format!("SELECT {} FROM blocks ORDER BY rowid", COLUMNS), params![])
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM blocks", params![], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<BlockRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<BlockRecord> {
    let variants: String = row.get(6)?;
    let variants: Vec<VariantSpec> = serde_json::from_str(&variants)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(BlockRecord {
        block_id: row.get(0)?,
        mod_id: row.get(1)?,
        block_name: row.get(2)?,
        jar_slug: row.get(3)?,
        texture64: row.get(4)?,
        entry_name: row.get(5)?,
        variants,
    })
}

/// SQLite treats a negative LIMIT as unbounded.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
