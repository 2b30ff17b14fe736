use crate::model::{InstrumentQuote, MarketSnapshot, StorageError};
use crate::storage::SnapshotStore;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use std::fs;
use std::path::Path;
use tracing::warn;

pub struct SqliteStore {
    conn: Connection,
    retention_limit: usize,
}

impl SqliteStore {
    /// Opens the ledger at `db_path`, creating parent directories and tables as needed.
    pub fn new(db_path: &Path, retention_limit: usize) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, retention_limit)
    }

    #[cfg(test)]
    pub fn in_memory(retention_limit: usize) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, retention_limit)
    }

    fn with_connection(conn: Connection, retention_limit: usize) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                captured_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quotes (
                snapshot_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                symbol TEXT NOT NULL,
                prev_close REAL NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                change REAL NOT NULL,
                pct_change REAL NOT NULL,
                trades REAL NOT NULL DEFAULT 0,
                volume REAL NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (snapshot_id, position)
            );

            CREATE TABLE IF NOT EXISTS alerts (
                key TEXT PRIMARY KEY,
                alerted_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self {
            conn,
            retention_limit,
        })
    }

    /// Returns true if `key` was never alerted or its last alert is older than `cooldown`.
    pub fn should_alert(&self, key: &str, cooldown: Duration) -> Result<bool, StorageError> {
        let mut stmt = self.conn.prepare("SELECT alerted_at FROM alerts WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;

        if let Some(row) = rows.next()? {
            let alerted_at_str: String = row.get(0)?;
            if alerted_at_str.trim().is_empty() {
                return Ok(true);
            }

            // datetime('now') format
            let alerted_at_naive = NaiveDateTime::parse_from_str(&alerted_at_str, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| StorageError::CorruptRecord(format!("invalid alert time: {}", e)))?;
            let alerted_at: DateTime<Utc> = Utc.from_utc_datetime(&alerted_at_naive);

            Ok(Utc::now().signed_duration_since(alerted_at) > cooldown)
        } else {
            Ok(true)
        }
    }

    pub fn mark_alerted(&self, key: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO alerts (key, alerted_at) VALUES (?1, datetime('now'))",
            params![key],
        )?;
        Ok(())
    }

    fn insert_snapshot(conn: &Connection, snapshot: &MarketSnapshot) -> Result<(), StorageError> {
        conn.execute(
            "INSERT INTO snapshots (captured_at) VALUES (?1)",
            params![snapshot.captured_at.to_rfc3339()],
        )?;
        let snapshot_id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            "INSERT INTO quotes (
                snapshot_id, position, symbol, prev_close, open, high, low,
                close, change, pct_change, trades, volume, value
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for (position, q) in snapshot.quotes.iter().enumerate() {
            stmt.execute(params![
                snapshot_id,
                position as i64,
                &q.symbol,
                q.prev_close,
                q.open,
                q.high,
                q.low,
                q.close,
                q.change,
                q.pct_change,
                q.trades,
                q.volume,
                q.value,
            ])?;
        }
        Ok(())
    }

    fn prune_with(conn: &Connection, keep_last: usize) -> Result<usize, StorageError> {
        conn.execute(
            "DELETE FROM quotes WHERE snapshot_id IN (
                SELECT id FROM snapshots ORDER BY id DESC LIMIT -1 OFFSET ?1
            )",
            params![keep_last as i64],
        )?;
        let removed = conn.execute(
            "DELETE FROM snapshots WHERE id IN (
                SELECT id FROM snapshots ORDER BY id DESC LIMIT -1 OFFSET ?1
            )",
            params![keep_last as i64],
        )?;
        Ok(removed)
    }

    fn load_snapshot(&self, id: i64, captured_at_str: &str) -> Result<MarketSnapshot, StorageError> {
        let captured_at: DateTime<Utc> = DateTime::parse_from_rfc3339(captured_at_str)
            .map_err(|e| StorageError::CorruptRecord(format!("snapshot {}: {}", id, e)))?
            .with_timezone(&Utc);

        let mut stmt = self.conn.prepare(
            "SELECT symbol, prev_close, open, high, low, close, change, pct_change, trades, volume, value
             FROM quotes WHERE snapshot_id = ?1 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| Self::map_quote(row, captured_at))?;

        let mut quotes = Vec::new();
        for quote in rows {
            quotes.push(quote?);
        }
        Ok(MarketSnapshot::new(captured_at, quotes))
    }

    fn map_quote(row: &Row, captured_at: DateTime<Utc>) -> Result<InstrumentQuote, rusqlite::Error> {
        Ok(InstrumentQuote {
            symbol: row.get(0)?,
            prev_close: row.get(1)?,
            open: row.get(2)?,
            high: row.get(3)?,
            low: row.get(4)?,
            close: row.get(5)?,
            change: row.get(6)?,
            pct_change: row.get(7)?,
            trades: row.get(8)?,
            volume: row.get(9)?,
            value: row.get(10)?,
            captured_at,
        })
    }

    fn recent_ids(&self, n: usize) -> Result<Vec<(i64, String)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, captured_at FROM (
                SELECT id, captured_at FROM snapshots ORDER BY id DESC LIMIT ?1
             ) ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![n as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

impl SnapshotStore for SqliteStore {
    fn append(&mut self, snapshot: MarketSnapshot) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        Self::insert_snapshot(&tx, &snapshot)?;
        let removed = Self::prune_with(&tx, self.retention_limit)?;
        tx.commit()?;
        if removed > 0 {
            tracing::debug!("Evicted {} snapshot(s) beyond retention", removed);
        }
        Ok(())
    }

    fn recent(&self, n: usize) -> Vec<MarketSnapshot> {
        let ids = match self.recent_ids(n) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to list snapshots: {}", e);
                return Vec::new();
            }
        };

        let mut snapshots = Vec::with_capacity(ids.len());
        for (id, captured_at) in ids {
            match self.load_snapshot(id, &captured_at) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", id, e),
            }
        }
        snapshots
    }

    fn prune(&mut self, keep_last: usize) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let removed = Self::prune_with(&tx, keep_last)?;
        tx.commit()?;
        Ok(removed)
    }

    fn len(&self) -> usize {
        match self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get::<_, i64>(0))
        {
            Ok(count) => count as usize,
            Err(e) => {
                warn!("Failed to count snapshots: {}", e);
                0
            }
        }
    }

    fn retention_limit(&self) -> usize {
        self.retention_limit
    }
}
