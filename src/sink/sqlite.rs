//! SQLite sink implementation
//!
//! Stores posts and network edges in a local SQLite database. Re-crawled
//! pages overlap earlier ones by design (sessions compose into a
//! backward-then-forward sweep), so all inserts are `INSERT OR IGNORE`.

use crate::api::{NeighborMode, Post};
use crate::sink::traits::{Sink, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed sink
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better write performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Counts stored posts
    pub fn count_posts(&self) -> SinkResult<u64> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Counts stored edges, optionally restricted to one account
    pub fn count_edges(&self, account: Option<&str>) -> SinkResult<u64> {
        let count: u64 = match account {
            Some(account) => self.conn.query_row(
                "SELECT COUNT(*) FROM edges WHERE account = ?1",
                params![account],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Highest post id stored so far, if any
    ///
    /// Useful as the `since_id` for a follow-up crawl after a restart.
    pub fn latest_post_id(&self) -> SinkResult<Option<u64>> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM posts", [], |row| row.get(0))?;
        Ok(id.map(|id| id as u64))
    }
}

/// Creates the tables if they do not exist yet
fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            created_at TEXT NOT NULL,
            text TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            author_screen_name TEXT NOT NULL,
            collected_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS edges (
            account TEXT NOT NULL,
            mode TEXT NOT NULL,
            neighbor_id INTEGER NOT NULL,
            collected_at TEXT NOT NULL,
            PRIMARY KEY (account, mode, neighbor_id)
        );

        CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at);
        CREATE INDEX IF NOT EXISTS idx_edges_account ON edges (account);
    ",
    )
}

#[async_trait]
impl Sink for SqliteSink {
    async fn write_posts(&mut self, posts: &[Post]) -> SinkResult<()> {
        let collected_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO posts
                 (id, created_at, text, author_id, author_screen_name, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for post in posts {
                stmt.execute(params![
                    post.id as i64,
                    post.created_at.to_rfc3339(),
                    post.text,
                    post.author_id as i64,
                    post.author_screen_name,
                    collected_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn write_edges(
        &mut self,
        account: &str,
        mode: NeighborMode,
        neighbor_ids: &[u64],
    ) -> SinkResult<()> {
        let collected_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO edges (account, mode, neighbor_id, collected_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for neighbor_id in neighbor_ids {
                stmt.execute(params![
                    account,
                    mode.as_str(),
                    *neighbor_id as i64,
                    collected_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_post(id: u64) -> Post {
        Post {
            id,
            created_at: Utc.timestamp_opt(1_504_000_000, 0).unwrap(),
            text: format!("post {}", id),
            author_id: 9,
            author_screen_name: "author".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_posts_and_count() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        sink.write_posts(&[sample_post(1), sample_post(2)]).await.unwrap();

        assert_eq!(sink.count_posts().unwrap(), 2);
        assert_eq!(sink.latest_post_id().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_duplicate_posts_ignored() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        sink.write_posts(&[sample_post(5)]).await.unwrap();
        sink.write_posts(&[sample_post(5), sample_post(6)]).await.unwrap();

        assert_eq!(sink.count_posts().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_write_edges_per_mode() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        sink.write_edges("alice", NeighborMode::Friends, &[1, 2, 3])
            .await
            .unwrap();
        sink.write_edges("alice", NeighborMode::Followers, &[1])
            .await
            .unwrap();
        sink.write_edges("bob", NeighborMode::Friends, &[2])
            .await
            .unwrap();

        assert_eq!(sink.count_edges(Some("alice")).unwrap(), 4);
        assert_eq!(sink.count_edges(None).unwrap(), 5);
    }

    #[tokio::test]
    async fn test_empty_database_has_no_latest_id() {
        let sink = SqliteSink::new_in_memory().unwrap();
        assert_eq!(sink.latest_post_id().unwrap(), None);
    }
}
