// Durable credential storage
//
// A small key/value table in a local SQLite file. An absent key is the
// normal not-yet-authenticated state, never an error.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const SERVER_CODE_KEY: &str = "server_code";

const UPSERT_SQL: &str =
    "INSERT INTO credentials (key, value) VALUES (?1, ?2) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// Store for the token pair and the login server code.
///
/// Clones share the underlying connection. Every operation serializes on an
/// internal lock and paired writes run in one transaction, so a half-written
/// token pair can never be observed.
#[derive(Clone)]
pub struct CredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl CredentialStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        tracing::debug!("Opening credential store: {}", path.display());
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open credential store: {}", path.display()))?;

        Self::init(conn)
    }

    /// Non-durable store, handy for tooling and tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory credential store")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS credentials (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to initialize credential store schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persist the access/refresh pair in a single transaction.
    pub async fn save_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .context("Failed to start credential store transaction")?;
        tx.execute(UPSERT_SQL, params![ACCESS_TOKEN_KEY, access])?;
        tx.execute(UPSERT_SQL, params![REFRESH_TOKEN_KEY, refresh])?;
        tx.commit().context("Failed to save tokens")?;
        Ok(())
    }

    pub async fn save_server_code(&self, code: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(UPSERT_SQL, params![SERVER_CODE_KEY, code])
            .context("Failed to save server code")?;
        Ok(())
    }

    /// Drop both tokens in a single transaction.
    pub async fn remove_tokens(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .context("Failed to start credential store transaction")?;
        tx.execute(
            "DELETE FROM credentials WHERE key = ?1",
            params![ACCESS_TOKEN_KEY],
        )?;
        tx.execute(
            "DELETE FROM credentials WHERE key = ?1",
            params![REFRESH_TOKEN_KEY],
        )?;
        tx.commit().context("Failed to remove tokens")?;
        Ok(())
    }

    pub async fn remove_server_code(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM credentials WHERE key = ?1",
            params![SERVER_CODE_KEY],
        )
        .context("Failed to remove server code")?;
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        self.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn server_code(&self) -> Result<Option<String>> {
        self.get(SERVER_CODE_KEY).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT value FROM credentials WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read credential store")
    }
}
