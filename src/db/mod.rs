use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tokio::task;
use crate::error::{Result, WikibaconError};

pub mod migrate;

/// Handle to the link cache database.
///
/// Holds only the path; every call opens its own connection on the blocking
/// pool, so concurrent writers from other processes are tolerated by SQLite
/// itself (WAL mode).
#[derive(Debug, Clone)]
pub struct Db {
    path: PathBuf,
}

const PRAGMAS: &str = "PRAGMA journal_mode = WAL; \
     PRAGMA synchronous = NORMAL; \
     PRAGMA temp_store = MEMORY; \
     PRAGMA busy_timeout = 5000;";

impl Db {
    /// Create a new database connection manager
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a closure with a database connection in a blocking task
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = open(&path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| WikibaconError::Io(std::io::Error::other(e.to_string())))?
    }

    /// Apply pending migrations from `migrations_dir`.
    pub async fn migrate(&self, migrations_dir: &Path) -> Result<()> {
        let dir = migrations_dir.to_path_buf();
        self.with_connection(move |conn| migrate::run_migrations(conn, &dir))
            .await
    }
}

fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    // WAL keeps readers unblocked while another search writes a record
    conn.execute_batch(PRAGMAS)?;
    Ok(conn)
}
