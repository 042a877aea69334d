use std::time::Duration;

use rusqlite::OpenFlags;

use crate::config::ConnectionSpec;
use crate::driver::{Driver, DriverConnection, RawResult};
use crate::error::DispatchError;

use super::query::run_statement;

/// Oldest bundled/system `SQLite` accepted (3.24.0, first release with UPSERT).
pub const MIN_SQLITE_VERSION: u32 = 3_024_000;

/// `SQLite` through rusqlite.
///
/// Only the `dbname` field of the connection string is used, as the database path
/// (`:memory:` works). Host, port, user and password are accepted and ignored.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    busy_timeout: Duration,
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteDriver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn compile_options() -> Result<Vec<String>, DispatchError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        let mut stmt = conn.prepare("PRAGMA compile_options")?;
        let options = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(options)
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteSession;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn library_init(&self) -> Result<(), DispatchError> {
        tracing::debug!("using SQLite {}", rusqlite::version());
        Ok(())
    }

    fn library_end(&self) {}

    fn is_thread_safe(&self) -> bool {
        match Self::compile_options() {
            Ok(options) => !options.iter().any(|opt| opt == "THREADSAFE=0"),
            Err(err) => {
                tracing::error!("could not read SQLite compile options: {err}");
                false
            }
        }
    }

    fn client_version(&self) -> u32 {
        u32::try_from(rusqlite::version_number()).unwrap_or(0)
    }

    fn min_client_version(&self) -> u32 {
        MIN_SQLITE_VERSION
    }

    fn connect(&self, spec: &ConnectionSpec) -> Result<SqliteSession, DispatchError> {
        if spec.database.trim().is_empty() {
            return Err(DispatchError::Config(
                "SQLite needs a database path in the dbname field".into(),
            ));
        }
        let conn = rusqlite::Connection::open_with_flags(&spec.database, OpenFlags::default())
            .map_err(|e| {
                DispatchError::Connection(format!("failed to open SQLite database: {e}"))
            })?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(SqliteSession { conn })
    }

    fn session_setup_statements(&self) -> Vec<String> {
        vec![
            "PRAGMA encoding = 'UTF-8'".to_owned(),
            "PRAGMA journal_mode = WAL".to_owned(),
        ]
    }
}

/// One open `SQLite` database handle.
#[derive(Debug)]
pub struct SqliteSession {
    conn: rusqlite::Connection,
}

impl DriverConnection for SqliteSession {
    fn execute(&mut self, sql: &str) -> Result<(), DispatchError> {
        run_statement(&self.conn, sql, false).map(|_| ())
    }

    fn query(&mut self, sql: &str) -> Result<Option<RawResult>, DispatchError> {
        run_statement(&self.conn, sql, true)
    }

    fn escape(&self, input: &str) -> String {
        input.replace('\'', "''")
    }

    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DispatchError> {
        match (enabled, self.conn.is_autocommit()) {
            (true, false) => self.conn.execute_batch("COMMIT")?,
            (false, true) => self.conn.execute_batch("BEGIN")?,
            _ => {}
        }
        Ok(())
    }

    fn close(self) -> Result<(), DispatchError> {
        self.conn
            .close()
            .map_err(|(_, err)| DispatchError::Sqlite(err))
    }
}
