// SQLite driver binding (rusqlite).
//
// - driver: library lifecycle, connect, and the per-session handle
// - query: statement execution and row extraction

pub mod driver;
pub mod query;

pub use driver::{MIN_SQLITE_VERSION, SqliteDriver, SqliteSession};

/// A dispatch connection backed by `SQLite`.
pub type SqliteDispatcher = crate::Connection<SqliteDriver>;
