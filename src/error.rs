use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL execution error: {0}")]
    Execution(String),

    #[error("Not connected to a database")]
    NotConnected,

    #[error("Connection is already initialized")]
    AlreadyInitialized,

    #[error("A statement batch is already open")]
    BatchAlreadyOpen,

    #[error("No statement batch is open")]
    NoBatchOpen,

    #[error("Empty statement submitted")]
    EmptyStatement,

    #[error("Driver library is not thread-safe")]
    LibraryNotThreadSafe,

    #[error("Driver library version {found} is older than the required {required}")]
    VersionTooOld { found: u32, required: u32 },

    #[error("Worker error: {0}")]
    Worker(String),
}
