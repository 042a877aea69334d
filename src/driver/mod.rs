//! Driver binding: the seam between the dispatch engine and a concrete database client.
//!
//! A [`Driver`] covers the process-wide half (library init/teardown, connecting); a
//! [`DriverConnection`] is one open, non-thread-safe session handle. The engine only ever
//! touches a `DriverConnection` while holding the owning connection's mutex.

pub(crate) mod library;

use crate::config::ConnectionSpec;
use crate::error::DispatchError;

pub use library::live_connections;

/// Rows produced by one statement, copied out of the driver as nullable text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Process-wide half of a database client library.
pub trait Driver: Send + Sync + 'static {
    type Connection: DriverConnection;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// One-time library setup, run when the first live connection of this driver type starts.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when the library cannot be initialized.
    fn library_init(&self) -> Result<(), DispatchError>;

    /// Library teardown, run when the last live connection of this driver type stops.
    fn library_end(&self);

    /// Whether the client library may be used from more than one thread.
    fn is_thread_safe(&self) -> bool;

    /// Version of the client library, encoded so that newer versions compare greater.
    fn client_version(&self) -> u32;

    /// Oldest acceptable [`Driver::client_version`].
    fn min_client_version(&self) -> u32;

    /// Open a session. Implementations force a UTF-8 client charset.
    ///
    /// # Errors
    /// Returns [`DispatchError::Connection`] (or a driver error) when the session cannot be opened.
    fn connect(&self, spec: &ConnectionSpec) -> Result<Self::Connection, DispatchError>;

    /// Best-effort statements queued right after a successful connect.
    fn session_setup_statements(&self) -> Vec<String> {
        Vec::new()
    }
}

/// One open session. `Send` so it can move into the worker, but never shared unguarded.
pub trait DriverConnection: Send + 'static {
    /// Run a statement and discard whatever it produces.
    ///
    /// # Errors
    /// Returns the driver's error when the statement is rejected.
    fn execute(&mut self, sql: &str) -> Result<(), DispatchError>;

    /// Run a statement and buffer any rows it produces. `Ok(None)` means no result set.
    ///
    /// # Errors
    /// Returns the driver's error when the statement is rejected.
    fn query(&mut self, sql: &str) -> Result<Option<RawResult>, DispatchError>;

    /// Escape a string for inclusion in a quoted SQL literal.
    fn escape(&self, input: &str) -> String;

    /// # Errors
    /// Returns the driver's error when the mode cannot be changed.
    fn set_autocommit(&mut self, enabled: bool) -> Result<(), DispatchError>;

    /// Reconnect transparently when the server drops the session. Drivers without such a
    /// mode accept the call and do nothing.
    ///
    /// # Errors
    /// Returns the driver's error when the option is rejected.
    fn set_auto_reconnect(&mut self, enabled: bool) -> Result<(), DispatchError> {
        let _ = enabled;
        Ok(())
    }

    /// Close the session.
    ///
    /// # Errors
    /// Returns the driver's error when the close itself fails; the handle is gone either way.
    fn close(self) -> Result<(), DispatchError>
    where
        Self: Sized;
}
