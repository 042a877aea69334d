use crate::driver::{Driver, DriverConnection};
use crate::error::DispatchError;
use crate::results::ResultSet;
use crate::utils::lock_recover;
use crate::work::{perform_query, run_statement};

use super::Connection;
use super::ops::ensure_statement;

impl<D: Driver> Connection<D> {
    /// Run `func` on the driver handle under the connection mutex, on the calling thread.
    ///
    /// Waits for whatever currently holds the mutex, including a worker draining a large batch.
    pub(super) fn with_session<R>(
        &self,
        func: impl FnOnce(&mut D::Connection) -> Result<R, DispatchError>,
    ) -> Result<R, DispatchError> {
        self.ensure_connected()?;
        let mut guard = lock_recover(&self.shared.handle, "Connection::with_session");
        let conn = guard.as_mut().ok_or(DispatchError::NotConnected)?;
        func(conn)
    }

    /// Execute a statement now, bypassing the queue, and discard any result.
    ///
    /// # Errors
    /// [`DispatchError::NotConnected`], [`DispatchError::EmptyStatement`], or the driver's error.
    pub fn execute_now(&self, sql: &str) -> Result<(), DispatchError> {
        ensure_statement(sql)?;
        self.with_session(|conn| run_statement(conn, sql))
    }

    /// Run a query now, bypassing the queue. `Ok(None)` when it produced no rows or no columns.
    ///
    /// # Errors
    /// [`DispatchError::NotConnected`], [`DispatchError::EmptyStatement`], or the driver's error.
    pub fn fetch(&self, sql: &str) -> Result<Option<ResultSet>, DispatchError> {
        ensure_statement(sql)?;
        self.with_session(|conn| perform_query(conn, sql))
    }

    /// First column of the first row as `i32`; 0 when absent or on any failure.
    #[must_use]
    pub fn query_i32(&self, sql: &str) -> i32 {
        match self.fetch(sql) {
            Ok(Some(result)) => result.field(0).map_or(0, |field| field.get_i32()),
            Ok(None) | Err(_) => 0,
        }
    }

    /// Escape `input` for a quoted SQL literal using the live session.
    /// Returns the input unchanged when it is empty or there is no session.
    #[must_use]
    pub fn escape_string(&self, input: &str) -> String {
        if input.is_empty() {
            return String::new();
        }
        self.with_session(|conn| Ok(conn.escape(input)))
            .unwrap_or_else(|_| input.to_owned())
    }
}
