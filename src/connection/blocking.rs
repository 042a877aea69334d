use std::sync::Arc;

use crate::driver::Driver;
use crate::error::DispatchError;
use crate::results::ResultSet;

use super::Connection;

/// Run a blocking connection call on tokio's blocking pool.
async fn run_blocking<D, F, R>(conn: Arc<Connection<D>>, func: F) -> Result<R, DispatchError>
where
    D: Driver,
    F: FnOnce(&Connection<D>) -> Result<R, DispatchError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || func(&conn))
        .await
        .map_err(|e| DispatchError::Worker(format!("blocking task join error: {e}")))?
}

impl<D: Driver> Connection<D> {
    /// [`Connection::fetch`] without blocking an async runtime thread.
    ///
    /// # Errors
    /// Same as [`Connection::fetch`], plus [`DispatchError::Worker`] if the blocking task dies.
    pub async fn fetch_async(
        self: &Arc<Self>,
        sql: impl Into<String>,
    ) -> Result<Option<ResultSet>, DispatchError> {
        let sql = sql.into();
        run_blocking(Arc::clone(self), move |conn| conn.fetch(&sql)).await
    }

    /// [`Connection::execute_now`] without blocking an async runtime thread.
    ///
    /// # Errors
    /// Same as [`Connection::execute_now`], plus [`DispatchError::Worker`] if the blocking task
    /// dies.
    pub async fn execute_now_async(
        self: &Arc<Self>,
        sql: impl Into<String>,
    ) -> Result<(), DispatchError> {
        let sql = sql.into();
        run_blocking(Arc::clone(self), move |conn| conn.execute_now(&sql)).await
    }
}
