//! Units of deferred work executed by the connection's worker.

use std::collections::BTreeMap;

use crate::callback::{CallbackResult, CallbackStore, CorrelationId, SubQueryId};
use crate::driver::DriverConnection;
use crate::error::DispatchError;
use crate::results::ResultSet;

/// A set of statements whose results are parked in the [`CallbackStore`] under `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    pub id: CorrelationId,
    pub queries: BTreeMap<SubQueryId, String>,
    pub message: Option<String>,
}

impl CallbackQuery {
    #[must_use]
    pub fn new(
        id: CorrelationId,
        queries: BTreeMap<SubQueryId, String>,
        message: Option<String>,
    ) -> Self {
        Self {
            id,
            queries,
            message,
        }
    }

    /// A request holding one statement under sub-query id 0.
    #[must_use]
    pub fn single(id: CorrelationId, query: impl Into<String>, message: Option<String>) -> Self {
        Self::new(id, BTreeMap::from([(0, query.into())]), message)
    }
}

/// A queued unit of work. Items are moved into the queue and never touched by the producer again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// One statement whose result, if any, is discarded.
    Plain(String),
    /// Statements whose results are collected for later retrieval.
    Callback(CallbackQuery),
}

impl WorkItem {
    /// Run the item on a driver connection the caller already holds exclusively.
    ///
    /// Failures are logged and stay inside this item.
    pub(crate) fn execute<C: DriverConnection>(self, conn: &mut C, store: &CallbackStore) {
        match self {
            WorkItem::Plain(sql) => {
                debug_assert!(!sql.is_empty(), "empty plain statement reached the worker");
                let _ = run_statement(conn, &sql);
            }
            WorkItem::Callback(request) => {
                debug_assert!(
                    !request.queries.is_empty(),
                    "callback {} has no statements",
                    request.id
                );
                let mut result = CallbackResult::new(request.message);
                for (sub_id, sql) in &request.queries {
                    result.set_result(*sub_id, perform_query(conn, sql).unwrap_or(None));
                }
                store.register(request.id, result);
            }
        }
    }
}

/// Execute and discard; logs the statement on failure.
pub(crate) fn run_statement<C: DriverConnection>(
    conn: &mut C,
    sql: &str,
) -> Result<(), DispatchError> {
    conn.execute(sql).inspect_err(|err| {
        tracing::error!(error = %err, query = sql, "SQL error");
    })
}

/// Execute and materialize; zero-row and zero-field results come back as `Ok(None)`.
pub(crate) fn perform_query<C: DriverConnection>(
    conn: &mut C,
    sql: &str,
) -> Result<Option<ResultSet>, DispatchError> {
    let raw = conn.query(sql).inspect_err(|err| {
        tracing::error!(error = %err, query = sql, "SQL error");
    })?;
    Ok(raw.and_then(ResultSet::from_raw))
}
