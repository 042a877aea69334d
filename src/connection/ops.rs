use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::Ordering;

use crate::callback::{CallbackResult, CorrelationId, SubQueryId};
use crate::driver::Driver;
use crate::error::DispatchError;
use crate::utils::lock_recover;
use crate::work::{CallbackQuery, WorkItem};

use super::Connection;

impl<D: Driver> Connection<D> {
    pub(super) fn ensure_connected(&self) -> Result<(), DispatchError> {
        if self.shared.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(DispatchError::NotConnected)
        }
    }

    /// Queue a statement for the worker, or add it to the open batch.
    ///
    /// # Errors
    /// [`DispatchError::NotConnected`] without a session, [`DispatchError::EmptyStatement`] for
    /// an empty statement.
    pub fn queue_execute(&self, sql: impl Into<String>) -> Result<(), DispatchError> {
        let sql = sql.into();
        ensure_statement(&sql)?;

        // The batch lock covers the connected check and the push, so neither a concurrent
        // commit nor a shutdown can slip in between.
        let mut batch = lock_recover(&self.batch, "Connection::queue_execute");
        self.ensure_connected()?;
        if let Err(sql) = batch.try_append(sql) {
            self.shared.queue.push(WorkItem::Plain(sql));
        }
        Ok(())
    }

    /// Queue `SELECT 1` to keep the session (and the driver's reconnect path) alive.
    ///
    /// # Errors
    /// [`DispatchError::NotConnected`] without a session.
    pub fn ping(&self) -> Result<(), DispatchError> {
        self.queue_execute("SELECT 1")
    }

    /// Start collecting [`Connection::queue_execute`] statements instead of queueing them.
    ///
    /// # Errors
    /// [`DispatchError::BatchAlreadyOpen`] when a batch is open; batches don't nest.
    pub fn begin_batch(&self) -> Result<(), DispatchError> {
        lock_recover(&self.batch, "Connection::begin_batch")
            .begin()
            .inspect_err(|err| tracing::error!("{err}"))
    }

    /// Queue every batched statement as one contiguous run and close the batch.
    /// Returns the number of statements queued.
    ///
    /// # Errors
    /// [`DispatchError::NotConnected`] without a session (the batch stays open),
    /// [`DispatchError::NoBatchOpen`] when no batch is open.
    pub fn commit_batch(&self) -> Result<usize, DispatchError> {
        let mut batch = lock_recover(&self.batch, "Connection::commit_batch");
        self.ensure_connected()?;
        let statements = batch
            .commit()
            .inspect_err(|err| tracing::error!("{err}"))?;
        let count = statements.len();
        self.shared
            .queue
            .push_many(statements.into_iter().map(WorkItem::Plain));
        tracing::debug!("committed batch of {count} statements");
        Ok(count)
    }

    /// Close the batch without queueing anything. Returns the number of statements dropped.
    ///
    /// # Errors
    /// [`DispatchError::NoBatchOpen`] when no batch is open.
    pub fn cancel_batch(&self) -> Result<usize, DispatchError> {
        lock_recover(&self.batch, "Connection::cancel_batch")
            .cancel()
            .inspect_err(|err| tracing::error!("{err}"))
    }

    #[must_use]
    pub fn batch_open(&self) -> bool {
        lock_recover(&self.batch, "Connection::batch_open").is_open()
    }

    /// Queue statements whose results are filed under `id` once the worker has run them all.
    /// Callback requests always go straight to the queue, even while a batch is open.
    ///
    /// # Errors
    /// [`DispatchError::NotConnected`] without a session, [`DispatchError::EmptyStatement`] when
    /// `queries` is empty or holds an empty statement.
    pub fn queue_callback(
        &self,
        id: CorrelationId,
        queries: BTreeMap<SubQueryId, String>,
        message: Option<String>,
    ) -> Result<(), DispatchError> {
        if queries.is_empty() {
            return Err(DispatchError::EmptyStatement);
        }
        for sql in queries.values() {
            ensure_statement(sql)?;
        }
        let _batch = lock_recover(&self.batch, "Connection::queue_callback");
        self.ensure_connected()?;
        self.shared
            .queue
            .push(WorkItem::Callback(CallbackQuery::new(id, queries, message)));
        Ok(())
    }

    /// [`Connection::queue_callback`] for a single statement, filed under sub-query id 0.
    ///
    /// # Errors
    /// Same as [`Connection::queue_callback`].
    pub fn queue_callback_query(
        &self,
        id: CorrelationId,
        sql: impl Into<String>,
        message: Option<String>,
    ) -> Result<(), DispatchError> {
        self.queue_callback(id, BTreeMap::from([(0, sql.into())]), message)
    }

    /// Take every finished callback result.
    #[must_use]
    pub fn drain_callback_results(&self) -> HashMap<CorrelationId, CallbackResult> {
        self.shared.callbacks.drain_all()
    }

    /// Items waiting for the worker (not counting an open batch).
    #[must_use]
    pub fn pending_work(&self) -> usize {
        self.shared.queue.len()
    }
}

pub(super) fn ensure_statement(sql: &str) -> Result<(), DispatchError> {
    if sql.trim().is_empty() {
        tracing::error!("empty statement submitted");
        Err(DispatchError::EmptyStatement)
    } else {
        Ok(())
    }
}
