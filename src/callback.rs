//! Results of callback work, parked until a consumer drains them.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::results::ResultSet;
use crate::utils::lock_recover;

/// Caller-chosen key matching a drained result to the request that produced it.
pub type CorrelationId = u64;

/// Key of one statement inside a callback request.
pub type SubQueryId = u8;

/// Everything one callback request produced: a result (or absence) per sub-query, plus the
/// message the caller attached when submitting.
#[derive(Debug, Clone, Default)]
pub struct CallbackResult {
    message: Option<String>,
    results: HashMap<SubQueryId, Option<ResultSet>>,
}

impl CallbackResult {
    #[must_use]
    pub fn new(message: Option<String>) -> Self {
        Self {
            message,
            results: HashMap::new(),
        }
    }

    pub(crate) fn set_result(&mut self, id: SubQueryId, result: Option<ResultSet>) {
        self.results.insert(id, result);
    }

    /// The result for a sub-query, or `None` when it produced no rows, failed, or was never
    /// submitted.
    #[must_use]
    pub fn result(&self, id: SubQueryId) -> Option<&ResultSet> {
        self.results.get(&id).and_then(Option::as_ref)
    }

    /// Take ownership of a sub-query's result so its cursor can be advanced.
    pub fn take_result(&mut self, id: SubQueryId) -> Option<ResultSet> {
        self.results.get_mut(&id).and_then(Option::take)
    }

    /// Whether `id` was part of the request, whatever it produced.
    #[must_use]
    pub fn ran(&self, id: SubQueryId) -> bool {
        self.results.contains_key(&id)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Sub-query ids in ascending order.
    #[must_use]
    pub fn sub_query_ids(&self) -> Vec<SubQueryId> {
        let mut ids: Vec<SubQueryId> = self.results.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Map of finished callback results, written by the worker and drained by consumers.
///
/// Guarded by its own mutex, never the connection mutex, so neither side waits on a running
/// statement.
#[derive(Debug, Default)]
pub struct CallbackStore {
    finished: Mutex<HashMap<CorrelationId, CallbackResult>>,
}

impl CallbackStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File a finished result. An undrained result under the same id is discarded.
    ///
    /// Returns `true` when an older result was overwritten.
    pub fn register(&self, id: CorrelationId, result: CallbackResult) -> bool {
        let replaced = lock_recover(&self.finished, "CallbackStore::register")
            .insert(id, result)
            .is_some();
        if replaced {
            tracing::warn!(
                "callback id {id} already had an undrained result; discarding the old one"
            );
        }
        replaced
    }

    /// Take every finished result, leaving the store empty.
    #[must_use]
    pub fn drain_all(&self) -> HashMap<CorrelationId, CallbackResult> {
        std::mem::take(&mut *lock_recover(&self.finished, "CallbackStore::drain_all"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock_recover(&self.finished, "CallbackStore::len").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
