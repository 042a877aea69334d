use crate::error::DispatchError;

/// Client-side statement batch, open between `begin` and `commit`/`cancel`.
///
/// This is not a database transaction: a committed batch is enqueued as one contiguous run of
/// plain items, and each statement still runs (and can fail) on its own.
#[derive(Debug, Default)]
pub struct StatementBatch {
    open: Option<Vec<String>>,
}

impl StatementBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`DispatchError::BatchAlreadyOpen`] when a batch is already open; batches don't
    /// nest.
    pub fn begin(&mut self) -> Result<(), DispatchError> {
        if self.open.is_some() {
            return Err(DispatchError::BatchAlreadyOpen);
        }
        self.open = Some(Vec::new());
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Number of statements held by the open batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.open.as_ref().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a statement when a batch is open; hands the statement back otherwise.
    ///
    /// # Errors
    /// Returns the statement unchanged when no batch is open.
    pub fn try_append(&mut self, sql: String) -> Result<(), String> {
        match self.open.as_mut() {
            Some(statements) => {
                statements.push(sql);
                Ok(())
            }
            None => Err(sql),
        }
    }

    /// Close the batch and return its statements in submission order.
    ///
    /// # Errors
    /// Returns [`DispatchError::NoBatchOpen`] when there is nothing to commit.
    pub fn commit(&mut self) -> Result<Vec<String>, DispatchError> {
        self.open.take().ok_or(DispatchError::NoBatchOpen)
    }

    /// Close the batch, dropping its statements. Returns how many were discarded.
    ///
    /// # Errors
    /// Returns [`DispatchError::NoBatchOpen`] when no batch is open.
    pub fn cancel(&mut self) -> Result<usize, DispatchError> {
        self.open
            .take()
            .map(|statements| statements.len())
            .ok_or(DispatchError::NoBatchOpen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_twice_is_rejected() {
        let mut batch = StatementBatch::new();
        batch.begin().expect("first begin");
        assert!(matches!(batch.begin(), Err(DispatchError::BatchAlreadyOpen)));
        assert!(batch.is_open());
    }

    #[test]
    fn append_only_while_open() {
        let mut batch = StatementBatch::new();
        assert_eq!(batch.try_append("A".into()), Err("A".to_string()));

        batch.begin().expect("begin");
        batch.try_append("A".into()).expect("open");
        batch.try_append("B".into()).expect("open");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.commit().expect("commit"), vec!["A", "B"]);
        assert!(!batch.is_open());
        assert!(matches!(batch.commit(), Err(DispatchError::NoBatchOpen)));
    }

    #[test]
    fn cancel_discards_and_closes() {
        let mut batch = StatementBatch::new();
        batch.begin().expect("begin");
        batch.try_append("A".into()).expect("open");
        assert_eq!(batch.cancel().expect("cancel"), 1);
        assert!(!batch.is_open());
        assert!(batch.is_empty());
        batch.begin().expect("begin again after cancel");
    }
}
