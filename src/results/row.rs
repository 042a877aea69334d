use std::collections::HashMap;
use std::sync::Arc;

use super::Field;

/// One row of a result, owning its field values.
///
/// Column names and the name-to-index map are shared by every row of the same result set.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    fields: Vec<Field>,
}

impl Row {
    pub(crate) fn new(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            column_names,
            column_index,
            fields,
        }
    }

    /// Build a standalone row, computing its own column index.
    #[must_use]
    pub fn from_parts(column_names: Vec<String>, fields: Vec<Field>) -> Self {
        let index = column_index_for(&column_names);
        Self::new(Arc::new(column_names), Arc::new(index), fields)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a field by column index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Get a field by column name.
    #[must_use]
    pub fn get_by_name(&self, column_name: &str) -> Option<&Field> {
        self.get_column_index(column_name)
            .and_then(|idx| self.fields.get(idx))
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Field;

    fn index(&self, index: usize) -> &Self::Output {
        &self.fields[index]
    }
}

pub(crate) fn column_index_for(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
