use std::sync::Arc;

use super::row::column_index_for;
use super::{Field, Row};
use crate::driver::RawResult;

/// Cursor over the rows a statement produced.
///
/// A result set is positioned on its first row when built. [`ResultSet::next_row`] replaces
/// the current row, so any borrow of the previous row ends there. Results with zero rows or
/// zero columns are never built; see [`ResultSet::from_raw`].
#[derive(Debug, Clone)]
pub struct ResultSet {
    column_names: Arc<Vec<String>>,
    row_count: u64,
    current: Option<Row>,
    pending: std::vec::IntoIter<Row>,
}

impl ResultSet {
    /// Materialize a driver result, or `None` when it holds no rows or no columns.
    #[must_use]
    pub fn from_raw(raw: RawResult) -> Option<Self> {
        let RawResult { columns, rows } = raw;
        if columns.is_empty() || rows.is_empty() {
            return None;
        }

        let column_names = Arc::new(columns);
        let column_index = Arc::new(column_index_for(&column_names));
        let field_count = column_names.len();
        let row_count = rows.len() as u64;

        let materialized: Vec<Row> = rows
            .into_iter()
            .map(|values| {
                let mut fields: Vec<Field> = values.into_iter().map(Field::new).collect();
                fields.resize_with(field_count, Field::null);
                Row::new(Arc::clone(&column_names), Arc::clone(&column_index), fields)
            })
            .collect();

        let mut pending = materialized.into_iter();
        let current = pending.next();
        Some(Self {
            column_names,
            row_count,
            current,
            pending,
        })
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.column_names.len()
    }

    /// Total rows the statement produced, regardless of cursor position.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// The row under the cursor; `None` once the cursor has moved past the last row.
    #[must_use]
    pub fn current_row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    /// A field of the current row.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.current.as_ref().and_then(|row| row.get(index))
    }

    /// Advance the cursor. Returns `false` (and clears the current row) when exhausted.
    pub fn next_row(&mut self) -> bool {
        self.current = self.pending.next();
        self.current.is_some()
    }
}

impl std::ops::Index<usize> for ResultSet {
    type Output = Field;

    /// # Panics
    /// Panics when the cursor is exhausted or `index` is out of range.
    fn index(&self, index: usize) -> &Self::Output {
        match self.current.as_ref() {
            Some(row) => &row[index],
            None => panic!("ResultSet cursor is past the last row"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> RawResult {
        RawResult {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test]
    fn empty_results_are_absent() {
        assert!(ResultSet::from_raw(raw(&["a"], vec![])).is_none());
        assert!(ResultSet::from_raw(raw(&[], vec![vec![]])).is_none());
    }

    #[test]
    fn cursor_starts_on_first_row_and_walks_forward() {
        let mut rs = ResultSet::from_raw(raw(
            &["id", "name"],
            vec![
                vec![Some("1"), Some("alice")],
                vec![Some("2"), None],
            ],
        ))
        .expect("rows present");

        assert_eq!(rs.field_count(), 2);
        assert_eq!(rs.row_count(), 2);
        assert_eq!(rs[0].get_i32(), 1);
        assert_eq!(
            rs.current_row().and_then(|r| r.get_by_name("name")).and_then(Field::as_str),
            Some("alice")
        );

        assert!(rs.next_row());
        assert_eq!(rs[0].get_i32(), 2);
        assert!(rs[1].is_null());

        assert!(!rs.next_row());
        assert!(rs.current_row().is_none());
        assert!(rs.field(0).is_none());
        assert!(!rs.next_row());
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let rs = ResultSet::from_raw(raw(&["a", "b"], vec![vec![Some("x")]])).expect("rows");
        assert_eq!(rs.current_row().map(Row::len), Some(2));
        assert!(rs[1].is_null());
    }
}
