use rusqlite::types::ValueRef;

use crate::driver::RawResult;
use crate::error::DispatchError;

/// Render one `SQLite` column value as nullable text.
///
/// # Errors
/// Returns `DispatchError::Sqlite` if the column cannot be read.
pub fn sqlite_extract_text(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<Option<String>, DispatchError> {
    let value = row.get_ref(idx)?;
    Ok(match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}

/// Run one statement and copy out every row it produces.
///
/// Statements without result columns (DDL, DML) still run to completion and come back as
/// `Ok(None)`.
///
/// # Errors
/// Returns `DispatchError::Sqlite` if preparing, stepping, or reading the statement fails.
pub fn run_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    keep_rows: bool,
) -> Result<Option<RawResult>, DispatchError> {
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut rows_iter = stmt.query([])?;
    if col_count == 0 || !keep_rows {
        // Step to completion so side effects happen even when rows are discarded.
        while rows_iter.next()?.is_some() {}
        return Ok(None);
    }

    let mut rows = Vec::new();
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_text(row, i)?);
        }
        rows.push(values);
    }

    Ok(Some(RawResult {
        columns: column_names,
        rows,
    }))
}
