mod common;

use std::collections::BTreeMap;
use std::collections::HashMap;

use common::{SCRIPTED_INFO, WAIT, wait_until};
use sql_dispatch::prelude::*;
use sql_dispatch::test_utils::ScriptedDriver;

fn connected(driver: ScriptedDriver) -> Connection<ScriptedDriver> {
    let opts = DispatchOptions::builder().run_setup_statements(false).finish();
    let conn = Connection::with_options(driver, opts);
    conn.initialize(SCRIPTED_INFO).expect("initialize");
    conn
}

/// Drain until `id` shows up, accumulating everything drained on the way.
fn drain_until(
    conn: &Connection<ScriptedDriver>,
    id: CorrelationId,
) -> HashMap<CorrelationId, CallbackResult> {
    let mut seen = HashMap::new();
    let found = wait_until(WAIT, || {
        seen.extend(conn.drain_callback_results());
        seen.contains_key(&id)
    });
    assert!(found, "callback {id} never finished");
    seen
}

#[test]
fn callback_files_each_sub_query_and_keeps_the_message() -> Result<(), DispatchError> {
    let driver = ScriptedDriver::new().with_result(
        "SELECT name FROM users",
        &["name"],
        &[&[Some("ada")], &[Some("grace")]],
    );
    let conn = connected(driver);

    let queries = BTreeMap::from([
        (1, "SELECT name FROM users".to_string()),
        (2, "SELECT name FROM nobody".to_string()),
        (3, "SELECT FAIL".to_string()),
    ]);
    conn.queue_callback(42, queries, Some("hello".into()))?;

    let mut drained = drain_until(&conn, 42);
    let mut result = drained.remove(&42).expect("result for 42");
    assert_eq!(result.message(), Some("hello"));
    assert_eq!(result.sub_query_ids(), vec![1, 2, 3]);
    assert!(result.ran(2));
    assert!(result.result(2).is_none(), "empty result is absent");
    assert!(result.result(3).is_none(), "failed sub-query is absent");
    assert!(!result.ran(9));

    let mut users = result.take_result(1).expect("rows for sub-query 1");
    assert_eq!(users.row_count(), 2);
    assert_eq!(users.column_names(), ["name".to_string()]);
    assert_eq!(users[0].as_str(), Some("ada"));
    assert!(users.next_row());
    assert_eq!(users[0].as_str(), Some("grace"));
    assert!(!users.next_row());
    Ok(())
}

#[test]
fn later_result_for_the_same_id_replaces_the_earlier_one() -> Result<(), DispatchError> {
    let driver = ScriptedDriver::new()
        .with_result("SELECT first", &["v"], &[&[Some("1")]])
        .with_result("SELECT second", &["v"], &[&[Some("2")]]);
    let conn = connected(driver.clone());

    conn.queue_callback_query(7, "SELECT first", Some("one".into()))?;
    conn.queue_callback_query(7, "SELECT second", Some("two".into()))?;
    conn.queue_execute("MARKER")?;
    assert!(wait_until(WAIT, || driver.executed().iter().any(|s| s == "MARKER")));

    let mut drained = conn.drain_callback_results();
    assert_eq!(drained.len(), 1);
    let result = drained.remove(&7).expect("result for 7");
    assert_eq!(result.message(), Some("two"));
    assert_eq!(result.result(0).and_then(|rs| rs.field(0)).map(Field::get_i32), Some(2));
    Ok(())
}

#[test]
fn drain_empties_the_store() -> Result<(), DispatchError> {
    let conn = connected(ScriptedDriver::new());
    assert!(conn.drain_callback_results().is_empty());

    conn.queue_callback_query(1, "SELECT 1", None)?;
    let drained = drain_until(&conn, 1);
    assert_eq!(drained.len(), 1);
    assert!(drained[&1].message().is_none());
    assert!(conn.drain_callback_results().is_empty());
    Ok(())
}

#[test]
fn callbacks_skip_an_open_batch() -> Result<(), DispatchError> {
    let driver = ScriptedDriver::new();
    let conn = connected(driver.clone());

    conn.begin_batch()?;
    conn.queue_execute("BATCHED")?;
    conn.queue_callback_query(5, "SELECT now", None)?;
    let drained = drain_until(&conn, 5);
    assert!(drained.contains_key(&5));
    assert!(!driver.executed().iter().any(|s| s == "BATCHED"));

    assert_eq!(conn.cancel_batch()?, 1);
    Ok(())
}

#[test]
fn invalid_callback_requests_are_rejected() {
    let conn = connected(ScriptedDriver::new());
    assert!(matches!(
        conn.queue_callback(1, BTreeMap::new(), None),
        Err(DispatchError::EmptyStatement)
    ));
    assert!(matches!(
        conn.queue_callback_query(1, "   ", None),
        Err(DispatchError::EmptyStatement)
    ));
    assert_eq!(conn.pending_work(), 0);

    assert!(conn.uninitialise());
    assert!(matches!(
        conn.queue_callback_query(1, "SELECT 1", None),
        Err(DispatchError::NotConnected)
    ));
}
