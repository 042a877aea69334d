mod common;

use std::sync::Arc;

use common::SCRIPTED_INFO;
use sql_dispatch::prelude::*;
use sql_dispatch::test_utils::ScriptedDriver;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_fetch_runs_on_the_blocking_pool() -> Result<(), DispatchError> {
    let driver = ScriptedDriver::new().with_result("SELECT answer", &["a"], &[&[Some("42")]]);
    let conn = Arc::new(Connection::new(driver.clone()));
    conn.initialize(SCRIPTED_INFO)?;

    let rs = conn.fetch_async("SELECT answer").await?.expect("one row");
    assert_eq!(rs[0].get_i32(), 42);
    assert!(conn.fetch_async("SELECT missing").await?.is_none());

    conn.execute_now_async("UPDATE now").await?;
    assert!(driver.executed().iter().any(|s| s == "UPDATE now"));
    Ok(())
}

#[tokio::test]
async fn async_errors_pass_through() {
    let conn = Arc::new(Connection::new(ScriptedDriver::new()));
    assert!(matches!(
        conn.fetch_async("SELECT 1").await,
        Err(DispatchError::NotConnected)
    ));

    conn.initialize(SCRIPTED_INFO).expect("initialize");
    assert!(matches!(
        conn.execute_now_async("UPDATE FAIL").await,
        Err(DispatchError::Execution(_))
    ));
    assert!(matches!(
        conn.execute_now_async("").await,
        Err(DispatchError::EmptyStatement)
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn async_facade_over_sqlite() -> Result<(), DispatchError> {
    let conn = Arc::new(Connection::new(SqliteDriver::new()));
    conn.initialize("localhost;0;user;pw;:memory:")?;
    conn.execute_now_async("CREATE TABLE t (v INTEGER)").await?;
    conn.execute_now_async("INSERT INTO t VALUES (5), (6)").await?;

    let sum = conn
        .fetch_async("SELECT SUM(v) FROM t")
        .await?
        .and_then(|rs| rs.field(0).map(Field::get_i64));
    assert_eq!(sum, Some(11));
    Ok(())
}
