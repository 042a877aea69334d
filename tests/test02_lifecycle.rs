mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{SCRIPTED_INFO, WAIT, wait_until};
use sql_dispatch::driver::live_connections;
use sql_dispatch::prelude::*;
use sql_dispatch::test_utils::{SCRIPTED_VERSION, ScriptedDriver};

#[test]
fn malformed_spec_leaves_a_safe_unconnected_connection() {
    let conn = Connection::new(ScriptedDriver::new());
    let err = conn.initialize("onlytwo;fields").unwrap_err();
    assert!(matches!(err, DispatchError::Config(_)));

    assert!(conn.is_initialized());
    assert!(!conn.is_connected());
    assert!(matches!(conn.fetch("SELECT 1"), Err(DispatchError::NotConnected)));
    assert!(matches!(conn.execute_now("SELECT 1"), Err(DispatchError::NotConnected)));
    assert!(matches!(conn.queue_execute("SELECT 1"), Err(DispatchError::NotConnected)));
    assert_eq!(conn.query_i32("SELECT 1"), 0);
    assert_eq!(conn.escape_string("it's"), "it's");
    assert!(conn.drain_callback_results().is_empty());

    assert!(conn.uninitialise());
    assert!(!conn.uninitialise(), "second uninitialise is a no-op");
    assert!(!conn.is_initialized());
}

#[test]
fn uninitialise_without_initialize_is_a_no_op() {
    let conn = Connection::new(ScriptedDriver::new());
    assert!(!conn.uninitialise());
}

#[test]
fn initialize_twice_is_rejected() {
    let conn = Connection::new(ScriptedDriver::new());
    conn.initialize(SCRIPTED_INFO).expect("first initialize");
    assert!(matches!(
        conn.initialize(SCRIPTED_INFO),
        Err(DispatchError::AlreadyInitialized)
    ));
    assert!(conn.is_connected());
}

#[derive(Debug)]
struct NotThreadSafe;

#[test]
fn thread_unsafe_library_is_refused_before_anything_starts() {
    let driver = ScriptedDriver::<NotThreadSafe>::isolated().thread_safe(false);
    let conn = Connection::new(driver.clone());

    assert!(matches!(
        conn.initialize(SCRIPTED_INFO),
        Err(DispatchError::LibraryNotThreadSafe)
    ));
    assert!(!conn.is_initialized());
    assert_eq!(live_connections::<ScriptedDriver<NotThreadSafe>>(), 0);
    assert_eq!(driver.library_inits(), 1);
    assert_eq!(driver.library_ends(), 1);
    assert!(!conn.uninitialise());
}

#[test]
fn old_client_library_closes_the_half_open_session() {
    let driver = ScriptedDriver::new().client_version(SCRIPTED_VERSION - 1);
    let conn = Connection::new(driver.clone());

    let err = conn.initialize(SCRIPTED_INFO).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::VersionTooOld { found, required }
            if found == SCRIPTED_VERSION - 1 && required == SCRIPTED_VERSION
    ));
    assert!(!conn.is_connected());
    assert_eq!(driver.closed_sessions(), 1);
    assert!(conn.uninitialise());
}

#[test]
fn min_version_option_overrides_driver_minimum() {
    let opts = DispatchOptions::builder()
        .min_client_version(SCRIPTED_VERSION + 1)
        .finish();
    let conn = Connection::with_options(ScriptedDriver::new(), opts);
    assert!(matches!(
        conn.initialize(SCRIPTED_INFO),
        Err(DispatchError::VersionTooOld { .. })
    ));
}

#[test]
fn connect_failure_is_reported() {
    let conn = Connection::new(ScriptedDriver::new().fail_connect());
    assert!(matches!(
        conn.initialize(SCRIPTED_INFO),
        Err(DispatchError::Connection(_))
    ));
    assert!(!conn.is_connected());
    assert!(conn.uninitialise());
}

#[derive(Debug)]
struct Refcount;

#[test]
fn library_is_initialized_once_and_torn_down_after_last_connection() {
    let driver = ScriptedDriver::<Refcount>::isolated();
    let first = Connection::new(driver.clone());
    let second = Connection::new(driver.clone());

    first.initialize(SCRIPTED_INFO).expect("first");
    second.initialize(SCRIPTED_INFO).expect("second");
    assert_eq!(live_connections::<ScriptedDriver<Refcount>>(), 2);
    assert_eq!(driver.library_inits(), 1);

    assert!(first.uninitialise());
    assert_eq!(live_connections::<ScriptedDriver<Refcount>>(), 1);
    assert_eq!(driver.library_ends(), 0);

    drop(second);
    assert_eq!(live_connections::<ScriptedDriver<Refcount>>(), 0);
    assert_eq!(driver.library_ends(), 1);
    assert_eq!(driver.closed_sessions(), 2);

    // A torn-down connection can be brought back up.
    first.initialize(SCRIPTED_INFO).expect("reinitialize");
    assert!(first.is_connected());
    assert_eq!(driver.library_inits(), 2);
    assert!(first.uninitialise());
    assert_eq!(driver.library_ends(), 2);
}

#[test]
fn shutdown_drains_everything_queued_before_it() -> Result<(), DispatchError> {
    let driver = ScriptedDriver::new().statement_delay(Duration::from_millis(2));
    let opts = DispatchOptions::builder().run_setup_statements(false).finish();
    let conn = Connection::with_options(driver.clone(), opts);
    conn.initialize(SCRIPTED_INFO)?;

    for i in 0..25 {
        conn.queue_execute(format!("UPDATE {i}"))?;
    }
    assert!(conn.uninitialise());

    let executed = driver.executed();
    assert_eq!(executed.len(), 25);
    assert_eq!(executed.last().map(String::as_str), Some("UPDATE 24"));
    Ok(())
}

#[test]
fn setup_statements_run_through_the_queue_after_connect() {
    let driver = ScriptedDriver::new();
    let conn = Connection::new(driver.clone());
    conn.initialize(SCRIPTED_INFO).expect("initialize");

    assert!(wait_until(WAIT, || driver.executed().len() >= 2));
    assert_eq!(
        driver.executed()[..2],
        ["SET NAMES utf8".to_string(), "SET CHARACTER SET utf8".to_string()]
    );
}

#[test]
fn escape_and_scalar_helpers_use_the_live_session() {
    let driver = ScriptedDriver::new().with_result("SELECT COUNT(*)", &["n"], &[&[Some("17")]]);
    let conn = Connection::new(driver);
    conn.initialize(SCRIPTED_INFO).expect("initialize");

    assert_eq!(conn.escape_string("it's"), "it\\'s");
    assert_eq!(conn.escape_string(""), "");
    assert_eq!(conn.query_i32("SELECT COUNT(*)"), 17);
    assert_eq!(conn.query_i32("SELECT nothing"), 0);
    assert_eq!(conn.query_i32("SELECT FAIL"), 0);
}

#[test]
fn queued_work_runs_on_the_named_worker_thread() -> Result<(), DispatchError> {
    let driver = ScriptedDriver::new();
    let opts = DispatchOptions::builder()
        .worker_name("dispatch-test-worker")
        .idle_wait(Duration::from_millis(3))
        .run_setup_statements(false)
        .finish();
    let conn = Connection::with_options(driver.clone(), opts);
    conn.initialize(SCRIPTED_INFO)?;

    conn.queue_execute("QUEUED")?;
    conn.execute_now("DIRECT")?;
    assert!(wait_until(WAIT, || !driver.threads_for("QUEUED").is_empty()));

    assert_eq!(
        driver.threads_for("QUEUED"),
        vec![Some("dispatch-test-worker".to_string())]
    );
    assert_ne!(
        driver.threads_for("DIRECT"),
        vec![Some("dispatch-test-worker".to_string())]
    );
    Ok(())
}

#[test]
fn statements_racing_shutdown_never_reach_the_next_session() {
    let driver = ScriptedDriver::new();
    let opts = DispatchOptions::builder().run_setup_statements(false).finish();
    let conn = Arc::new(Connection::with_options(driver.clone(), opts));

    for round in 0..30 {
        conn.initialize(SCRIPTED_INFO).expect("initialize");
        let producer = {
            let conn = Arc::clone(&conn);
            thread::spawn(move || {
                for n in 0..5_000 {
                    if conn.queue_execute(format!("STALE {round} {n}")).is_err() {
                        break;
                    }
                }
            })
        };
        let prefix = format!("STALE {round} ");
        assert!(wait_until(WAIT, || {
            driver.executed().iter().any(|s| s.starts_with(&prefix))
        }));

        assert!(conn.uninitialise());
        producer.join().expect("producer thread");
        assert_eq!(conn.pending_work(), 0, "round {round} left items behind");
    }

    let before = driver.executed().len();
    conn.initialize(SCRIPTED_INFO).expect("initialize");
    conn.queue_execute("FRESH").expect("queue");
    assert!(wait_until(WAIT, || driver.executed().len() > before));
    assert!(conn.uninitialise());
    assert_eq!(driver.executed()[before..], ["FRESH".to_string()]);
}
