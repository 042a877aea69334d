//! Scripted driver for exercising the engine without a database.
//!
//! Statements containing `FAIL` are rejected; everything else succeeds. Canned results can be
//! attached to exact statement texts. The type parameter only separates library reference
//! counts: tests that assert on init/teardown use their own marker type so parallel tests
//! don't share a count.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ConnectionSpec;
use crate::driver::{Driver, DriverConnection, RawResult};
use crate::error::DispatchError;
use crate::utils::lock_recover;

/// Version the scripted library reports unless told otherwise.
pub const SCRIPTED_VERSION: u32 = 50_003;

#[derive(Debug)]
struct ScriptState {
    thread_safe: AtomicBool,
    client_version: AtomicU32,
    fail_connect: AtomicBool,
    statement_delay: Mutex<Duration>,
    results: Mutex<HashMap<String, RawResult>>,
    /// Statement text and the name of the thread that ran it.
    executed: Mutex<Vec<(String, Option<String>)>>,
    inits: AtomicUsize,
    ends: AtomicUsize,
    closed: AtomicUsize,
}

/// Driver whose behaviour is set up by the test. Clones share state.
#[derive(Debug)]
pub struct ScriptedDriver<M = ()> {
    state: Arc<ScriptState>,
    _marker: PhantomData<fn() -> M>,
}

impl<M> Clone for ScriptedDriver<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            _marker: PhantomData,
        }
    }
}

impl ScriptedDriver<()> {
    #[must_use]
    pub fn new() -> Self {
        Self::isolated()
    }
}

impl Default for ScriptedDriver<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ScriptedDriver<M> {
    /// A driver whose library count is keyed by the marker type `M`.
    #[must_use]
    pub fn isolated() -> Self {
        Self {
            state: Arc::new(ScriptState {
                thread_safe: AtomicBool::new(true),
                client_version: AtomicU32::new(SCRIPTED_VERSION),
                fail_connect: AtomicBool::new(false),
                statement_delay: Mutex::new(Duration::ZERO),
                results: Mutex::new(HashMap::new()),
                executed: Mutex::new(Vec::new()),
                inits: AtomicUsize::new(0),
                ends: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
            }),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn thread_safe(self, thread_safe: bool) -> Self {
        self.state.thread_safe.store(thread_safe, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn client_version(self, version: u32) -> Self {
        self.state.client_version.store(version, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn fail_connect(self) -> Self {
        self.state.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    /// Sleep this long inside every statement, holding the connection mutex.
    #[must_use]
    pub fn statement_delay(self, delay: Duration) -> Self {
        *lock_recover(&self.state.statement_delay, "ScriptedDriver::statement_delay") = delay;
        self
    }

    /// Answer `sql` with the given rows.
    #[must_use]
    pub fn with_result(self, sql: &str, columns: &[&str], rows: &[&[Option<&str>]]) -> Self {
        let raw = RawResult {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| v.map(str::to_owned)).collect())
                .collect(),
        };
        lock_recover(&self.state.results, "ScriptedDriver::with_result")
            .insert(sql.to_owned(), raw);
        self
    }

    /// Every statement any session of this driver has run, in execution order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        lock_recover(&self.state.executed, "ScriptedDriver::executed")
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Names of the threads that ran `sql`, one entry per execution.
    #[must_use]
    pub fn threads_for(&self, sql: &str) -> Vec<Option<String>> {
        lock_recover(&self.state.executed, "ScriptedDriver::threads_for")
            .iter()
            .filter(|(ran, _)| ran == sql)
            .map(|(_, thread)| thread.clone())
            .collect()
    }

    #[must_use]
    pub fn library_inits(&self) -> usize {
        self.state.inits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn library_ends(&self) -> usize {
        self.state.ends.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn closed_sessions(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

impl<M: 'static> Driver for ScriptedDriver<M> {
    type Connection = ScriptedSession;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn library_init(&self) -> Result<(), DispatchError> {
        self.state.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn library_end(&self) {
        self.state.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn is_thread_safe(&self) -> bool {
        self.state.thread_safe.load(Ordering::SeqCst)
    }

    fn client_version(&self) -> u32 {
        self.state.client_version.load(Ordering::SeqCst)
    }

    fn min_client_version(&self) -> u32 {
        SCRIPTED_VERSION
    }

    fn connect(&self, spec: &ConnectionSpec) -> Result<ScriptedSession, DispatchError> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(DispatchError::Connection(format!(
                "scripted refusal for {}",
                spec.host
            )));
        }
        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
        })
    }

    fn session_setup_statements(&self) -> Vec<String> {
        vec!["SET NAMES utf8".to_owned(), "SET CHARACTER SET utf8".to_owned()]
    }
}

/// Session handed out by [`ScriptedDriver`].
#[derive(Debug)]
pub struct ScriptedSession {
    state: Arc<ScriptState>,
}

impl ScriptedSession {
    fn run(&self, sql: &str) -> Result<(), DispatchError> {
        let delay = *lock_recover(&self.state.statement_delay, "ScriptedSession::run");
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let thread = std::thread::current().name().map(str::to_owned);
        lock_recover(&self.state.executed, "ScriptedSession::run").push((sql.to_owned(), thread));
        if sql.contains("FAIL") {
            Err(DispatchError::Execution(format!("scripted failure: {sql}")))
        } else {
            Ok(())
        }
    }
}

impl DriverConnection for ScriptedSession {
    fn execute(&mut self, sql: &str) -> Result<(), DispatchError> {
        self.run(sql)
    }

    fn query(&mut self, sql: &str) -> Result<Option<RawResult>, DispatchError> {
        self.run(sql)?;
        Ok(lock_recover(&self.state.results, "ScriptedSession::query")
            .get(sql)
            .cloned())
    }

    fn escape(&self, input: &str) -> String {
        input.replace('\\', "\\\\").replace('\'', "\\'")
    }

    fn set_autocommit(&mut self, _enabled: bool) -> Result<(), DispatchError> {
        Ok(())
    }

    fn close(self) -> Result<(), DispatchError> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
