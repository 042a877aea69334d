use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::batch::StatementBatch;
use crate::callback::CallbackStore;
use crate::config::{ConnectionSpec, DispatchOptions};
use crate::driver::{Driver, DriverConnection, library};
use crate::error::DispatchError;
use crate::queue::WorkQueue;
use crate::utils::lock_recover;
use crate::work::WorkItem;

use super::worker;

/// State shared between the public handle and its worker thread.
pub(super) struct Shared<C> {
    /// The connection mutex. The driver handle is only reachable through it.
    pub(super) handle: Mutex<Option<C>>,
    pub(super) queue: WorkQueue<WorkItem>,
    pub(super) callbacks: CallbackStore,
    pub(super) cancel: AtomicBool,
    pub(super) connected: AtomicBool,
}

#[derive(Default)]
struct Lifecycle {
    initialized: bool,
    worker: Option<JoinHandle<()>>,
}

/// One database session served by one dedicated worker thread.
///
/// Producers on any thread may enqueue statements, open batches, queue callback requests, or
/// run statements synchronously. Every driver call, from the worker or from a synchronous
/// caller, goes through the same connection mutex, so the driver handle is never used
/// concurrently. Synchronous calls are not ordered relative to queued work beyond that mutex.
///
/// ```no_run
/// # #[cfg(feature = "sqlite")]
/// # fn demo() -> Result<(), sql_dispatch::DispatchError> {
/// use sql_dispatch::prelude::*;
///
/// let conn = Connection::new(SqliteDriver::new());
/// conn.initialize("localhost;0;user;pw;app.db")?;
/// conn.queue_execute("CREATE TABLE IF NOT EXISTS hits (n INTEGER)")?;
/// conn.queue_execute("INSERT INTO hits VALUES (1)")?;
/// conn.uninitialise();
/// # Ok(())
/// # }
/// ```
pub struct Connection<D: Driver> {
    pub(super) driver: D,
    pub(super) options: DispatchOptions,
    pub(super) shared: Arc<Shared<D::Connection>>,
    pub(super) batch: Mutex<StatementBatch>,
    lifecycle: Mutex<Lifecycle>,
}

impl<D: Driver> Connection<D> {
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self::with_options(driver, DispatchOptions::default())
    }

    #[must_use]
    pub fn with_options(driver: D, options: DispatchOptions) -> Self {
        Self {
            driver,
            options,
            shared: Arc::new(Shared {
                handle: Mutex::new(None),
                queue: WorkQueue::new(),
                callbacks: CallbackStore::new(),
                cancel: AtomicBool::new(false),
                connected: AtomicBool::new(false),
            }),
            batch: Mutex::new(StatementBatch::new()),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Whether `initialize` ran and `uninitialise` has not yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        lock_recover(&self.lifecycle, "Connection::is_initialized").initialized
    }

    /// Whether a driver session is open. Check this before relying on the connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Start the worker and open the session described by `info`
    /// (`host;port-or-socket;user;password;dbname`).
    ///
    /// The worker keeps running even when the string is malformed or the connect fails; the
    /// connection then stays initialized but not connected until [`Connection::uninitialise`].
    ///
    /// # Errors
    /// - [`DispatchError::AlreadyInitialized`] when called twice without `uninitialise`.
    /// - [`DispatchError::LibraryNotThreadSafe`] or the driver's init error; nothing is started.
    /// - [`DispatchError::Config`] for a malformed connection string.
    /// - [`DispatchError::VersionTooOld`], [`DispatchError::Connection`] or a driver error when
    ///   the session cannot be opened.
    pub fn initialize(&self, info: &str) -> Result<(), DispatchError> {
        let mut life = lock_recover(&self.lifecycle, "Connection::initialize");
        if life.initialized {
            tracing::error!("{} connection initialized twice", self.driver.name());
            return Err(DispatchError::AlreadyInitialized);
        }

        library::acquire(&self.driver)?;
        life.initialized = true;
        self.shared.cancel.store(false, Ordering::Release);

        match worker::spawn(Arc::clone(&self.shared), &self.options) {
            Ok(handle) => life.worker = Some(handle),
            Err(err) => {
                tracing::error!("failed to start worker: {err}");
                library::release(&self.driver);
                life.initialized = false;
                return Err(err);
            }
        }

        let spec = ConnectionSpec::parse(info).inspect_err(|err| {
            tracing::error!("{err}");
        })?;
        self.open_session(&spec)
    }

    fn open_session(&self, spec: &ConnectionSpec) -> Result<(), DispatchError> {
        let mut conn = self.driver.connect(spec).inspect_err(|err| {
            tracing::error!(
                "could not connect to {} database {} at {}: {err}",
                self.driver.name(),
                spec.database,
                spec.host
            );
        })?;

        if let Err(err) = self.configure_session(&mut conn) {
            if let Err(close_err) = conn.close() {
                tracing::warn!("closing half-open session failed: {close_err}");
            }
            return Err(err);
        }

        *lock_recover(&self.shared.handle, "Connection::open_session") = Some(conn);
        self.shared.connected.store(true, Ordering::Release);
        tracing::info!(
            "connected to {} database {} at {}",
            self.driver.name(),
            spec.database,
            spec.host
        );

        if self.options.run_setup_statements {
            for statement in self.driver.session_setup_statements() {
                if let Err(err) = self.queue_execute(statement) {
                    tracing::warn!("session setup statement not queued: {err}");
                }
            }
        }
        Ok(())
    }

    fn configure_session(&self, conn: &mut D::Connection) -> Result<(), DispatchError> {
        conn.set_autocommit(true)?;

        let required = self
            .options
            .min_client_version
            .unwrap_or_else(|| self.driver.min_client_version());
        let found = self.driver.client_version();
        if found < required {
            tracing::error!(
                "{} client library is out of date: have {found}, need at least {required}",
                self.driver.name()
            );
            return Err(DispatchError::VersionTooOld { found, required });
        }

        conn.set_auto_reconnect(true)
    }

    /// Stop the worker once the queue is drained, close the session, and release the driver
    /// library. Returns `false` (doing nothing) when not initialized.
    ///
    /// Items queued concurrently with this call may or may not run; any left behind are dropped.
    pub fn uninitialise(&self) -> bool {
        let mut life = lock_recover(&self.lifecycle, "Connection::uninitialise");
        if !life.initialized {
            return false;
        }

        self.shared.cancel.store(true, Ordering::Release);
        self.shared.queue.wake();
        if let Some(handle) = life.worker.take() {
            if handle.join().is_err() {
                tracing::error!("{} worker thread panicked", self.driver.name());
            }
        }

        {
            // Producers check `connected` under the batch lock, so nothing can be pushed
            // after this drain.
            let mut batch = lock_recover(&self.batch, "Connection::uninitialise");
            self.shared.connected.store(false, Ordering::Release);
            if let Some(leftover) = self.shared.queue.drain_all() {
                tracing::warn!("dropping {} items queued during shutdown", leftover.len());
            }
            if let Ok(discarded) = batch.cancel() {
                tracing::warn!("discarding open batch of {discarded} statements at shutdown");
            }
        }

        let session = lock_recover(&self.shared.handle, "Connection::uninitialise").take();
        if let Some(conn) = session {
            if let Err(err) = conn.close() {
                tracing::warn!("closing {} session failed: {err}", self.driver.name());
            }
        }

        library::release(&self.driver);
        life.initialized = false;
        tracing::info!("{} connection uninitialised", self.driver.name());
        true
    }
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        self.uninitialise();
    }
}

impl<D: Driver> fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("driver", &self.driver.name())
            .field("initialized", &self.is_initialized())
            .field("connected", &self.is_connected())
            .field("pending", &self.shared.queue.len())
            .finish()
    }
}
