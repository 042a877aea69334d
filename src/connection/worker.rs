use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::DispatchOptions;
use crate::driver::DriverConnection;
use crate::error::DispatchError;
use crate::utils::lock_recover;

use super::lifecycle::Shared;

pub(super) fn spawn<C: DriverConnection>(
    shared: Arc<Shared<C>>,
    options: &DispatchOptions,
) -> Result<JoinHandle<()>, DispatchError> {
    let idle_wait = options.idle_wait();
    thread::Builder::new()
        .name(options.worker_name.clone())
        .spawn(move || run_worker(&shared, idle_wait))
        .map_err(|err| DispatchError::Worker(format!("failed to spawn worker thread: {err}")))
}

/// Drain loop. Exits only after a drain comes back empty with the cancel flag set, so
/// everything queued before shutdown began gets executed.
fn run_worker<C: DriverConnection>(shared: &Shared<C>, idle_wait: Duration) {
    tracing::debug!("worker started");

    loop {
        if let Some(items) = shared.queue.drain_all() {
            let count = items.len();
            let mut guard = lock_recover(&shared.handle, "worker drain");
            match guard.as_mut() {
                Some(conn) => {
                    for item in items {
                        item.execute(conn, &shared.callbacks);
                    }
                    tracing::trace!("executed {count} queued items");
                }
                None => {
                    tracing::warn!("dropping {count} queued items: no open session");
                }
            }
            continue;
        }

        if shared.cancel.load(Ordering::Acquire) {
            break;
        }
        shared.queue.wait_for_work(idle_wait);
    }

    tracing::debug!("worker end");
}
