//! Process-wide driver library lifecycle.
//!
//! Client libraries want exactly one init before first use and one teardown after last use.
//! Each driver type gets its own count of live connections; init runs on the 0 → 1 transition
//! and teardown on 1 → 0. This is the only shared mutable state in the crate and it belongs to
//! the driver seam, not to the engine.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use super::Driver;
use crate::error::DispatchError;
use crate::utils::lock_recover;

static LIBRARY_USERS: LazyLock<Mutex<HashMap<TypeId, usize>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Register one more live connection for `D`, initializing the library if it is the first.
///
/// Counting and init share one lock, so no second connection can see a count of one before the
/// library is ready.
///
/// # Errors
/// Returns the driver's init error or [`DispatchError::LibraryNotThreadSafe`]; the count is left
/// unchanged on failure.
pub(crate) fn acquire<D: Driver>(driver: &D) -> Result<(), DispatchError> {
    let mut users = lock_recover(&LIBRARY_USERS, "library::acquire");
    let count = users.entry(TypeId::of::<D>()).or_insert(0);

    if *count == 0 {
        driver.library_init()?;
        if !driver.is_thread_safe() {
            driver.library_end();
            tracing::error!("{} client library isn't thread-safe", driver.name());
            return Err(DispatchError::LibraryNotThreadSafe);
        }
        tracing::debug!("{} client library initialized", driver.name());
    }

    *count += 1;
    Ok(())
}

/// Drop one live connection for `D`, tearing the library down after the last one.
pub(crate) fn release<D: Driver>(driver: &D) {
    let mut users = lock_recover(&LIBRARY_USERS, "library::release");
    let key = TypeId::of::<D>();
    let Some(count) = users.get_mut(&key) else {
        tracing::warn!("{} library released without a matching acquire", driver.name());
        return;
    };

    *count = count.saturating_sub(1);
    if *count == 0 {
        users.remove(&key);
        driver.library_end();
        tracing::debug!("{} client library torn down", driver.name());
    }
}

/// Number of initialized connections currently holding the library for `D`.
#[must_use]
pub fn live_connections<D: Driver>() -> usize {
    lock_recover(&LIBRARY_USERS, "library::live_connections")
        .get(&TypeId::of::<D>())
        .copied()
        .unwrap_or(0)
}
