#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

/// Poll `check` until it returns true or `timeout` passes. Returns the final outcome.
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

pub const WAIT: Duration = Duration::from_secs(10);

/// Connection string for the scripted driver; only the field count matters.
pub const SCRIPTED_INFO: &str = "127.0.0.1;3306;user;pw;scripted";
