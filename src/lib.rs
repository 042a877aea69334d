//! Single-worker SQL dispatch.
//!
//! A [`Connection`] owns one non-thread-safe driver session and one worker thread. Producers
//! on any thread can:
//! - queue fire-and-forget statements ([`Connection::queue_execute`]),
//! - group statements into a client-side batch that is queued in one step
//!   ([`Connection::begin_batch`] / [`Connection::commit_batch`]),
//! - queue callback requests whose results are collected later by correlation id
//!   ([`Connection::queue_callback`] / [`Connection::drain_callback_results`]),
//! - or run statements synchronously ([`Connection::execute_now`], [`Connection::fetch`]).
//!
//! The worker drains the whole queue at once and runs it under the connection mutex; the
//! synchronous paths take the same mutex on the calling thread. Failures are returned where a
//! caller is waiting and always reported through `tracing`.

pub mod batch;
pub mod callback;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod queue;
pub mod results;
pub mod work;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod utils;

pub use callback::{CallbackResult, CallbackStore, CorrelationId, SubQueryId};
pub use config::{ConnectionSpec, DispatchOptions, Transport};
pub use connection::Connection;
pub use driver::{Driver, DriverConnection, RawResult};
pub use error::DispatchError;
pub use results::{Field, ResultSet, Row};
pub use work::{CallbackQuery, WorkItem};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDispatcher, SqliteDriver};
