//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so callers can get started with a
//! single `use`.

pub use crate::callback::{CallbackResult, CorrelationId, SubQueryId};
pub use crate::config::{ConnectionSpec, DispatchOptions, DispatchOptionsBuilder, Transport};
pub use crate::connection::Connection;
pub use crate::driver::{Driver, DriverConnection, RawResult};
pub use crate::error::DispatchError;
pub use crate::results::{Field, ResultSet, Row};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDispatcher, SqliteDriver};
