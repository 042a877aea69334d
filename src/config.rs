use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Host value that selects the local named-pipe transport.
pub const LOCAL_PIPE_HOST: &str = ".";

/// How the driver should reach the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Tcp { port: u16 },
    /// Local named pipe; the port is forced to zero.
    NamedPipe,
    /// Non-numeric port field, taken as a local socket path.
    Socket(PathBuf),
}

impl Transport {
    /// The numeric port handed to the driver (zero for non-TCP transports).
    #[must_use]
    pub fn port(&self) -> u16 {
        match self {
            Transport::Tcp { port } => *port,
            Transport::NamedPipe | Transport::Socket(_) => 0,
        }
    }
}

/// Parsed `host;port-or-socket;user;password;dbname` connection string.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub host: String,
    pub transport: Transport,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionSpec {
    /// Parse a connection string of five `;`-separated fields.
    ///
    /// Fields past the fifth are ignored.
    ///
    /// # Errors
    /// Returns [`DispatchError::Config`] when fewer than five fields are present or the port
    /// field is numeric but out of range.
    pub fn parse(info: &str) -> Result<Self, DispatchError> {
        let parts: Vec<&str> = info.split(';').collect();
        if parts.len() < 5 {
            return Err(DispatchError::Config(format!(
                "bad connection string ({} fields), format should be 'host;port;user;pw;dbname'",
                parts.len()
            )));
        }
        if parts.len() > 5 {
            tracing::debug!("ignoring {} trailing connection string fields", parts.len() - 5);
        }

        let host = parts[0].to_owned();
        let port_field = parts[1].trim();
        let transport = if host == LOCAL_PIPE_HOST {
            Transport::NamedPipe
        } else if port_field.is_empty() {
            Transport::Tcp { port: 0 }
        } else if port_field.bytes().all(|b| b.is_ascii_digit()) {
            let port = port_field.parse::<u16>().map_err(|e| {
                DispatchError::Config(format!("invalid port '{port_field}': {e}"))
            })?;
            Transport::Tcp { port }
        } else {
            Transport::Socket(PathBuf::from(port_field))
        };

        Ok(Self {
            host,
            transport,
            user: parts[2].to_owned(),
            password: parts[3].to_owned(),
            database: parts[4].to_owned(),
        })
    }
}

impl std::str::FromStr for ConnectionSpec {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("host", &self.host)
            .field("transport", &self.transport)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Tunables for a [`crate::Connection`] and its worker thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// How long the idle worker sleeps between empty drains, in milliseconds.
    pub idle_wait_ms: u64,
    /// Worker thread name.
    pub worker_name: String,
    /// Overrides the driver's own minimum client library version when set.
    pub min_client_version: Option<u32>,
    /// Queue the driver's session setup statements right after connecting.
    pub run_setup_statements: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            idle_wait_ms: 1,
            worker_name: "sql-dispatch-worker".to_owned(),
            min_client_version: None,
            run_setup_statements: true,
        }
    }
}

impl DispatchOptions {
    #[must_use]
    pub fn builder() -> DispatchOptionsBuilder {
        DispatchOptionsBuilder::default()
    }

    #[must_use]
    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }
}

/// Fluent builder for [`DispatchOptions`].
#[derive(Debug, Clone, Default)]
pub struct DispatchOptionsBuilder {
    opts: DispatchOptions,
}

impl DispatchOptionsBuilder {
    #[must_use]
    pub fn idle_wait(mut self, wait: Duration) -> Self {
        self.opts.idle_wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.opts.worker_name = name.into();
        self
    }

    #[must_use]
    pub fn min_client_version(mut self, version: u32) -> Self {
        self.opts.min_client_version = Some(version);
        self
    }

    #[must_use]
    pub fn run_setup_statements(mut self, enabled: bool) -> Self {
        self.opts.run_setup_statements = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> DispatchOptions {
        self.opts
    }
}
