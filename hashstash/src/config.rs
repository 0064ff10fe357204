//! Runtime configuration shared by a [crate::HashStash] context.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::{
    atomic, Atomic, ReadExecutor, WriteExecutor, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_PREFIX, DEFAULT_SEPARATOR,
};
use crate::errors::{ErrorKind, HashStashError, HashStashResult};

/// Shared, runtime-mutable configuration.
///
/// Clones share state, so a change made through one handle is seen by the
/// key builder and the store of the same context. Changing the prefix or
/// separator only affects keys built afterwards.
///
/// ```rust,ignore
/// let config = HashStashConfig::new();
/// config.set_prefix("shop")?;
/// assert_eq!(config.prefix(), "shop");
/// ```
#[derive(Clone)]
pub struct HashStashConfig {
    inner: Arc<HashStashConfigInner>,
}

impl Default for HashStashConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HashStashConfig {
    /// Creates a configuration holding the defaults.
    pub fn new() -> Self {
        HashStashConfig {
            inner: Arc::new(HashStashConfigInner::new()),
        }
    }

    pub fn prefix(&self) -> String {
        self.inner.prefix.read_with(|it| it.clone())
    }

    /// Sets the key prefix.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the prefix is empty.
    pub fn set_prefix(&self, prefix: &str) -> HashStashResult<()> {
        validate_non_empty("Key prefix", prefix)?;
        self.inner.prefix.write_with(|it| *it = prefix.to_string());
        Ok(())
    }

    pub fn separator(&self) -> String {
        self.inner.separator.read_with(|it| it.clone())
    }

    /// Sets the key segment separator.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the separator is empty.
    pub fn set_separator(&self, separator: &str) -> HashStashResult<()> {
        validate_non_empty("Key separator", separator)?;
        self.inner
            .separator
            .write_with(|it| *it = separator.to_string());
        Ok(())
    }

    /// Returns a snapshot of the connection parameters.
    pub fn connection(&self) -> ConnectionOptions {
        self.inner.connection.read_with(|it| it.clone())
    }

    pub fn set_connection(&self, options: ConnectionOptions) {
        self.inner.connection.write_with(|it| *it = options);
    }

    /// Merges `overrides` into this configuration.
    ///
    /// Every supplied field is validated before any of them is written, so
    /// a failed merge leaves the configuration untouched.
    pub fn apply(&self, overrides: &ConfigOverrides) -> HashStashResult<()> {
        overrides.validate()?;

        if let Some(prefix) = &overrides.prefix {
            self.set_prefix(prefix)?;
        }
        if let Some(separator) = &overrides.separator {
            self.set_separator(separator)?;
        }
        self.inner
            .connection
            .write_with(|connection| overrides.merge_into(connection));
        Ok(())
    }

    /// Restores every setting to its default.
    pub fn reset(&self) {
        self.inner
            .prefix
            .write_with(|it| *it = DEFAULT_PREFIX.to_string());
        self.inner
            .separator
            .write_with(|it| *it = DEFAULT_SEPARATOR.to_string());
        self.inner
            .connection
            .write_with(|it| *it = ConnectionOptions::default());
    }
}

struct HashStashConfigInner {
    prefix: Atomic<String>,
    separator: Atomic<String>,
    connection: Atomic<ConnectionOptions>,
}

impl HashStashConfigInner {
    fn new() -> Self {
        HashStashConfigInner {
            prefix: atomic(DEFAULT_PREFIX.to_string()),
            separator: atomic(DEFAULT_SEPARATOR.to_string()),
            connection: atomic(ConnectionOptions::default()),
        }
    }
}

fn validate_non_empty(name: &str, value: &str) -> HashStashResult<()> {
    if value.is_empty() {
        log::error!("{} cannot be empty", name);
        return Err(HashStashError::new(
            &format!("{} cannot be empty", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

/// Parameters a store provider uses to reach its server.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionOptions {
    pub host: String,
    pub port: u16,
    /// Unix socket path; takes precedence over host and port.
    pub socket: Option<PathBuf>,
    pub auth: Option<String>,
    pub database: u32,
    /// Provider specific settings passed through untouched.
    pub options: BTreeMap<String, String>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            socket: None,
            auth: None,
            database: DEFAULT_DATABASE,
            options: BTreeMap::new(),
        }
    }
}

impl ConnectionOptions {
    /// Where the store lives: the socket if one is set, host and port otherwise.
    pub fn endpoint(&self) -> Endpoint {
        match &self.socket {
            Some(path) => Endpoint::Unix(path.clone()),
            None => Endpoint::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix(PathBuf),
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// A partial configuration; only the fields that are set are applied.
///
/// ```rust,ignore
/// let overrides = ConfigOverrides::new().prefix("shop").database(2);
/// stash.configure(&overrides)?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConfigOverrides {
    pub prefix: Option<String>,
    pub separator: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<PathBuf>,
    pub auth: Option<String>,
    pub database: Option<u32>,
    /// Merged key by key into the existing provider options.
    pub options: BTreeMap<String, String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = Some(separator.to_string());
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn socket(mut self, socket: impl Into<PathBuf>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    pub fn auth(mut self, auth: &str) -> Self {
        self.auth = Some(auth.to_string());
        self
    }

    pub fn database(mut self, database: u32) -> Self {
        self.database = Some(database);
        self
    }

    pub fn option(mut self, name: &str, value: &str) -> Self {
        self.options.insert(name.to_string(), value.to_string());
        self
    }

    fn validate(&self) -> HashStashResult<()> {
        if let Some(prefix) = &self.prefix {
            validate_non_empty("Key prefix", prefix)?;
        }
        if let Some(separator) = &self.separator {
            validate_non_empty("Key separator", separator)?;
        }
        if let Some(host) = &self.host {
            validate_non_empty("Host", host)?;
        }
        Ok(())
    }

    fn merge_into(&self, connection: &mut ConnectionOptions) {
        if let Some(host) = &self.host {
            connection.host = host.clone();
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if let Some(socket) = &self.socket {
            connection.socket = Some(socket.clone());
        }
        if let Some(auth) = &self.auth {
            connection.auth = Some(auth.clone());
        }
        if let Some(database) = self.database {
            connection.database = database;
        }
        for (name, value) in &self.options {
            connection.options.insert(name.clone(), value.clone());
        }
    }
}
