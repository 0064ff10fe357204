use std::path::PathBuf;

use crate::config::{ConfigOverrides, HashStashConfig};
use crate::errors::{HashStashError, HashStashResult};
use crate::hash_stash::HashStash;
use crate::index::{Tokenizer, TokenizerProvider};
use crate::store::memory::InMemoryStore;
use crate::store::{KeyValueStore, KeyValueStoreProvider};

/// Builder for a [HashStash] context.
///
/// Setters chain fluently. The first invalid setting is captured and
/// returned by [HashStashBuilder::build] or [HashStashBuilder::open]; later
/// setters are skipped once an error is held.
///
/// # Examples
///
/// ```rust,ignore
/// use hashstash::HashStash;
///
/// // in-memory store, default prefix "paywell"
/// let stash = HashStash::builder().open()?;
///
/// let stash = HashStash::builder()
///     .prefix("shop")
///     .separator("/")
///     .database(2)
///     .open()?;
/// ```
#[derive(Default)]
pub struct HashStashBuilder {
    error: Option<HashStashError>,
    config: HashStashConfig,
    store: Option<KeyValueStore>,
    tokenizer: Tokenizer,
}

impl HashStashBuilder {
    pub fn new() -> Self {
        HashStashBuilder {
            error: None,
            config: HashStashConfig::new(),
            store: None,
            tokenizer: Tokenizer::default(),
        }
    }

    /// Sets the first segment of every key.
    pub fn prefix(self, prefix: &str) -> Self {
        self.overrides(ConfigOverrides::new().prefix(prefix))
    }

    /// Sets the string placed between key segments.
    pub fn separator(self, separator: &str) -> Self {
        self.overrides(ConfigOverrides::new().separator(separator))
    }

    pub fn host(self, host: &str) -> Self {
        self.overrides(ConfigOverrides::new().host(host))
    }

    pub fn port(self, port: u16) -> Self {
        self.overrides(ConfigOverrides::new().port(port))
    }

    /// Connects through a unix socket instead of host and port.
    pub fn socket(self, socket: impl Into<PathBuf>) -> Self {
        self.overrides(ConfigOverrides::new().socket(socket))
    }

    pub fn auth(self, auth: &str) -> Self {
        self.overrides(ConfigOverrides::new().auth(auth))
    }

    pub fn database(self, database: u32) -> Self {
        self.overrides(ConfigOverrides::new().database(database))
    }

    /// Passes an extra connection option through to the store.
    pub fn option(self, name: &str, value: &str) -> Self {
        self.overrides(ConfigOverrides::new().option(name, value))
    }

    /// Merges a whole set of overrides at once.
    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.apply(&overrides) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Uses `store` instead of the default [InMemoryStore].
    pub fn store<T: KeyValueStoreProvider + 'static>(mut self, store: T) -> Self {
        self.store = Some(KeyValueStore::new(store));
        self
    }

    /// Uses `tokenizer` to split indexed values and queries.
    pub fn tokenizer<T: TokenizerProvider + 'static>(mut self, tokenizer: T) -> Self {
        self.tokenizer = Tokenizer::new(tokenizer);
        self
    }

    /// Creates the context without connecting.
    ///
    /// # Errors
    ///
    /// Returns the first error captured by a setter.
    pub fn build(self) -> HashStashResult<HashStash> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let store = self
            .store
            .unwrap_or_else(|| KeyValueStore::new(InMemoryStore::default()));
        Ok(HashStash::new(self.config, store, self.tokenizer))
    }

    /// Creates the context and connects it to the store.
    pub fn open(self) -> HashStashResult<HashStash> {
        let stash = self.build()?;
        stash.connect()?;
        Ok(stash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::store::memory::InMemoryStoreConfig;

    #[test]
    fn test_new() {
        let builder = HashStashBuilder::new();
        assert!(builder.error.is_none());
        assert!(builder.store.is_none());
        assert_eq!(builder.config.prefix(), "paywell");
    }

    #[test]
    fn test_prefix_and_separator() {
        let builder = HashStashBuilder::new().prefix("shop").separator("/");
        assert!(builder.error.is_none());
        assert_eq!(builder.config.prefix(), "shop");
        assert_eq!(builder.config.separator(), "/");
    }

    #[test]
    fn test_prefix_error_propagation() {
        let builder = HashStashBuilder::new().prefix("");
        assert!(builder.error.is_some());
        let err = builder.build().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_builder_early_exit_on_first_error() {
        let builder = HashStashBuilder::new()
            .separator("")
            .prefix("shop")
            .database(3);
        assert!(builder.error.is_some());
        assert_eq!(builder.config.prefix(), "paywell");
        assert_eq!(builder.config.connection().database, 0);
    }

    #[test]
    fn test_connection_settings() {
        let builder = HashStashBuilder::new()
            .host("cache.local")
            .port(6380)
            .auth("secret")
            .database(4)
            .option("timeout", "5");
        let connection = builder.config.connection();
        assert_eq!(connection.host, "cache.local");
        assert_eq!(connection.port, 6380);
        assert_eq!(connection.auth.as_deref(), Some("secret"));
        assert_eq!(connection.database, 4);
        assert_eq!(connection.option("timeout"), Some("5"));
    }

    #[test]
    fn test_build_does_not_connect() {
        let stash = HashStashBuilder::new().build().unwrap();
        assert!(!stash.is_connected());
        stash.connect().unwrap();
        assert!(stash.is_connected());
    }

    #[test]
    fn test_open_connects() {
        let stash = HashStashBuilder::new().open().unwrap();
        assert!(stash.is_connected());
    }

    #[test]
    fn test_open_invalid_credentials() {
        let store_config = InMemoryStoreConfig::new();
        store_config.set_password("secret");

        let err = HashStashBuilder::new()
            .store(InMemoryStore::new(store_config.clone()))
            .auth("wrong")
            .open()
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);

        let stash = HashStashBuilder::new()
            .store(InMemoryStore::new(store_config))
            .auth("secret")
            .open()
            .unwrap();
        assert!(stash.is_connected());
    }

    #[test]
    fn test_open_database_out_of_range() {
        let err = HashStashBuilder::new()
            .database(99)
            .open()
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
    }
}
