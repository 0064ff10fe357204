use indexmap::IndexMap;
use std::ops::Deref;
use std::sync::Arc;

use super::batch::Batch;
use super::command::{Command, Reply};
use crate::config::ConnectionOptions;
use crate::errors::HashStashResult;

/// Contract for the key-value server behind a [crate::HashStash].
///
/// A provider owns one logical connection. Commands sent through it are
/// applied in submission order and a batch is applied atomically: no
/// command from another caller runs between the commands of one batch.
///
/// Errors are returned as the provider classifies them; callers pass them
/// through without retrying.
///
/// # Implementations
/// - [super::memory::InMemoryStore]: process-local store for tests and
///   embedded use
pub trait KeyValueStoreProvider: Send + Sync {
    /// Opens the connection. Connecting an open store is a no-op.
    fn connect(&self, options: &ConnectionOptions) -> HashStashResult<()>;

    /// Closes the connection. Closing a closed store is a no-op.
    fn disconnect(&self) -> HashStashResult<()>;

    fn is_connected(&self) -> bool;

    /// Runs one command.
    fn execute(&self, command: Command) -> HashStashResult<Reply>;

    /// Runs `commands` atomically and returns one reply per command.
    fn exec_batch(&self, commands: Vec<Command>) -> HashStashResult<Vec<Reply>>;

    /// Lists keys matching a glob `pattern`.
    fn keys_matching(&self, pattern: &str) -> HashStashResult<Vec<String>> {
        self.execute(Command::Keys {
            pattern: pattern.to_string(),
        })?
        .into_keys()
    }

    /// Identifies the provider and its version.
    fn store_version(&self) -> HashStashResult<String>;
}

/// Shared handle to a [KeyValueStoreProvider].
///
/// Cloning is cheap and every clone talks to the same connection.
///
/// ```text
/// let store = KeyValueStore::new(InMemoryStore::default());
/// store.connect(&ConnectionOptions::default())?;
/// store.hset("paywell:hash:1", vec![("name".into(), "alice".into())])?;
/// ```
#[derive(Clone)]
pub struct KeyValueStore {
    inner: Arc<dyn KeyValueStoreProvider>,
}

impl KeyValueStore {
    pub fn new<T: KeyValueStoreProvider + 'static>(inner: T) -> Self {
        KeyValueStore {
            inner: Arc::new(inner),
        }
    }

    /// Starts an empty batch against this store.
    pub fn batch(&self) -> Batch {
        Batch::new(self.clone())
    }

    pub fn hset(&self, key: &str, fields: Vec<(String, String)>) -> HashStashResult<i64> {
        let reply = self.execute(Command::HSet {
            key: key.to_string(),
            fields,
        })?;
        Ok(reply.as_integer().unwrap_or_default())
    }

    pub fn hgetall(&self, key: &str) -> HashStashResult<IndexMap<String, String>> {
        self.execute(Command::HGetAll {
            key: key.to_string(),
        })?
        .into_hash()
    }

    pub fn del(&self, keys: &[String]) -> HashStashResult<i64> {
        let reply = self.execute(Command::Del {
            keys: keys.to_vec(),
        })?;
        Ok(reply.as_integer().unwrap_or_default())
    }

    pub fn info(&self) -> HashStashResult<String> {
        self.execute(Command::Info)?.into_text()
    }

    pub fn ping(&self) -> HashStashResult<String> {
        self.execute(Command::Ping)?.into_text()
    }
}

impl Deref for KeyValueStore {
    type Target = Arc<dyn KeyValueStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, HashStashError};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        log: Mutex<Vec<String>>,
    }

    impl KeyValueStoreProvider for RecordingStore {
        fn connect(&self, _options: &ConnectionOptions) -> HashStashResult<()> {
            Ok(())
        }

        fn disconnect(&self) -> HashStashResult<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn execute(&self, command: Command) -> HashStashResult<Reply> {
            self.log.lock().push(command.to_string());
            match command {
                Command::Keys { .. } => Ok(Reply::Keys(vec!["a".to_string()])),
                Command::HGetAll { .. } => Ok(Reply::Nil),
                Command::Info => Err(HashStashError::new("down", ErrorKind::ConnectionError)),
                _ => Ok(Reply::Integer(1)),
            }
        }

        fn exec_batch(&self, commands: Vec<Command>) -> HashStashResult<Vec<Reply>> {
            commands.into_iter().map(|c| self.execute(c)).collect()
        }

        fn store_version(&self) -> HashStashResult<String> {
            Ok("recording/1".to_string())
        }
    }

    #[test]
    fn test_default_keys_matching_uses_keys_command() {
        let store = KeyValueStore::new(RecordingStore::default());
        assert_eq!(store.keys_matching("paywell*").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_convenience_commands() {
        let store = KeyValueStore::new(RecordingStore::default());
        assert_eq!(store.hset("k", vec![("f".to_string(), "v".to_string())]).unwrap(), 1);
        assert!(store.hgetall("k").unwrap().is_empty());
        assert_eq!(store.del(&["k".to_string()]).unwrap(), 1);
    }

    #[test]
    fn test_errors_pass_through() {
        let store = KeyValueStore::new(RecordingStore::default());
        let err = store.info().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
    }

    #[test]
    fn test_clones_share_provider() {
        let store = KeyValueStore::new(RecordingStore::default());
        let cloned = store.clone();
        assert!(Arc::ptr_eq(&store.inner, &cloned.inner));
        assert_eq!(cloned.store_version().unwrap(), "recording/1");
    }
}
