use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::config::InMemoryStoreConfig;
use crate::common::{atomic, Atomic, WriteExecutor, HASHSTASH_VERSION};
use crate::config::ConnectionOptions;
use crate::errors::{ErrorKind, HashStashError, HashStashResult};
use crate::store::glob::compile_glob;
use crate::store::{Command, KeyValueStoreProvider, Reply};

type Keyspace = BTreeMap<String, IndexMap<String, String>>;

/// Process-local key-value store speaking the hash command set.
///
/// Data outlives disconnects, like a server would keep it; it is lost when
/// the last clone of the store is dropped. Each numbered database is a
/// separate keyspace behind its own lock, and a batch holds that lock for
/// its whole run.
///
/// ```text
/// let store = InMemoryStore::new(InMemoryStoreConfig::new());
/// store.connect(&ConnectionOptions::default())?;
/// store.execute(Command::Ping)?;
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new(store_config: InMemoryStoreConfig) -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new(store_config)),
        }
    }

    /// Number of keys in the selected database.
    pub fn db_size(&self) -> usize {
        self.inner.db_size()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        InMemoryStore::new(InMemoryStoreConfig::new())
    }
}

impl KeyValueStoreProvider for InMemoryStore {
    fn connect(&self, options: &ConnectionOptions) -> HashStashResult<()> {
        self.inner.connect(options)
    }

    fn disconnect(&self) -> HashStashResult<()> {
        self.inner.disconnect()
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    fn execute(&self, command: Command) -> HashStashResult<Reply> {
        self.inner.execute(command)
    }

    fn exec_batch(&self, commands: Vec<Command>) -> HashStashResult<Vec<Reply>> {
        self.inner.exec_batch(commands)
    }

    fn store_version(&self) -> HashStashResult<String> {
        Ok(format!("InMemory/{}", HASHSTASH_VERSION))
    }
}

struct InMemoryStoreInner {
    store_config: InMemoryStoreConfig,
    connected: AtomicBool,
    selected: AtomicU32,
    databases: Vec<Atomic<Keyspace>>,
    key_counts: Vec<AtomicUsize>,
    connections_received: AtomicU64,
    commands_processed: AtomicU64,
}

impl InMemoryStoreInner {
    fn new(store_config: InMemoryStoreConfig) -> Self {
        let count = store_config.databases() as usize;
        InMemoryStoreInner {
            store_config,
            connected: AtomicBool::new(false),
            selected: AtomicU32::new(0),
            databases: (0..count).map(|_| atomic(Keyspace::new())).collect(),
            key_counts: (0..count).map(|_| AtomicUsize::new(0)).collect(),
            connections_received: AtomicU64::new(0),
            commands_processed: AtomicU64::new(0),
        }
    }

    fn connect(&self, options: &ConnectionOptions) -> HashStashResult<()> {
        if options.database as usize >= self.databases.len() {
            log::error!(
                "DB index {} is out of range, store has {} databases",
                options.database,
                self.databases.len()
            );
            return Err(HashStashError::new(
                &format!("DB index {} is out of range", options.database),
                ErrorKind::ConnectionError,
            ));
        }

        match (self.store_config.password(), &options.auth) {
            (Some(expected), Some(given)) if expected == *given => {}
            (Some(_), Some(_)) => {
                log::error!("Invalid password for {}", options.endpoint());
                return Err(HashStashError::new(
                    "WRONGPASS invalid password",
                    ErrorKind::ConnectionError,
                ));
            }
            (Some(_), None) => {
                log::error!("Authentication required for {}", options.endpoint());
                return Err(HashStashError::new(
                    "NOAUTH Authentication required",
                    ErrorKind::ConnectionError,
                ));
            }
            (None, Some(_)) => {
                log::warn!("Password supplied but the store has none configured");
            }
            (None, None) => {}
        }

        self.selected.store(options.database, Ordering::Release);
        if !self.connected.swap(true, Ordering::AcqRel) {
            self.connections_received.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "Connected to in-memory store at {} (db {})",
                options.endpoint(),
                options.database
            );
        }
        Ok(())
    }

    fn disconnect(&self) -> HashStashResult<()> {
        if self.connected.swap(false, Ordering::AcqRel) {
            log::debug!("Disconnected from in-memory store");
        }
        Ok(())
    }

    fn ensure_connected(&self) -> HashStashResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            log::error!("Store connection is closed");
            Err(HashStashError::new(
                "Store connection is closed",
                ErrorKind::ConnectionError,
            ))
        }
    }

    fn db_size(&self) -> usize {
        let db = self.selected.load(Ordering::Acquire) as usize;
        self.key_counts[db].load(Ordering::Acquire)
    }

    fn execute(&self, command: Command) -> HashStashResult<Reply> {
        self.ensure_connected()?;
        prepare(&command)?;

        let db = self.selected.load(Ordering::Acquire) as usize;
        let reply = self.databases[db].write_with(|keyspace| {
            let reply = self.apply(keyspace, command);
            self.key_counts[db].store(keyspace.len(), Ordering::Release);
            reply
        });
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
        reply
    }

    fn exec_batch(&self, commands: Vec<Command>) -> HashStashResult<Vec<Reply>> {
        self.ensure_connected()?;
        // a bad command aborts the whole batch before anything is applied
        for command in &commands {
            prepare(command)?;
        }

        let count = commands.len() as u64;
        let db = self.selected.load(Ordering::Acquire) as usize;
        let replies = self.databases[db].write_with(|keyspace| {
            let replies = commands
                .into_iter()
                .map(|command| self.apply(keyspace, command))
                .collect::<HashStashResult<Vec<Reply>>>();
            self.key_counts[db].store(keyspace.len(), Ordering::Release);
            replies
        });
        self.commands_processed.fetch_add(count, Ordering::Relaxed);
        replies
    }

    fn apply(&self, keyspace: &mut Keyspace, command: Command) -> HashStashResult<Reply> {
        match command {
            Command::HSet { key, fields } => {
                let hash = keyspace.entry(key).or_default();
                let mut added = 0;
                for (field, value) in fields {
                    if hash.insert(field, value).is_none() {
                        added += 1;
                    }
                }
                Ok(Reply::Integer(added))
            }
            Command::HGetAll { key } => Ok(Reply::Hash(
                keyspace.get(&key).cloned().unwrap_or_default(),
            )),
            Command::Del { keys } => {
                let removed = keys
                    .iter()
                    .filter(|key| keyspace.remove(key.as_str()).is_some())
                    .count();
                Ok(Reply::Integer(removed as i64))
            }
            Command::Keys { pattern } => {
                let glob = compile_glob(&pattern)?;
                Ok(Reply::Keys(
                    keyspace
                        .keys()
                        .filter(|key| glob.is_match(key))
                        .cloned()
                        .collect(),
                ))
            }
            Command::Info => Ok(Reply::Bulk(self.info_text())),
            Command::Ping => Ok(Reply::Status("PONG".to_string())),
        }
    }

    fn info_text(&self) -> String {
        let mut lines = vec![
            "# Server".to_string(),
            "server_name:hashstash-memory".to_string(),
            format!("version:{}", HASHSTASH_VERSION),
            format!("databases:{}", self.databases.len()),
            String::new(),
            "# Stats".to_string(),
            format!(
                "total_connections_received:{}",
                self.connections_received.load(Ordering::Relaxed)
            ),
            format!(
                "total_commands_processed:{}",
                self.commands_processed.load(Ordering::Relaxed)
            ),
            String::new(),
            "# Keyspace".to_string(),
        ];
        for (db, count) in self.key_counts.iter().enumerate() {
            let count = count.load(Ordering::Acquire);
            if count > 0 {
                lines.push(format!("db{}:keys={}", db, count));
            }
        }
        lines.join("\r\n")
    }
}

fn prepare(command: &Command) -> HashStashResult<()> {
    command.validate()?;
    if let Command::Keys { pattern } = command {
        compile_glob(pattern)?;
    }
    Ok(())
}
