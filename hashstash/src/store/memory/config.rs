use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use std::sync::Arc;

pub const DEFAULT_DATABASE_COUNT: u32 = 16;

/// Settings for an [super::InMemoryStore].
///
/// ```text
/// let config = InMemoryStoreConfig::new();
/// config.set_password("secret");
/// let store = InMemoryStore::new(config);
/// ```
#[derive(Default, Clone)]
pub struct InMemoryStoreConfig {
    inner: Arc<InMemoryStoreConfigInner>,
}

impl InMemoryStoreConfig {
    pub fn new() -> InMemoryStoreConfig {
        InMemoryStoreConfig {
            inner: Arc::new(InMemoryStoreConfigInner::new()),
        }
    }

    /// Password a client must present on connect; `None` accepts anyone.
    pub fn password(&self) -> Option<String> {
        self.inner.password.read_with(|it| it.clone())
    }

    pub fn set_password(&self, password: &str) {
        self.inner
            .password
            .write_with(|it| *it = Some(password.to_string()));
    }

    /// Number of numbered databases a client may select.
    pub fn databases(&self) -> u32 {
        self.inner.databases.read_with(|it| *it)
    }

    /// Takes effect for stores created afterwards. Zero is raised to one.
    pub fn set_databases(&self, databases: u32) {
        self.inner.databases.write_with(|it| *it = databases.max(1));
    }
}

struct InMemoryStoreConfigInner {
    password: Atomic<Option<String>>,
    databases: Atomic<u32>,
}

impl Default for InMemoryStoreConfigInner {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStoreConfigInner {
    fn new() -> Self {
        InMemoryStoreConfigInner {
            password: atomic(None),
            databases: atomic(DEFAULT_DATABASE_COUNT),
        }
    }
}
