use std::sync::Arc;

use crate::builder::HashStashBuilder;
use crate::common::{dedup_keys, unique_token, DOC_ID};
use crate::config::{ConfigOverrides, HashStashConfig};
use crate::errors::{ErrorKind, HashStashError, HashStashResult};
use crate::index::{IndexRegistry, SearchIndex, Tokenizer};
use crate::key_namespace::KeyNamespace;
use crate::options::{SaveOptions, SearchQuery};
use crate::record::{decode_record, encode_fields, flatten, Record};
use crate::store::{KeyValueStore, Reply, ServerInfo};

/// A hashstash context: one store connection, one configuration and one
/// set of search indexes.
///
/// Records are saved as flat hashes under keys built from the configured
/// prefix, and their field values are indexed per collection for full-text
/// search. Clones share everything; the connection is closed when the last
/// clone is dropped, or explicitly with [HashStash::disconnect].
///
/// # Examples
///
/// ```rust,ignore
/// use hashstash::{record, HashStash, SaveOptions};
///
/// let stash = HashStash::builder().prefix("shop").open()?;
///
/// let saved = stash.save_with_options(
///     record! { username: "alice", address: { city: "Moshi" } },
///     &SaveOptions::default().collection("users"),
/// )?;
///
/// let found = stash.search(SearchQuery::new("alice").collection("users"))?;
/// assert_eq!(found, vec![saved]);
/// ```
#[derive(Clone)]
pub struct HashStash {
    inner: Arc<HashStashInner>,
}

impl HashStash {
    /// Starts building a context.
    pub fn builder() -> HashStashBuilder {
        HashStashBuilder::new()
    }

    pub(crate) fn new(config: HashStashConfig, store: KeyValueStore, tokenizer: Tokenizer) -> Self {
        HashStash {
            inner: Arc::new(HashStashInner {
                namespace: KeyNamespace::new(config.clone()),
                indexes: IndexRegistry::new(tokenizer),
                config,
                store,
            }),
        }
    }

    /// Merges `overrides` into the configuration.
    ///
    /// Key settings apply to keys built afterwards. Connection settings
    /// apply on the next [HashStash::connect].
    pub fn configure(&self, overrides: &ConfigOverrides) -> HashStashResult<()> {
        self.inner.config.apply(overrides)
    }

    pub fn config(&self) -> HashStashConfig {
        self.inner.config.clone()
    }

    pub fn store(&self) -> KeyValueStore {
        self.inner.store.clone()
    }

    /// Opens the store connection with the configured parameters.
    pub fn connect(&self) -> HashStashResult<()> {
        let options = self.inner.config.connection();
        log::debug!("Connecting to {}", options.endpoint());
        self.inner.store.connect(&options)
    }

    pub fn disconnect(&self) -> HashStashResult<()> {
        self.inner.store.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.store.is_connected()
    }

    /// Builds a key from `segments`; no segments yields a unique key.
    ///
    /// ```rust,ignore
    /// assert_eq!(stash.generate_key(&["users", "1"]), "paywell:users:1");
    /// ```
    pub fn generate_key<S: AsRef<str>>(&self, segments: &[S]) -> String {
        self.inner.namespace.key(segments)
    }

    /// Key of the search index of `collection`.
    pub fn index_key(&self, collection: &str) -> String {
        self.inner.namespace.index_key(collection)
    }

    /// Saves `record` into the default collection with indexing on.
    pub fn save(&self, record: Record) -> HashStashResult<Record> {
        self.save_with_options(record, &SaveOptions::default())
    }

    /// Saves `record` as a hash and returns it with `_id` set and numbers
    /// restored the way a later [HashStash::get] will return them.
    ///
    /// A record without `_id` gets `prefix:collection:<uuid>`. A record with
    /// one keeps it and replaces whatever is stored there. Field values are
    /// indexed before the hash is written; the two steps are not atomic.
    ///
    /// # Errors
    ///
    /// * `InvalidKey` if an existing `_id` is not a key under the prefix
    /// * `IndexingError` if a value cannot be indexed
    /// * any store error, unchanged
    pub fn save_with_options(&self, mut record: Record, options: &SaveOptions) -> HashStashResult<Record> {
        let id = match record.id() {
            Some(id) => {
                if !self.inner.namespace.owns(&id) {
                    log::error!("Record key {} is outside the configured prefix", id);
                    return Err(HashStashError::new(
                        &format!("Record key {} is outside the configured prefix", id),
                        ErrorKind::InvalidKey,
                    ));
                }
                id
            }
            None if record.has_id() => {
                log::error!("Record id must be a string key");
                return Err(HashStashError::new(
                    "Record id must be a string key",
                    ErrorKind::InvalidKey,
                ));
            }
            None => {
                let id = self
                    .inner
                    .namespace
                    .key(&[options.collection.as_str(), &unique_token()]);
                record.put(DOC_ID, id.clone())?;
                id
            }
        };

        let flat = flatten(&record);

        if options.index {
            let index = self
                .inner
                .indexes
                .get_or_create(&self.inner.namespace.index_key(&options.collection));
            for (path, value) in &flat {
                if options.is_ignored(path) {
                    continue;
                }
                index.index(value, &id)?;
            }
        }

        self.inner
            .store
            .batch()
            .del(&id)
            .hset(&id, encode_fields(&flat))
            .exec()?;

        log::debug!("Saved {} with {} fields", id, flat.len());
        Ok(decode_record(encode_fields(&flat)))
    }

    /// Reads the record stored at `key`, or `None` if there is none.
    pub fn get(&self, key: &str) -> HashStashResult<Option<Record>> {
        Ok(self.get_many(&[key])?.into_iter().next().flatten())
    }

    /// Reads several records in one atomic round trip.
    ///
    /// Empty and repeated keys are dropped first; the result holds one entry
    /// per remaining key, in first-seen order, `None` where nothing is
    /// stored.
    pub fn get_many<S: AsRef<str>>(&self, keys: &[S]) -> HashStashResult<Vec<Option<Record>>> {
        let keys = dedup_keys(keys);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = self.inner.store.batch();
        for key in &keys {
            batch.hgetall(key);
        }
        let replies = batch.exec()?;

        if replies.len() != keys.len() {
            log::error!("Expected {} replies, got {}", keys.len(), replies.len());
            return Err(HashStashError::new(
                &format!("Expected {} replies, got {}", keys.len(), replies.len()),
                ErrorKind::IOError,
            ));
        }

        replies
            .into_iter()
            .map(|reply: Reply| {
                let fields = reply.into_hash()?;
                if fields.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(decode_record(fields)))
                }
            })
            .collect()
    }

    /// Finds records whose indexed values match `query`.
    ///
    /// A blank query or a collection that was never indexed yields no
    /// records rather than an error. Hits whose hash has since been
    /// deleted are skipped.
    pub fn search<Q: Into<SearchQuery>>(&self, query: Q) -> HashStashResult<Vec<Record>> {
        let query = query.into();
        if query.is_blank() {
            return Ok(Vec::new());
        }

        let index_key = self.inner.namespace.index_key(&query.collection);
        let index = match self.inner.indexes.get(&index_key) {
            Some(index) => index,
            None => {
                log::debug!("No search index {}", index_key);
                return Ok(Vec::new());
            }
        };

        let keys = index.query(&query.q, query.mode);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.get_many(&keys)?.into_iter().flatten().collect())
    }

    /// Deletes every key under `prefix:`, or under `prefix:pattern:`, and
    /// returns how many were deleted.
    ///
    /// Search indexes are left as they are.
    pub fn clear(&self, pattern: Option<&str>) -> HashStashResult<usize> {
        let glob = self.inner.namespace.clear_pattern(pattern);
        let keys = self.inner.store.keys_matching(&glob)?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut batch = self.inner.store.batch();
        for key in &keys {
            batch.del(key);
        }
        let deleted = batch
            .exec()?
            .iter()
            .filter_map(Reply::as_integer)
            .sum::<i64>();

        log::debug!("Cleared {} keys matching {}", deleted, glob);
        Ok(deleted.max(0) as usize)
    }

    /// Closes the connection, restores the default configuration and drops
    /// every search index.
    pub fn reset(&self) -> HashStashResult<()> {
        let result = self.inner.store.disconnect();
        self.inner.config.reset();
        self.inner.indexes.clear();
        result
    }

    /// Reads and parses the store's `INFO` reply.
    pub fn server_info(&self) -> HashStashResult<ServerInfo> {
        let text = self.inner.store.info()?;
        Ok(ServerInfo::parse(&text))
    }

    /// Index keys of every search index created so far.
    pub fn index_names(&self) -> Vec<String> {
        self.inner.indexes.names()
    }

    pub fn search_index(&self, collection: &str) -> Option<SearchIndex> {
        self.inner
            .indexes
            .get(&self.inner.namespace.index_key(collection))
    }
}

struct HashStashInner {
    config: HashStashConfig,
    namespace: KeyNamespace,
    store: KeyValueStore,
    indexes: IndexRegistry,
}

impl Drop for HashStashInner {
    fn drop(&mut self) {
        if self.store.is_connected() {
            if let Err(err) = self.store.disconnect() {
                log::error!("Failed to disconnect on drop: {}", err);
            }
        }
    }
}
