use dashmap::DashMap;
use std::sync::Arc;

use super::search_index::SearchIndex;
use super::tokenizer::Tokenizer;

/// Lazily created search indexes, one per index key.
///
/// Lives in process memory only. Nothing is rebuilt from the store, so a
/// fresh registry knows no index even when the store holds records.
#[derive(Clone)]
pub struct IndexRegistry {
    indexes: Arc<DashMap<String, SearchIndex>>,
    tokenizer: Tokenizer,
}

impl IndexRegistry {
    pub fn new(tokenizer: Tokenizer) -> Self {
        IndexRegistry {
            indexes: Arc::new(DashMap::new()),
            tokenizer,
        }
    }

    /// Returns the index registered under `index_key`, creating it if needed.
    pub fn get_or_create(&self, index_key: &str) -> SearchIndex {
        self.indexes
            .entry(index_key.to_string())
            .or_insert_with(|| {
                log::debug!("Creating search index {}", index_key);
                SearchIndex::new(index_key, self.tokenizer.clone())
            })
            .value()
            .clone()
    }

    pub fn get(&self, index_key: &str) -> Option<SearchIndex> {
        self.indexes.get(index_key).map(|entry| entry.value().clone())
    }

    /// Index keys in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Drops every index.
    pub fn clear(&self) {
        self.indexes.clear();
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        IndexRegistry::new(Tokenizer::default())
    }
}
