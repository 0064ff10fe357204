use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use super::tokenizer::Tokenizer;
use crate::common::{atomic, Atomic, ReadExecutor, Value, WriteExecutor};
use crate::errors::{ErrorKind, HashStashError, HashStashResult};

static INVALID_TYPE_ERROR: Lazy<HashStashError> = Lazy::new(|| {
    HashStashError::new(
        "Invalid value type for search index",
        ErrorKind::IndexingError,
    )
});

/// How the tokens of a search term are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SearchMode {
    /// Every token must match.
    And,
    /// Any token may match.
    #[default]
    Or,
}

impl Display for SearchMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::And => write!(f, "and"),
            SearchMode::Or => write!(f, "or"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = HashStashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(SearchMode::And),
            "or" => Ok(SearchMode::Or),
            _ => {
                log::error!("Unknown search mode {}", s);
                Err(HashStashError::new(
                    &format!("Unknown search mode {}", s),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

/// In-memory inverted index from tokens to record keys.
///
/// Entries are only ever added. Re-saving a record adds the tokens of its
/// new values next to the old ones, so a search may return a record for a
/// value it no longer holds.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct SearchIndex {
    inner: Arc<SearchIndexInner>,
}

struct SearchIndexInner {
    name: String,
    tokenizer: Tokenizer,
    entries: Atomic<BTreeMap<String, BTreeSet<String>>>,
}

impl SearchIndex {
    pub fn new(name: &str, tokenizer: Tokenizer) -> Self {
        SearchIndex {
            inner: Arc::new(SearchIndexInner {
                name: name.to_string(),
                tokenizer,
                entries: atomic(BTreeMap::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Records that the record at `record_key` holds `value`.
    ///
    /// Returns the number of tokens the value produced. Null and empty
    /// values produce none.
    ///
    /// # Errors
    ///
    /// Returns an `IndexingError` for non-empty records and arrays; only
    /// flattened leaves can be indexed.
    pub fn index(&self, value: &Value, record_key: &str) -> HashStashResult<usize> {
        if value.is_container() && !value.is_empty_container() {
            log::error!(
                "Cannot index a nested value for {} in {}",
                record_key,
                self.inner.name
            );
            return Err(INVALID_TYPE_ERROR.clone());
        }

        match value.to_index_text() {
            Some(text) => Ok(self.index_text(&text, record_key)),
            None => Ok(0),
        }
    }

    /// Tokenizes `text` and maps every token to `record_key`.
    pub fn index_text(&self, text: &str, record_key: &str) -> usize {
        let tokens = self.inner.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return 0;
        }

        let count = tokens.len();
        self.inner.entries.write_with(|entries| {
            for token in tokens {
                entries
                    .entry(token)
                    .or_default()
                    .insert(record_key.to_string());
            }
        });
        count
    }

    /// Returns the keys of records matching `term`, in key order.
    ///
    /// Each query token matches every indexed token it is a prefix of.
    /// A term without tokens matches nothing.
    pub fn query(&self, term: &str, mode: SearchMode) -> Vec<String> {
        let tokens = self.inner.tokenizer.tokenize(term);
        if tokens.is_empty() {
            return Vec::new();
        }

        self.inner.entries.read_with(|entries| {
            let mut matches = tokens.iter().map(|token| prefix_matches(entries, token));
            let first = matches.next().unwrap_or_default();
            let keys = match mode {
                SearchMode::Or => matches.fold(first, |mut acc, next| {
                    acc.extend(next);
                    acc
                }),
                SearchMode::And => matches.fold(first, |acc, next| {
                    acc.intersection(&next).cloned().collect()
                }),
            };
            keys.into_iter().collect()
        })
    }

    /// Number of distinct tokens held.
    pub fn token_count(&self) -> usize {
        self.inner.entries.read_with(|entries| entries.len())
    }

    /// Keys registered under exactly `token`.
    pub fn keys_for(&self, token: &str) -> Vec<String> {
        self.inner.entries.read_with(|entries| {
            entries
                .get(token)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.token_count() == 0
    }

    pub fn clear(&self) {
        self.inner.entries.write_with(|entries| entries.clear());
    }
}

fn prefix_matches(entries: &BTreeMap<String, BTreeSet<String>>, token: &str) -> BTreeSet<String> {
    entries
        .range(token.to_string()..)
        .take_while(|(indexed, _)| indexed.starts_with(token))
        .flat_map(|(_, keys)| keys.iter().cloned())
        .collect()
}
