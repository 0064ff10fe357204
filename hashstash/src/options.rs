use std::convert::Infallible;
use std::str::FromStr;

use crate::common::{DEFAULT_COLLECTION, DOC_ID, FIELD_SEPARATOR};
use crate::index::SearchMode;

/// Options for [crate::HashStash::save_with_options].
///
/// ```rust,ignore
/// let options = SaveOptions::default()
///     .collection("users")
///     .ignore(&["password"]);
/// stash.save_with_options(record, &options)?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SaveOptions {
    /// Whether field values go into the collection's search index.
    pub index: bool,
    /// Key segment under which a generated key is placed.
    pub collection: String,
    /// Field names kept out of the index, matched against the last path segment.
    pub ignore: Vec<String>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            index: true,
            collection: DEFAULT_COLLECTION.to_string(),
            ignore: Vec::new(),
        }
    }
}

impl SaveOptions {
    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    pub fn ignore<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.ignore
            .extend(fields.iter().map(|f| f.as_ref().to_string()));
        self
    }

    /// Checks whether the flattened field at `path` stays out of the index.
    ///
    /// `_id` is always ignored.
    pub fn is_ignored(&self, path: &str) -> bool {
        let last = path.rsplit(FIELD_SEPARATOR).next().unwrap_or(path);
        last == DOC_ID || self.ignore.iter().any(|field| field == last)
    }
}

/// A full-text query against one collection.
///
/// A bare string converts into a query over the default collection in
/// [SearchMode::Or].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchQuery {
    pub q: String,
    pub collection: String,
    pub mode: SearchMode,
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            q: String::new(),
            collection: DEFAULT_COLLECTION.to_string(),
            mode: SearchMode::default(),
        }
    }
}

impl SearchQuery {
    pub fn new(q: &str) -> Self {
        SearchQuery {
            q: q.to_string(),
            ..SearchQuery::default()
        }
    }

    pub fn collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.q.trim().is_empty()
    }
}

impl From<&str> for SearchQuery {
    fn from(q: &str) -> Self {
        SearchQuery::new(q)
    }
}

impl From<String> for SearchQuery {
    fn from(q: String) -> Self {
        SearchQuery {
            q,
            ..SearchQuery::default()
        }
    }
}

impl From<&SearchQuery> for SearchQuery {
    fn from(query: &SearchQuery) -> Self {
        query.clone()
    }
}

impl FromStr for SearchQuery {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SearchQuery::new(s))
    }
}
