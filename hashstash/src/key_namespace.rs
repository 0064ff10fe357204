use crate::common::{unique_token, SEARCH_SEGMENT};
use crate::config::HashStashConfig;

/// Builds store keys from the configured prefix and separator.
///
/// Reads the configuration on every call, so a prefix or separator change
/// applies to every key built afterwards and never to existing keys.
#[derive(Clone)]
pub struct KeyNamespace {
    config: HashStashConfig,
}

impl KeyNamespace {
    pub fn new(config: HashStashConfig) -> Self {
        KeyNamespace { config }
    }

    /// Joins the prefix and `segments` with the separator.
    ///
    /// With no segments a fresh uuid is used as the only segment, so every
    /// such call returns a different key.
    ///
    /// ```rust,ignore
    /// assert_eq!(namespace.key(&["users", "1"]), "paywell:users:1");
    /// ```
    pub fn key<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let separator = self.config.separator();
        let mut key = self.config.prefix();
        if segments.is_empty() {
            key.push_str(&separator);
            key.push_str(&unique_token());
            return key;
        }
        for segment in segments {
            key.push_str(&separator);
            key.push_str(segment.as_ref());
        }
        key
    }

    /// Key under which a collection's search index is registered.
    pub fn index_key(&self, collection: &str) -> String {
        self.key(&[collection, SEARCH_SEGMENT])
    }

    /// Glob selecting every key under `prefix:`, or under `prefix:pattern:`.
    ///
    /// Both forms end at a separator, so neither reaches into a sibling
    /// collection (`users2` for `users`) or a longer prefix (`paywellx`).
    pub fn clear_pattern(&self, pattern: Option<&str>) -> String {
        let separator = self.config.separator();
        match pattern {
            Some(pattern) if !pattern.is_empty() => format!(
                "{}{}{}{}*",
                self.config.prefix(),
                separator,
                pattern,
                separator
            ),
            _ => format!("{}{}*", self.config.prefix(), separator),
        }
    }

    /// Checks whether `key` lives under the current prefix.
    pub fn owns(&self, key: &str) -> bool {
        let root = format!("{}{}", self.config.prefix(), self.config.separator());
        key.len() > root.len() && key.starts_with(&root)
    }
}
