use itertools::Itertools;

/// Generates a fresh segment for keys that were built without one.
#[inline]
pub fn unique_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Removes empty and repeated keys, keeping the first occurrence of each.
pub fn dedup_keys<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    keys.iter()
        .map(|k| k.as_ref())
        .filter(|k| !k.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}
