// record constants
pub const DOC_ID: &str = "_id";
pub const FIELD_SEPARATOR: &str = ".";
pub const RESERVED_FIELDS: [&str; 1] = [DOC_ID];

// namespace defaults
pub const DEFAULT_PREFIX: &str = "paywell";
pub const DEFAULT_SEPARATOR: &str = ":";
pub const DEFAULT_COLLECTION: &str = "hash";
pub const SEARCH_SEGMENT: &str = "search";

// connection defaults
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DATABASE: u32 = 0;

// storage encoding of leaves that have no string form
pub const EMPTY_RECORD_MARKER: &str = "{}";
pub const EMPTY_ARRAY_MARKER: &str = "[]";
// prepended to stored strings that equal a marker or already start with it
pub const STRING_ESCAPE: &str = "\\";

pub const HASHSTASH_VERSION: &str = env!("CARGO_PKG_VERSION");
