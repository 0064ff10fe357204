use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

use crate::errors::{ErrorKind, HashStashError, HashStashResult};

/// A single store command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Sets fields on the hash at `key`.
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Reads every field of the hash at `key`.
    HGetAll { key: String },
    /// Deletes keys.
    Del { keys: Vec<String> },
    /// Lists keys matching a glob pattern.
    Keys { pattern: String },
    /// Reads the server description.
    Info,
    Ping,
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::HSet { .. } => "HSET",
            Command::HGetAll { .. } => "HGETALL",
            Command::Del { .. } => "DEL",
            Command::Keys { .. } => "KEYS",
            Command::Info => "INFO",
            Command::Ping => "PING",
        }
    }

    /// Checks the command's arguments the way a server does before queueing it.
    pub fn validate(&self) -> HashStashResult<()> {
        let valid = match self {
            Command::HSet { key, fields } => !key.is_empty() && !fields.is_empty(),
            Command::HGetAll { key } => !key.is_empty(),
            Command::Del { keys } => !keys.is_empty(),
            Command::Keys { pattern } => !pattern.is_empty(),
            Command::Info | Command::Ping => true,
        };

        if valid {
            Ok(())
        } else {
            log::error!("Wrong number of arguments for '{}' command", self.name());
            Err(HashStashError::new(
                &format!("Wrong number of arguments for '{}' command", self.name()),
                ErrorKind::IOError,
            ))
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::HSet { key, fields } => write!(f, "HSET {} ({} fields)", key, fields.len()),
            Command::HGetAll { key } => write!(f, "HGETALL {}", key),
            Command::Del { keys } => write!(f, "DEL {}", keys.join(" ")),
            Command::Keys { pattern } => write!(f, "KEYS {}", pattern),
            Command::Info => write!(f, "INFO"),
            Command::Ping => write!(f, "PING"),
        }
    }
}

/// A store's answer to one [Command].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Status(String),
    Integer(i64),
    Bulk(String),
    Hash(IndexMap<String, String>),
    Keys(Vec<String>),
    Nil,
}

impl Reply {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Unwraps a hash reply. A missing key reads as an empty hash.
    pub fn into_hash(self) -> HashStashResult<IndexMap<String, String>> {
        match self {
            Reply::Hash(fields) => Ok(fields),
            Reply::Nil => Ok(IndexMap::new()),
            other => Err(unexpected_reply("hash", &other)),
        }
    }

    pub fn into_keys(self) -> HashStashResult<Vec<String>> {
        match self {
            Reply::Keys(keys) => Ok(keys),
            Reply::Nil => Ok(Vec::new()),
            other => Err(unexpected_reply("key list", &other)),
        }
    }

    pub fn into_text(self) -> HashStashResult<String> {
        match self {
            Reply::Bulk(text) | Reply::Status(text) => Ok(text),
            other => Err(unexpected_reply("text", &other)),
        }
    }
}

fn unexpected_reply(expected: &str, reply: &Reply) -> HashStashError {
    log::error!("Expected a {} reply, got {:?}", expected, reply);
    HashStashError::new(
        &format!("Expected a {} reply, got {:?}", expected, reply),
        ErrorKind::IOError,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Info.name(), "INFO");
        assert_eq!(
            Command::HGetAll {
                key: "k".to_string()
            }
            .name(),
            "HGETALL"
        );
    }

    #[test]
    fn test_validate() {
        let empty_hset = Command::HSet {
            key: "k".to_string(),
            fields: vec![],
        };
        let err = empty_hset.validate().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IOError);
        assert!(Command::Del { keys: vec![] }.validate().is_err());
        assert!(Command::Ping.validate().is_ok());
        assert!(Command::HSet {
            key: "k".to_string(),
            fields: vec![("a".to_string(), "1".to_string())]
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_display() {
        let del = Command::Del {
            keys: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(del.to_string(), "DEL a b");
    }

    #[test]
    fn test_reply_conversions() {
        assert_eq!(Reply::Integer(3).as_integer(), Some(3));
        assert!(Reply::Nil.into_hash().unwrap().is_empty());
        assert!(Reply::Nil.into_keys().unwrap().is_empty());
        assert_eq!(Reply::Status("PONG".to_string()).into_text().unwrap(), "PONG");

        let err = Reply::Integer(1).into_hash().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IOError);
    }
}
