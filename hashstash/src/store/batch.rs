use super::command::{Command, Reply};
use super::key_value_store::KeyValueStore;
use crate::errors::HashStashResult;

/// Commands queued for one atomic round trip.
///
/// ```text
/// let replies = store.batch()
///     .del("paywell:hash:1")
///     .hset("paywell:hash:1", fields)
///     .exec()?;
/// ```
pub struct Batch {
    store: KeyValueStore,
    commands: Vec<Command>,
}

impl Batch {
    pub(crate) fn new(store: KeyValueStore) -> Self {
        Batch {
            store,
            commands: Vec::new(),
        }
    }

    pub fn queue(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn hset(&mut self, key: &str, fields: Vec<(String, String)>) -> &mut Self {
        self.queue(Command::HSet {
            key: key.to_string(),
            fields,
        })
    }

    pub fn hgetall(&mut self, key: &str) -> &mut Self {
        self.queue(Command::HGetAll {
            key: key.to_string(),
        })
    }

    pub fn del(&mut self, key: &str) -> &mut Self {
        self.queue(Command::Del {
            keys: vec![key.to_string()],
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sends the queued commands. An empty batch returns without a round trip.
    pub fn exec(&mut self) -> HashStashResult<Vec<Reply>> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }
        let commands = std::mem::take(&mut self.commands);
        log::debug!("Executing batch of {} commands", commands.len());
        self.store.exec_batch(commands)
    }
}
