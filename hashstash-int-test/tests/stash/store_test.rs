use hashstash::errors::{ErrorKind, HashStashError, HashStashResult};
use hashstash::store::memory::{InMemoryStore, InMemoryStoreConfig};
use hashstash::store::{Command, KeyValueStoreProvider, Reply};
use hashstash::{record, ConnectionOptions, HashStash};
use hashstash_int_test::test_util::{cleanup, create_test_context, fake_user, run_test};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[test]
fn test_server_info() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            stash.save(fake_user())?;

            let info = stash.server_info()?;
            assert!(info.version().is_some());
            assert_eq!(info.get("keyspace", "db0"), Some("keys=1"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_databases_are_isolated() {
    let store = InMemoryStore::default();
    let first = HashStash::builder().store(store.clone()).open().unwrap();
    let saved = first.save(record! { name: "db zero" }).unwrap();
    first.disconnect().unwrap();

    let second = HashStash::builder()
        .store(store.clone())
        .database(1)
        .open()
        .unwrap();
    assert!(second.get(&saved.id().unwrap()).unwrap().is_none());
    second.disconnect().unwrap();

    let third = HashStash::builder().store(store).open().unwrap();
    assert!(third.get(&saved.id().unwrap()).unwrap().is_some());
}

#[test]
fn test_password_protected_store() {
    let store_config = InMemoryStoreConfig::new();
    store_config.set_password("s3cret");

    let result = HashStash::builder()
        .store(InMemoryStore::new(store_config.clone()))
        .open();
    assert!(result.is_err());

    let stash = HashStash::builder()
        .store(InMemoryStore::new(store_config))
        .auth("s3cret")
        .open()
        .unwrap();
    assert!(stash.is_connected());
}

#[test]
fn test_concurrent_saves() {
    run_test(
        create_test_context,
        |ctx| {
            let handles = (0..8)
                .map(|_| {
                    let stash = ctx.stash();
                    thread::spawn(move || -> HashStashResult<Vec<String>> {
                        (0..25)
                            .map(|_| stash.save(record! { kind: "worker" }).map(|r| r.id().unwrap()))
                            .collect()
                    })
                })
                .collect::<Vec<_>>();

            let mut ids = Vec::new();
            for handle in handles {
                ids.extend(handle.join().unwrap()?);
            }

            let stash = ctx.stash();
            assert_eq!(stash.get_many(&ids)?.iter().flatten().count(), 200);
            assert_eq!(stash.search("worker")?.len(), 200);
            Ok(())
        },
        cleanup,
    )
}

/// Accepts connections but fails every command.
#[derive(Default)]
struct BrokenStore {
    connected: AtomicBool,
}

impl KeyValueStoreProvider for BrokenStore {
    fn connect(&self, _options: &ConnectionOptions) -> HashStashResult<()> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    fn disconnect(&self) -> HashStashResult<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn execute(&self, command: Command) -> HashStashResult<Reply> {
        Err(HashStashError::new(
            &format!("READONLY cannot run {}", command.name()),
            ErrorKind::BackendError,
        ))
    }

    fn exec_batch(&self, _commands: Vec<Command>) -> HashStashResult<Vec<Reply>> {
        Err(HashStashError::new("READONLY batch", ErrorKind::BackendError))
    }

    fn store_version(&self) -> HashStashResult<String> {
        Ok("broken".to_string())
    }
}

#[test]
fn test_store_errors_pass_through() {
    let stash = HashStash::builder()
        .store(BrokenStore::default())
        .open()
        .unwrap();

    let err = stash.save(record! { a: 1 }).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::BackendError);
    assert_eq!(err.message(), "READONLY batch");

    let err = stash.get(&stash.generate_key(&["hash", "1"])).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::BackendError);

    let err = stash.clear(None).unwrap_err();
    assert_eq!(err.message(), "READONLY cannot run KEYS");

    let err = stash.server_info().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::BackendError);
}
