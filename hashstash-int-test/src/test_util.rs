use fake::faker::address::en::CityName;
use fake::faker::internet::en::Username;
use fake::faker::name::en::Name;
use fake::Fake;
use hashstash::errors::HashStashResult;
use hashstash::{record, HashStash, Record};
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs `test` between `before` and `after`.
///
/// `after` runs even when the test fails, so the store is always cleared.
/// Failures and panics are reported with the elapsed time and a backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> HashStashResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> HashStashResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> HashStashResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();
    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", err_msg), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Took {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed: {}", error);
}

#[derive(Clone)]
pub struct TestContext {
    prefix: String,
    stash: HashStash,
}

impl TestContext {
    pub fn new(prefix: String, stash: HashStash) -> Self {
        Self { prefix, stash }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn stash(&self) -> HashStash {
        self.stash.clone()
    }
}

pub fn random_prefix() -> String {
    format!("test-{}", uuid::Uuid::new_v4().simple())
}

/// Opens a connected context over a fresh in-memory store under a random prefix.
pub fn create_test_context() -> HashStashResult<TestContext> {
    let prefix = random_prefix();
    let stash = HashStash::builder().prefix(&prefix).open()?;
    Ok(TestContext::new(prefix, stash))
}

pub fn cleanup(ctx: TestContext) -> HashStashResult<()> {
    let stash = ctx.stash();
    if stash.is_connected() {
        stash.clear(None)?;
        stash.disconnect()?;
    }
    Ok(())
}

/// A user record with a nested address and a list of tags.
pub fn fake_user() -> Record {
    let name: String = Name().fake();
    let username: String = Username().fake();
    let city: String = CityName().fake();
    record! {
        name: (name),
        username: (username),
        age: ((18..90).fake::<i64>()),
        address: { city: (city), zip: "25101" },
        tags: ["member", "verified"]
    }
}
