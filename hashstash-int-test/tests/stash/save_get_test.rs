use chrono::{TimeZone, Utc};
use hashstash::{record, Record, SaveOptions, Value};
use hashstash_int_test::test_util::{cleanup, create_test_context, fake_user, run_test};

#[test]
fn test_save_and_get_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let saved = stash.save(fake_user())?;
            let id = saved.id().unwrap();
            assert!(id.starts_with(&format!("{}:hash:", ctx.prefix())));

            let fetched = stash.get(&id)?.unwrap();
            assert_eq!(fetched, saved);
            assert!(fetched.get("age")?.is_number());
            assert_eq!(fetched.get("address.zip")?, Value::I64(25101));
            assert_eq!(fetched.get("tags.1")?, Value::from("verified"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_numeric_strings_come_back_as_numbers() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let saved = stash.save(record! {
                count: "42",
                ratio: "0.5",
                code: "007x",
                spaced: " 12",
                plain: 9
            })?;
            let fetched = stash.get(&saved.id().unwrap())?.unwrap();

            assert_eq!(fetched.get("count")?, Value::I64(42));
            assert_eq!(fetched.get("ratio")?, Value::F64(0.5));
            assert_eq!(fetched.get("code")?, Value::from("007x"));
            assert_eq!(fetched.get("spaced")?, Value::from(" 12"));
            assert_eq!(fetched.get("plain")?, Value::I64(9));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_dates_and_empty_containers() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
            let saved = stash.save(record! {
                created: (created),
                notes: [],
                extra: {}
            })?;
            let fetched = stash.get(&saved.id().unwrap())?.unwrap();

            assert_eq!(fetched.get("created")?, Value::I64(created.timestamp_millis()));
            assert_eq!(fetched.get("notes")?, Value::Array(vec![]));
            assert_eq!(fetched.get("extra")?, Value::Record(Record::new()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_marker_like_strings_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let saved = stash.save(record! {
                note: "[]",
                body: "{}",
                path: "\\{}",
                empty_list: [],
                empty_meta: {}
            })?;
            let fetched = stash.get(&saved.id().unwrap())?.unwrap();

            assert_eq!(fetched.get("note")?, Value::from("[]"));
            assert_eq!(fetched.get("body")?, Value::from("{}"));
            assert_eq!(fetched.get("path")?, Value::from("\\{}"));
            assert_eq!(fetched.get("empty_list")?, Value::Array(vec![]));
            assert_eq!(fetched.get("empty_meta")?, Value::Record(Record::new()));
            assert_eq!(fetched, saved);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_same_id_replaces_previous_content() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let id = stash.generate_key(&["hash", "fixed"]);
            stash.save(record! { "_id": (id.clone()), first: "one", second: "two" })?;
            stash.save(record! { "_id": (id.clone()), first: "uno" })?;

            let fetched = stash.get(&id)?.unwrap();
            assert_eq!(fetched.get("first")?, Value::from("uno"));
            assert!(fetched.get("second")?.is_null());

            // the index only ever grows, so the old value still points here
            assert_eq!(stash.search("two")?.len(), 1);
            assert_eq!(stash.search("uno")?.len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_get_many_keeps_input_order() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let options = SaveOptions::default().collection("users");
            let ids = (0..5)
                .map(|n| stash.save_with_options(record! { n: n }, &options))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|record| record.id().unwrap())
                .rev()
                .collect::<Vec<_>>();

            let missing = stash.generate_key(&["users", "missing"]);
            let mut keys = ids.clone();
            keys.push(missing);
            keys.push(ids[0].clone());

            let records = stash.get_many(&keys)?;
            assert_eq!(records.len(), 6);
            for (n, record) in records.iter().take(5).enumerate() {
                let record = record.as_ref().unwrap();
                assert_eq!(record.get("n")?, Value::I64(4 - n as i64));
            }
            assert!(records[5].is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_foreign_id_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let result = stash.save(record! { "_id": "elsewhere:hash:1", a: 1 });
            assert!(result.is_err());
            assert!(stash.get("elsewhere:hash:1")?.is_none());
            Ok(())
        },
        cleanup,
    )
}
