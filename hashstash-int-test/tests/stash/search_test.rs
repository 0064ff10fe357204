use hashstash::{record, SaveOptions, SearchMode, SearchQuery, Value};
use hashstash_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_search_finds_nested_values() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let saved = stash.save(record! {
                username: "alice",
                address: { city: "Moshi", street: "Kilimanjaro Road" },
                tags: ["gold"]
            })?;
            stash.save(record! { username: "bob", address: { city: "Arusha" } })?;

            assert_eq!(stash.search("Kilimanjaro")?, vec![saved.clone()]);
            assert_eq!(stash.search("gold")?, vec![saved]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_is_isolated_per_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let users = SaveOptions::default().collection("users");
            let orders = SaveOptions::default().collection("orders");

            let user = stash.save_with_options(record! { name: "zanzibar" }, &users)?;
            let order = stash.save_with_options(record! { ship_to: "zanzibar" }, &orders)?;

            let found = stash.search(SearchQuery::new("zanzibar").collection("users"))?;
            assert_eq!(found, vec![user]);
            let found = stash.search(SearchQuery::new("zanzibar").collection("orders"))?;
            assert_eq!(found, vec![order]);
            assert!(stash.search("zanzibar")?.is_empty());
            assert!(stash
                .search(SearchQuery::new("zanzibar").collection("unknown"))?
                .is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_prefix_and_modes() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            stash.save(record! { title: "blue whale" })?;
            stash.save(record! { title: "blue bird" })?;
            stash.save(record! { title: "red bird" })?;

            assert_eq!(stash.search("blu")?.len(), 2);
            assert_eq!(stash.search("whale red")?.len(), 2);

            let both = SearchQuery::new("blue bird").mode(SearchMode::And);
            let found = stash.search(both)?;
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].get("title")?, Value::from("blue bird"));

            let none = SearchQuery::new("whale red").mode(SearchMode::And);
            assert!(stash.search(none)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_ignores_configured_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let options = SaveOptions::default().ignore(&["password"]);
            stash.save_with_options(
                record! { login: "kim", credentials: { password: "hunter2" } },
                &options,
            )?;

            assert_eq!(stash.search("kim")?.len(), 1);
            assert!(stash.search("hunter2")?.is_empty());
            assert!(stash.search(ctx.prefix())?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_search_without_indexing() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let saved = stash.save_with_options(
                record! { name: "quiet" },
                &SaveOptions::default().index(false),
            )?;

            assert!(stash.search("quiet")?.is_empty());
            assert!(stash.index_names().is_empty());
            assert!(stash.get(&saved.id().unwrap())?.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_blank_query_returns_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            stash.save(record! { name: "someone" })?;
            assert!(stash.search("")?.is_empty());
            assert!(stash.search("   ")?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
