use hashstash::{record, ConfigOverrides, SaveOptions};
use hashstash_int_test::test_util::{cleanup, create_test_context, fake_user, run_test};

#[test]
fn test_clear_everything_under_prefix() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let ids = (0..3)
                .map(|_| stash.save(fake_user()).map(|r| r.id().unwrap()))
                .collect::<Result<Vec<_>, _>>()?;

            assert_eq!(stash.clear(None)?, 3);
            for id in &ids {
                assert!(stash.get(id)?.is_none());
            }
            assert_eq!(stash.clear(None)?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_clear_with_pattern_keeps_other_collections() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let users = SaveOptions::default().collection("users");
            let user = stash.save_with_options(record! { name: "amani" }, &users)?;
            let other = stash.save(record! { name: "baraka" })?;

            assert_eq!(stash.clear(Some("users"))?, 1);
            assert!(stash.get(&user.id().unwrap())?.is_none());
            assert!(stash.get(&other.id().unwrap())?.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_clear_with_pattern_spares_collections_sharing_a_prefix() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let users = SaveOptions::default().collection("users");
            let users2 = SaveOptions::default().collection("users2");
            let archive = SaveOptions::default().collection("usersArchive");

            let user = stash.save_with_options(record! { name: "amani" }, &users)?;
            let kept = stash.save_with_options(record! { name: "baraka" }, &users2)?;
            let archived = stash.save_with_options(record! { name: "chausiku" }, &archive)?;

            assert_eq!(stash.clear(Some("users"))?, 1);
            assert!(stash.get(&user.id().unwrap())?.is_none());
            assert!(stash.get(&kept.id().unwrap())?.is_some());
            assert!(stash.get(&archived.id().unwrap())?.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_clear_leaves_indexes_in_place() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            stash.save(record! { name: "neema" })?;
            stash.clear(None)?;

            assert_eq!(
                stash.index_names(),
                vec![format!("{}:hash:search", ctx.prefix())]
            );
            // stale hits resolve to nothing
            assert!(stash.search("neema")?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_reset_returns_to_defaults() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            stash.configure(&ConfigOverrides::new().separator("/"))?;
            stash.save(record! { name: "juma" })?;

            stash.reset()?;
            assert!(!stash.is_connected());
            assert!(stash.index_names().is_empty());
            assert_eq!(stash.config().prefix(), "paywell");
            assert_eq!(stash.config().separator(), ":");
            assert!(stash.get("paywell:hash:1").is_err());

            stash.connect()?;
            assert!(stash.search("juma")?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
