use hashstash::{record, ConfigOverrides, SaveOptions};
use hashstash_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_generate_key() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let prefix = ctx.prefix();
            assert_eq!(
                stash.generate_key(&["users", "42"]),
                format!("{}:users:42", prefix)
            );
            assert_eq!(
                stash.index_key("users"),
                format!("{}:users:search", prefix)
            );

            let first = stash.generate_key::<&str>(&[]);
            let second = stash.generate_key::<&str>(&[]);
            assert_ne!(first, second);
            assert!(first.starts_with(&format!("{}:", prefix)));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_configure_applies_to_new_keys_only() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let before = stash.save(record! { name: "old" })?;

            stash.configure(&ConfigOverrides::new().prefix("shop").separator("/"))?;
            let after = stash.save_with_options(
                record! { name: "new" },
                &SaveOptions::default().collection("items"),
            )?;

            assert!(after.id().unwrap().starts_with("shop/items/"));
            assert!(stash.get(&before.id().unwrap())?.is_some());

            // the old key now lies outside the prefix
            assert!(stash.save(before).is_err());

            stash.clear(None)?;
            stash.configure(&ConfigOverrides::new().prefix(ctx.prefix()).separator(":"))?;
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_overrides_change_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let stash = ctx.stash();
            let result = stash.configure(&ConfigOverrides::new().prefix("other").separator(""));
            assert!(result.is_err());
            assert_eq!(stash.config().prefix(), ctx.prefix());
            assert_eq!(stash.config().separator(), ":");
            Ok(())
        },
        cleanup,
    )
}
