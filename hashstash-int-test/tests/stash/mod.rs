mod clear_reset_test;
mod key_test;
mod save_get_test;
mod search_test;
mod store_test;
