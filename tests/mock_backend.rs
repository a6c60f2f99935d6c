//! Facade tests against the in-memory backend
//!
//! Every test installs a fresh mock, so they share the process-wide binding
//! and are serialized through `LOCK`.

use credstore::Error;
use std::sync::{Mutex, MutexGuard};

static LOCK: Mutex<()> = Mutex::new(());

fn fresh_mock() -> MutexGuard<'static, ()> {
    let guard = LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    credstore::install_mock();
    guard
}

#[test]
fn test_end_to_end_scenario() {
    let _guard = fresh_mock();

    credstore::set("my-app", "anon", "secret").unwrap();
    assert_eq!(credstore::get("my-app", "anon").unwrap(), "secret");
    credstore::delete("my-app", "anon").unwrap();
    assert_eq!(credstore::get("my-app", "anon"), Err(Error::NotFound));
}

#[test]
fn test_mock_is_the_active_backend() {
    let _guard = fresh_mock();
    assert_eq!(credstore::backend_name(), "mock");
}

#[test]
fn test_round_trip_preserves_value() {
    let _guard = fresh_mock();

    for value in ["", "plain", "  padded  ", "line1\nline2\n", "quote ' and \"", "ünïcødé ✓"] {
        credstore::set("svc", "user", value).unwrap();
        assert_eq!(credstore::get("svc", "user").unwrap(), value);
    }
}

#[test]
fn test_missing_key_is_not_found() {
    let _guard = fresh_mock();

    assert_eq!(credstore::get("never", "set"), Err(Error::NotFound));
    assert_eq!(credstore::delete("never", "set"), Err(Error::NotFound));
}

#[test]
fn test_overwrite_returns_latest_value() {
    let _guard = fresh_mock();

    credstore::set("svc", "user", "v1").unwrap();
    credstore::set("svc", "user", "v2").unwrap();
    assert_eq!(credstore::get("svc", "user").unwrap(), "v2");

    // A single delete removes the one logical entry.
    credstore::delete("svc", "user").unwrap();
    assert_eq!(credstore::get("svc", "user"), Err(Error::NotFound));
}

#[test]
fn test_double_delete_is_not_found() {
    let _guard = fresh_mock();

    credstore::set("svc", "user", "v").unwrap();
    credstore::delete("svc", "user").unwrap();
    assert_eq!(credstore::delete("svc", "user"), Err(Error::NotFound));
    assert_eq!(credstore::get("svc", "user"), Err(Error::NotFound));
}

#[test]
fn test_same_account_different_service() {
    let _guard = fresh_mock();

    credstore::set("svc1", "u", "one").unwrap();
    credstore::set("svc2", "u", "two").unwrap();
    assert_eq!(credstore::get("svc1", "u").unwrap(), "one");
    assert_eq!(credstore::get("svc2", "u").unwrap(), "two");
}

#[test]
fn test_delete_all_only_touches_one_service() {
    let _guard = fresh_mock();

    credstore::set("svc", "a", "1").unwrap();
    credstore::set("svc", "b", "2").unwrap();
    credstore::set("keep", "a", "3").unwrap();

    credstore::delete_all("svc").unwrap();
    assert_eq!(credstore::get("svc", "a"), Err(Error::NotFound));
    assert_eq!(credstore::get("svc", "b"), Err(Error::NotFound));
    assert_eq!(credstore::get("keep", "a").unwrap(), "3");
    credstore::delete_all("svc").unwrap();
}

#[test]
fn test_install_mock_starts_empty() {
    let _guard = fresh_mock();

    credstore::set("svc", "user", "left over").unwrap();
    credstore::install_mock();
    assert_eq!(credstore::get("svc", "user"), Err(Error::NotFound));
}

#[test]
fn test_errors_pass_through_unchanged() {
    let _guard = fresh_mock();

    let denied = Error::AccessDenied("keyring is locked".into());
    credstore::install_mock_with_error(denied.clone());
    assert_eq!(credstore::set("svc", "user", "v"), Err(denied.clone()));
    assert_eq!(credstore::get("svc", "user"), Err(denied.clone()));
    assert_eq!(credstore::delete("svc", "user"), Err(denied));

    let missing = Error::Unsupported("collection 'login' does not exist".into());
    credstore::install_mock_with_error(missing.clone());
    assert_eq!(credstore::delete_all("svc"), Err(missing));
}

#[test]
fn test_concurrent_callers_after_install() {
    let _guard = fresh_mock();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let account = format!("user-{i}");
                credstore::set("threads", &account, &account).unwrap();
                assert_eq!(credstore::get("threads", &account).unwrap(), account);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    credstore::delete_all("threads").unwrap();
    assert_eq!(credstore::get("threads", "user-0"), Err(Error::NotFound));
}
