//! Windows Credential Manager backend
//!
//! Credential Manager has one flat namespace of target names, so each
//! credential is stored under `{service}:{account}` (see [`combined_target`]).
//! The secret is written as a UTF-8 byte blob and strictly decoded on read.

/// Separator between service and account in a target name.
pub const TARGET_SEPARATOR: char = ':';

/// Largest credential blob Credential Manager accepts (`CRED_MAX_CREDENTIAL_BLOB_SIZE`).
pub const MAX_BLOB_LEN: usize = 5 * 512;

/// Target name for `(service, account)`.
///
/// Distinct pairs collide when the separator appears inside a field:
/// `("a:b", "c")` and `("a", "b:c")` both map to `"a:b:c"`.
pub fn combined_target(service: &str, account: &str) -> String {
    format!("{service}{TARGET_SEPARATOR}{account}")
}

#[cfg(all(feature = "windows-credential-manager", target_os = "windows"))]
pub use store::WindowsCredentialManagerBackend;

#[cfg(all(feature = "windows-credential-manager", target_os = "windows"))]
mod store {
    use super::{MAX_BLOB_LEN, TARGET_SEPARATOR, combined_target};
    use crate::backend::Backend;
    use crate::error::{Error, Result};
    use keyring_core::api::CredentialStoreApi;
    use keyring_core::{Entry, Error as KeyringError};
    use std::collections::HashMap;
    use std::sync::Arc;
    use windows_native_keyring_store::Store;
    use zeroize::Zeroizing;

    pub struct WindowsCredentialManagerBackend {
        store: Arc<Store>,
    }

    impl WindowsCredentialManagerBackend {
        pub fn new() -> Result<Self> {
            // build(service, user, _) produces "{prefix}{user}{divider}{service}{suffix}";
            // with an empty prefix/suffix that is exactly the combined target.
            let divider = TARGET_SEPARATOR.to_string();
            let config = HashMap::from([
                ("prefix", ""),
                ("divider", divider.as_str()),
                ("suffix", ""),
            ]);
            let store = Store::new_with_configuration(&config).map_err(|e| {
                Error::Unsupported(format!("Failed to open Windows Credential Manager: {e}"))
            })?;
            Ok(Self { store })
        }

        fn entry(&self, service: &str, account: &str) -> Result<Entry> {
            // The user half comes first in the target name, see new().
            self.store
                .build(account, service, None)
                .map_err(|e| map_error(e, &combined_target(service, account)))
        }
    }

    fn map_error(err: KeyringError, target: &str) -> Error {
        match err {
            KeyringError::NoEntry => Error::NotFound,
            KeyringError::NoStorageAccess(e) => Error::AccessDenied(format!("{target}: {e}")),
            KeyringError::TooLong(_, limit) => Error::TooLarge {
                limit: limit as usize,
            },
            KeyringError::NoDefaultStore => {
                Error::Unsupported("no default credential store".to_string())
            }
            KeyringError::NotSupportedByStore(what) => Error::Unsupported(what),
            other => {
                log::warn!("Credential Manager failure for {target}: {other}");
                Error::Backend(format!("{target}: {other}"))
            }
        }
    }

    impl Backend for WindowsCredentialManagerBackend {
        fn name(&self) -> &'static str {
            "windows-credential-manager"
        }

        fn set(&self, service: &str, account: &str, secret: &str) -> Result<()> {
            let target = combined_target(service, account);
            log::debug!("credential manager set target='{target}'");
            if secret.len() > MAX_BLOB_LEN {
                return Err(Error::TooLarge {
                    limit: MAX_BLOB_LEN,
                });
            }
            self.entry(service, account)?
                .set_secret(secret.as_bytes())
                .map_err(|e| map_error(e, &target))
        }

        fn get(&self, service: &str, account: &str) -> Result<String> {
            let target = combined_target(service, account);
            log::debug!("credential manager get target='{target}'");
            let blob = Zeroizing::new(
                self.entry(service, account)?
                    .get_secret()
                    .map_err(|e| map_error(e, &target))?,
            );
            String::from_utf8(blob.to_vec())
                .map_err(|e| Error::Backend(format!("{target}: stored blob is not valid UTF-8: {e}")))
        }

        fn delete(&self, service: &str, account: &str) -> Result<()> {
            let target = combined_target(service, account);
            log::debug!("credential manager delete target='{target}'");
            self.entry(service, account)?
                .delete_credential()
                .map_err(|e| map_error(e, &target))
        }

        fn delete_all(&self, service: &str) -> Result<()> {
            log::debug!("credential manager delete_all service='{service}'");
            let pattern = format!(
                "^{}{}",
                regex::escape(service),
                regex::escape(&TARGET_SEPARATOR.to_string())
            );
            let search_spec = HashMap::from([("pattern", pattern.as_str())]);
            let entries = self
                .store
                .search(&search_spec)
                .map_err(|e| map_error(e, service))?;

            for entry in entries {
                match entry.delete_credential() {
                    // Removed concurrently; the end state is the same.
                    Ok(()) | Err(KeyringError::NoEntry) => {}
                    Err(e) => return Err(map_error(e, service)),
                }
            }
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_error_mapping() {
            assert_eq!(map_error(KeyringError::NoEntry, "s:a"), Error::NotFound);
            assert_eq!(
                map_error(KeyringError::TooLong("secret".into(), 2560), "s:a"),
                Error::TooLarge { limit: 2560 }
            );
            assert!(matches!(
                map_error(KeyringError::NoDefaultStore, "s:a"),
                Error::Unsupported(_)
            ));
            assert!(matches!(
                map_error(KeyringError::BadEncoding(vec![0xff]), "s:a"),
                Error::Backend(_)
            ));
        }

        #[test]
        #[ignore] // Requires Windows Credential Manager
        fn test_round_trip() {
            let backend = WindowsCredentialManagerBackend::new().unwrap();
            let _ = backend.delete("credstore-test", "user");

            backend.set("credstore-test", "user", "first").unwrap();
            backend.set("credstore-test", "user", "second ✓").unwrap();
            assert_eq!(backend.get("credstore-test", "user").unwrap(), "second ✓");

            backend.delete("credstore-test", "user").unwrap();
            assert_eq!(backend.get("credstore-test", "user"), Err(Error::NotFound));
            assert_eq!(backend.delete("credstore-test", "user"), Err(Error::NotFound));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_target() {
        assert_eq!(combined_target("my-app", "anon"), "my-app:anon");
        assert_eq!(combined_target("", ""), ":");
    }

    #[test]
    fn test_distinct_services_do_not_collide() {
        assert_ne!(combined_target("svc1", "u"), combined_target("svc2", "u"));
    }

    #[test]
    fn test_separator_inside_field_collides() {
        // Known boundary: the flat namespace cannot tell these apart.
        assert_eq!(combined_target("a:b", "c"), combined_target("a", "b:c"));
    }
}
